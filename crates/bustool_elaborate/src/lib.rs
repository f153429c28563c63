//! Elaboration of bus descriptions into entity declarations.
//!
//! Turns a parsed description document into [`EntityDecl`]s ready for
//! rendering. Every top-level entity is registered, every crossbar and
//! multiplexer is analyzed against the registry, and only then are the
//! selected entities generated. Generation of independent entities runs in
//! parallel; results keep document order.
//!
//! # Usage
//!
//! ```ignore
//! let registry = Registry::from_document(&document)?;
//! let decls = elaborate(&registry, &[], &sink)?;
//! ```

#![warn(missing_docs)]

pub mod active;
pub mod busmux;
pub mod crossbar;
pub mod errors;
pub mod interface;
pub mod registry;

use bustool_diagnostics::DiagnosticSink;
use bustool_ir::EntityDecl;
use rayon::prelude::*;

pub use active::{ActiveEntity, ActiveKind, Analyzed, Unanalyzed};
pub use busmux::BusMux;
pub use crossbar::Crossbar;
pub use errors::ElabError;
pub use interface::lower_bus;
pub use registry::{Elaborated, Entry, Registry};

/// Analyzes the whole registry, then generates the entities in `selection`.
///
/// An empty selection generates every entity. Output follows document
/// order regardless of the order of `selection`. Warnings go to `sink`;
/// the first error is returned.
pub fn elaborate(
    registry: &Registry,
    selection: &[String],
    sink: &DiagnosticSink,
) -> Result<Vec<EntityDecl>, ElabError> {
    if let Some(id) = selection.iter().find(|id| !registry.contains(id)) {
        return Err(ElabError::UnknownEntity { id: id.clone() });
    }

    let analyzed = registry.analyze()?;
    let chosen: Vec<&Elaborated<'_>> = analyzed
        .iter()
        .filter(|entity| selection.is_empty() || selection.iter().any(|id| id == entity.id()))
        .collect();
    log::debug!(
        "generating {} of {} entities",
        chosen.len(),
        analyzed.len()
    );

    chosen
        .par_iter()
        .map(|entity| entity.generate(sink))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bustool_common::{load_document_from_str, DocumentFormat};
    use bustool_ir::EntityKind;

    const DOC: &str = r#"{
        "bus_a": {
            "type": "asymmetric_bus",
            "controller": "host",
            "device": "target",
            "transaction": {"request": "req"},
            "clock": {"type": "ext_clock", "signal": "clk", "edge": "rising"},
            "addr": "addr",
            "signals": {
                "req":  {"dir": "output"},
                "addr": {"dir": "output", "span": 16},
                "ack":  {"dir": "input"}
            }
        },
        "mux": {"type": "multiplexer", "bus": "bus_a"},
        "xbar": {"type": "crossbar", "bus": "bus_a", "arbiter": {"type": "fixed"}}
    }"#;

    fn registry(json: &str) -> Registry {
        Registry::from_document(&load_document_from_str(json, DocumentFormat::Json).unwrap())
            .unwrap()
    }

    fn with_broken() -> String {
        DOC.replace(
            r#""xbar":"#,
            r#""broken": {"type": "multiplexer", "bus": "bus_z"}, "xbar":"#,
        )
    }

    #[test]
    fn generates_all_in_document_order() {
        let reg = registry(DOC);
        let sink = DiagnosticSink::new();
        let decls = elaborate(&reg, &[], &sink).unwrap();
        let ids: Vec<_> = decls.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["bus_a", "mux", "xbar"]);
        assert_eq!(decls[0].kind, EntityKind::Interface);
        assert_eq!(decls[1].kind, EntityKind::Module);
        assert_eq!(sink.warning_count(), 1);
    }

    #[test]
    fn selection_keeps_document_order() {
        let reg = registry(DOC);
        let selection = ["xbar".to_string(), "bus_a".to_string()];
        let decls = elaborate(&reg, &selection, &DiagnosticSink::new()).unwrap();
        let ids: Vec<_> = decls.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["bus_a", "xbar"]);
    }

    #[test]
    fn unselected_entities_are_still_analyzed() {
        let reg = registry(&with_broken());
        let err = elaborate(&reg, &["bus_a".to_string()], &DiagnosticSink::new()).unwrap_err();
        assert!(matches!(err, ElabError::UnresolvedBusReference { ref entity, .. } if entity == "broken"));
    }

    #[test]
    fn unknown_selection() {
        let reg = registry(DOC);
        let err = elaborate(&reg, &["nope".to_string()], &DiagnosticSink::new()).unwrap_err();
        assert_eq!(err, ElabError::UnknownEntity { id: "nope".into() });
    }

    #[test]
    fn parallel_matches_sequential() {
        let reg = registry(DOC);
        let parallel = elaborate(&reg, &[], &DiagnosticSink::new()).unwrap();
        let sequential: Vec<_> = reg
            .analyze()
            .unwrap()
            .iter()
            .map(|e| e.generate(&DiagnosticSink::new()).unwrap())
            .collect();
        assert_eq!(parallel, sequential);
    }
}
