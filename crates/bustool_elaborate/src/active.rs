//! Active entities and their two elaboration stages.
//!
//! An active entity is a module synthesized over a bus template. It is
//! parsed as [`ActiveEntity<Unanalyzed>`], which holds only the bus key.
//! [`ActiveEntity::analyze`] resolves that key against the [`Registry`] and
//! derives defaults, producing [`ActiveEntity<Analyzed>`]. Only the analyzed
//! stage can [`generate`](ActiveEntity::generate) a module body, so an
//! entity cannot be generated before its bus is bound:
//!
//! ```compile_fail
//! use bustool_diagnostics::DiagnosticSink;
//! use bustool_elaborate::{ActiveEntity, Unanalyzed};
//!
//! fn too_early(entity: &ActiveEntity<Unanalyzed>) {
//!     let _ = entity.generate(&DiagnosticSink::new());
//! }
//! ```

use bustool_common::Node;
use bustool_diagnostics::DiagnosticSink;
use bustool_ir::{EntityDecl, EntityKind};
use bustool_protocol::{AsymmetricBus, MapReader, ProtocolError};
use std::sync::Arc;

use crate::busmux::{BusMux, BusMuxDef};
use crate::crossbar::{Crossbar, CrossbarDef};
use crate::errors::ElabError;
use crate::registry::Registry;

/// Stage of an entity whose bus reference is still a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unanalyzed {
    bus: String,
    def: ActiveDef,
}

/// Stage of an entity bound to its bus template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analyzed {
    bus: Arc<AsymmetricBus>,
    kind: ActiveKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ActiveDef {
    Crossbar(CrossbarDef),
    BusMux(BusMuxDef),
}

/// The analyzed configuration of an active entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveKind {
    /// A many-to-many crossbar.
    Crossbar(Crossbar),
    /// An address-decoded one-to-many multiplexer.
    BusMux(BusMux),
}

/// A crossbar or multiplexer at elaboration stage `S`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveEntity<S = Unanalyzed> {
    id: String,
    desc: Option<String>,
    state: S,
}

impl<S> ActiveEntity<S> {
    /// Returns the entity id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the description.
    pub fn desc(&self) -> Option<&str> {
        self.desc.as_deref()
    }
}

impl ActiveEntity<Unanalyzed> {
    /// Entity types parsed as active entities.
    pub const TYPES: &'static [&'static str] = &["crossbar", "multiplexer"];

    /// Parses a `crossbar` or `multiplexer` definition.
    pub fn parse(id: &str, node: &Node) -> Result<Self, ProtocolError> {
        let map = MapReader::new(node)?;
        let def = match map.require_enum("type", Self::TYPES)? {
            "crossbar" => ActiveDef::Crossbar(CrossbarDef::parse(&map)?),
            _ => ActiveDef::BusMux(BusMuxDef::parse(&map)?),
        };
        Ok(Self {
            id: id.to_string(),
            desc: map.optional_str("desc")?.map(str::to_string),
            state: Unanalyzed {
                bus: map.require_str("bus")?.to_string(),
                def,
            },
        })
    }

    /// Returns the key of the referenced bus template.
    pub fn bus_key(&self) -> &str {
        &self.state.bus
    }

    /// Binds the bus template and derives unspecified names.
    ///
    /// Does not modify `self`; analyzing twice yields equal results.
    pub fn analyze(&self, registry: &Registry) -> Result<ActiveEntity<Analyzed>, ElabError> {
        let bus = registry
            .bus(&self.state.bus)
            .ok_or_else(|| ElabError::UnresolvedBusReference {
                entity: self.id.clone(),
                bus: self.state.bus.clone(),
            })?;
        let kind = match &self.state.def {
            ActiveDef::Crossbar(def) => ActiveKind::Crossbar(def.resolve(bus)),
            ActiveDef::BusMux(def) => ActiveKind::BusMux(def.resolve(bus)),
        };
        log::debug!("analyzed `{}` against bus `{}`", self.id, bus.id);
        Ok(ActiveEntity {
            id: self.id.clone(),
            desc: self.desc.clone(),
            state: Analyzed {
                bus: Arc::clone(bus),
                kind,
            },
        })
    }
}

impl ActiveEntity<Analyzed> {
    /// Returns the bound bus template.
    pub fn bus(&self) -> &Arc<AsymmetricBus> {
        &self.state.bus
    }

    /// Returns the analyzed configuration.
    pub fn kind(&self) -> &ActiveKind {
        &self.state.kind
    }

    /// Synthesizes the module declaration.
    ///
    /// Non-fatal findings are pushed into `sink`.
    pub fn generate(&self, sink: &DiagnosticSink) -> Result<EntityDecl, ElabError> {
        let mut decl = EntityDecl::new(EntityKind::Module, self.id.clone());
        decl.desc = self.desc.clone();
        match &self.state.kind {
            ActiveKind::Crossbar(xbar) => xbar.generate(&self.id, &self.state.bus, &mut decl, sink),
            ActiveKind::BusMux(mux) => mux.generate(&self.id, &self.state.bus, &mut decl, sink)?,
        }
        log::debug!(
            "generated `{}`: {} ports, {} statements",
            decl.id,
            decl.ports.len(),
            decl.body.len()
        );
        Ok(decl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bustool_common::{load_document_from_str, DocumentFormat};

    fn registry(json: &str) -> Registry {
        Registry::from_document(&load_document_from_str(json, DocumentFormat::Json).unwrap())
            .unwrap()
    }

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
                "addr": {"dir": "output", "span": 8}
            }
        },
        "mux": {"type": "multiplexer", "bus": "bus_a", "desc": "Peripheral mux."},
        "lost": {"type": "multiplexer", "bus": "bus_b"},
        "nested": {"type": "multiplexer", "bus": "mux"}
    }"#;

    fn active<'a>(reg: &'a Registry, id: &str) -> &'a ActiveEntity<Unanalyzed> {
        match reg.get(id) {
            Some(crate::registry::Entry::Active(entity)) => entity,
            _ => panic!("`{id}` is not an active entity"),
        }
    }

    #[test]
    fn analyze_binds_bus_and_is_repeatable() {
        let reg = registry(DOC);
        let mux = active(&reg, "mux");
        assert_eq!(mux.bus_key(), "bus_a");
        let first = mux.analyze(&reg).unwrap();
        let second = mux.analyze(&reg).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.bus().id, "bus_a");
        assert_eq!(first.desc(), Some("Peripheral mux."));
        match first.kind() {
            ActiveKind::BusMux(m) => assert_eq!(m.dev_count, "target_count"),
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn missing_bus_is_unresolved() {
        let reg = registry(DOC);
        assert_eq!(
            active(&reg, "lost").analyze(&reg).unwrap_err(),
            ElabError::UnresolvedBusReference {
                entity: "lost".into(),
                bus: "bus_b".into()
            }
        );
    }

    #[test]
    fn non_bus_key_is_unresolved() {
        let reg = registry(DOC);
        assert!(matches!(
            active(&reg, "nested").analyze(&reg),
            Err(ElabError::UnresolvedBusReference { ref bus, .. }) if bus == "mux"
        ));
    }

    #[test]
    fn generate_carries_description() {
        let reg = registry(DOC);
        let decl = active(&reg, "mux")
            .analyze(&reg)
            .unwrap()
            .generate(&DiagnosticSink::new())
            .unwrap();
        assert_eq!(decl.kind, EntityKind::Module);
        assert_eq!(decl.desc.as_deref(), Some("Peripheral mux."));
    }

    #[test]
    fn unknown_active_type() {
        let node = load_document_from_str(r#"{"type": "bridge", "bus": "b"}"#, DocumentFormat::Json)
            .unwrap();
        assert!(matches!(
            ActiveEntity::parse("br", &node),
            Err(ProtocolError::InvalidEnum { ref field, .. }) if field == "type"
        ));
    }
}
