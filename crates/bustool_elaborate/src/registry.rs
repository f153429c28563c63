//! Entity registry built from a description document.
//!
//! The [`Registry`] holds every top-level entity of a document in document
//! order: bus templates as shared [`AsymmetricBus`] values and crossbars or
//! multiplexers as [`ActiveEntity<Unanalyzed>`]. Active entities refer to
//! buses by key and are bound in [`Registry::analyze`].

use bustool_common::Node;
use bustool_diagnostics::DiagnosticSink;
use bustool_ir::EntityDecl;
use bustool_protocol::{AsymmetricBus, MapReader, ProtocolError};
use indexmap::IndexMap;
use std::sync::Arc;

use crate::active::{ActiveEntity, Analyzed, Unanalyzed};
use crate::errors::ElabError;
use crate::interface::lower_bus;

/// Entity id used for errors in the document root itself.
const DOCUMENT: &str = "<document>";

/// One parsed top-level entity.
#[derive(Debug, Clone)]
pub enum Entry {
    /// An `asymmetric_bus` template.
    Bus(Arc<AsymmetricBus>),
    /// A `crossbar` or `multiplexer`.
    Active(ActiveEntity<Unanalyzed>),
}

/// A registry entry whose bus references are bound.
#[derive(Debug, Clone)]
pub enum Elaborated<'a> {
    /// A bus template, emitted as an interface.
    Bus(&'a Arc<AsymmetricBus>),
    /// An analyzed active entity, emitted as a module.
    Active(ActiveEntity<Analyzed>),
}

impl Elaborated<'_> {
    /// Returns the entity id.
    pub fn id(&self) -> &str {
        match self {
            Elaborated::Bus(bus) => &bus.id,
            Elaborated::Active(entity) => entity.id(),
        }
    }

    /// Builds the entity declaration.
    pub fn generate(&self, sink: &DiagnosticSink) -> Result<EntityDecl, ElabError> {
        match self {
            Elaborated::Bus(bus) => Ok(lower_bus(bus)),
            Elaborated::Active(entity) => entity.generate(sink),
        }
    }
}

/// Every entity of one document, keyed by id in document order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: IndexMap<String, Entry>,
}

impl Registry {
    /// Recognized values of the `type` key.
    pub const TYPES: &'static [&'static str] = &["asymmetric_bus", "crossbar", "multiplexer"];

    /// Parses every top-level entity of `document`.
    ///
    /// Fails on the first entity that does not parse.
    pub fn from_document(document: &Node) -> Result<Self, ElabError> {
        let root = MapReader::new(document).map_err(|source| ElabError::Protocol {
            entity: DOCUMENT.to_string(),
            source,
        })?;
        let mut registry = Self::default();
        for (id, node) in root.entries() {
            let entry = Self::parse_entry(id, node).map_err(|source| ElabError::Protocol {
                entity: id.clone(),
                source,
            })?;
            registry.entries.insert(id.clone(), entry);
        }
        log::debug!("registered {} entities", registry.entries.len());
        Ok(registry)
    }

    fn parse_entry(id: &str, node: &Node) -> Result<Entry, ProtocolError> {
        let map = MapReader::new(node)?;
        match map.require_enum("type", Self::TYPES)? {
            "asymmetric_bus" => Ok(Entry::Bus(Arc::new(AsymmetricBus::parse(id, node)?))),
            _ => Ok(Entry::Active(ActiveEntity::parse(id, node)?)),
        }
    }

    /// Looks up an entity by id.
    pub fn get(&self, id: &str) -> Option<&Entry> {
        self.entries.get(id)
    }

    /// Looks up a bus template by id. Other entity kinds yield `None`.
    pub fn bus(&self, id: &str) -> Option<&Arc<AsymmetricBus>> {
        match self.entries.get(id)? {
            Entry::Bus(bus) => Some(bus),
            Entry::Active(_) => None,
        }
    }

    /// Returns `true` if `id` names an entity.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Iterates entities in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(id, entry)| (id.as_str(), entry))
    }

    /// Returns the entity ids in document order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns the number of entities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the document declared no entities.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Analyzes every active entity in document order.
    ///
    /// The whole registry is analyzed even when only some entities are
    /// emitted, so a broken reference anywhere fails the run.
    pub fn analyze(&self) -> Result<Vec<Elaborated<'_>>, ElabError> {
        self.entries
            .values()
            .map(|entry| match entry {
                Entry::Bus(bus) => Ok(Elaborated::Bus(bus)),
                Entry::Active(entity) => entity.analyze(self).map(Elaborated::Active),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bustool_common::{load_document_from_str, DocumentFormat};

    fn registry(json: &str) -> Result<Registry, ElabError> {
        Registry::from_document(&load_document_from_str(json, DocumentFormat::Json).unwrap())
    }

    const DOC: &str = r#"{
        "mux": {"type": "multiplexer", "bus": "bus_a"},
        "bus_a": {
            "type": "asymmetric_bus",
            "controller": "host",
            "device": "target",
            "transaction": {"request": "req"},
            "clock": {"type": "ext_clock", "signal": "clk", "edge": "rising"},
            "addr": "addr",
            "signals": {"req": {"dir": "output"}, "addr": {"dir": "output", "span": 4}}
        }
    }"#;

    #[test]
    fn keeps_document_order() {
        let reg = registry(DOC).unwrap();
        assert_eq!(reg.ids().collect::<Vec<_>>(), ["mux", "bus_a"]);
        assert!(reg.bus("bus_a").is_some());
        assert!(reg.bus("mux").is_none());
        assert!(reg.contains("mux"));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn references_resolve_regardless_of_order() {
        let reg = registry(DOC).unwrap();
        let analyzed = reg.analyze().unwrap();
        let ids: Vec<_> = analyzed.iter().map(Elaborated::id).collect();
        assert_eq!(ids, ["mux", "bus_a"]);
    }

    #[test]
    fn missing_type() {
        let err = registry(r#"{"thing": {"bus": "bus_a"}}"#).unwrap_err();
        assert_eq!(
            err,
            ElabError::Protocol {
                entity: "thing".into(),
                source: ProtocolError::MissingField {
                    field: "type".into()
                }
            }
        );
    }

    #[test]
    fn unknown_type() {
        let err = registry(r#"{"thing": {"type": "bridge"}}"#).unwrap_err();
        assert_eq!(err.code().to_string(), "E202");
    }

    #[test]
    fn root_must_be_mapping() {
        let err = registry("[1, 2]").unwrap_err();
        assert!(matches!(
            err,
            ElabError::Protocol { ref entity, source: ProtocolError::TypeMismatch { .. } }
                if entity == DOCUMENT
        ));
    }

    #[test]
    fn entity_errors_carry_field_paths() {
        let doc = DOC.replace(r#""span": 4"#, r#""span": {"$pow": [2, 2]}"#);
        let err = registry(&doc).unwrap_err();
        let diag = err.to_diagnostic();
        assert_eq!(diag.code.to_string(), "E102");
        assert_eq!(diag.location.entity.as_deref(), Some("bus_a"));
        assert_eq!(diag.location.field.as_deref(), Some("signals.addr.span"));
    }
}
