//! Complete entity declarations.

use bustool_protocol::{BusInstance, Parameter, Signal};
use indexmap::IndexMap;
use serde::Serialize;

use crate::stmt::Statement;

/// The keyword an entity is emitted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// `module ... endmodule`.
    Module,
    /// `interface ... endinterface`.
    Interface,
}

impl EntityKind {
    /// Returns the opening keyword.
    pub fn keyword(self) -> &'static str {
        match self {
            EntityKind::Module => "module",
            EntityKind::Interface => "interface",
        }
    }
}

/// One entry of a port list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Port {
    /// A plain wire port.
    Signal(Signal),
    /// A bus interface port.
    Bus(BusInstance),
}

impl Port {
    /// Returns the port name.
    pub fn id(&self) -> &str {
        match self {
            Port::Signal(signal) => &signal.id,
            Port::Bus(bus) => &bus.id,
        }
    }
}

impl From<Signal> for Port {
    fn from(signal: Signal) -> Self {
        Port::Signal(signal)
    }
}

impl From<BusInstance> for Port {
    fn from(bus: BusInstance) -> Self {
        Port::Bus(bus)
    }
}

/// A fully generated module or interface, ready to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityDecl {
    /// Emitted keyword.
    pub kind: EntityKind,
    /// Entity name.
    pub id: String,
    /// Optional description, emitted as a leading comment.
    pub desc: Option<String>,
    /// Parameter list.
    pub parameters: Vec<Parameter>,
    /// Port list.
    pub ports: Vec<Port>,
    /// Body statements.
    pub body: Vec<Statement>,
    /// Extra scope names that resolve to other text, e.g. a bus parameter
    /// reached through a port (`W` to `ctl.W`).
    pub aliases: IndexMap<String, String>,
}

impl EntityDecl {
    /// Creates an empty declaration.
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            desc: None,
            parameters: Vec::new(),
            ports: Vec::new(),
            body: Vec::new(),
            aliases: IndexMap::new(),
        }
    }

    /// Looks up a port by name.
    pub fn port(&self, id: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.id() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bustool_protocol::Span;

    #[test]
    fn keywords() {
        assert_eq!(EntityKind::Module.keyword(), "module");
        assert_eq!(EntityKind::Interface.keyword(), "interface");
    }

    #[test]
    fn port_lookup() {
        let mut decl = EntityDecl::new(EntityKind::Module, "top");
        decl.ports.push(Signal::new("clk", Span::default()).into());
        assert_eq!(decl.port("clk").map(Port::id), Some("clk"));
        assert!(decl.port("rst").is_none());
    }

    #[test]
    fn serializes_kind() {
        let decl = EntityDecl::new(EntityKind::Interface, "bus_a");
        let json = serde_json::to_value(&decl).unwrap();
        assert_eq!(json["kind"], "interface");
        assert_eq!(json["id"], "bus_a");
    }
}
