//! Generic document tree consumed by the descriptor parsers.

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// One value of a loaded bus description document.
///
/// Mapping keys keep their document order: entities are analyzed in the
/// order they are declared and bus signals keep their declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Node {
    /// A string-keyed mapping.
    Mapping(IndexMap<String, Node>),
    /// An ordered sequence.
    Sequence(Vec<Node>),
    /// A string scalar.
    String(String),
    /// An integer scalar.
    Integer(i64),
    /// A boolean scalar.
    Bool(bool),
}

/// The shape of a [`Node`], used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    /// A string-keyed mapping.
    Mapping,
    /// An ordered sequence.
    Sequence,
    /// A string scalar.
    String,
    /// An integer scalar.
    Integer,
    /// A boolean scalar.
    Bool,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Mapping => write!(f, "mapping"),
            NodeKind::Sequence => write!(f, "sequence"),
            NodeKind::String => write!(f, "string"),
            NodeKind::Integer => write!(f, "integer"),
            NodeKind::Bool => write!(f, "boolean"),
        }
    }
}

impl Node {
    /// Returns the shape of this node.
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Mapping(_) => NodeKind::Mapping,
            Node::Sequence(_) => NodeKind::Sequence,
            Node::String(_) => NodeKind::String,
            Node::Integer(_) => NodeKind::Integer,
            Node::Bool(_) => NodeKind::Bool,
        }
    }

    /// Returns the string value if this is a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer value if this is an integer scalar.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Node::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the boolean value if this is a boolean scalar.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the entries if this is a mapping.
    pub fn as_mapping(&self) -> Option<&IndexMap<String, Node>> {
        match self {
            Node::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the elements if this is a sequence.
    pub fn as_sequence(&self) -> Option<&[Node]> {
        match self {
            Node::Sequence(s) => Some(s),
            _ => None,
        }
    }

    /// Looks up `key` when this node is a mapping.
    ///
    /// Returns `None` both for absent keys and for non-mapping nodes.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// Returns `true` for scalar nodes (string, integer, boolean).
    pub fn is_scalar(&self) -> bool {
        matches!(self, Node::String(_) | Node::Integer(_) | Node::Bool(_))
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::String(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::String(s)
    }
}

impl From<i64> for Node {
    fn from(n: i64) -> Self {
        Node::Integer(n)
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Bool(b)
    }
}

impl From<Vec<Node>> for Node {
    fn from(items: Vec<Node>) -> Self {
        Node::Sequence(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(entries: &[(&str, Node)]) -> Node {
        Node::Mapping(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn kind_display() {
        assert_eq!(NodeKind::Mapping.to_string(), "mapping");
        assert_eq!(NodeKind::Sequence.to_string(), "sequence");
        assert_eq!(NodeKind::Bool.to_string(), "boolean");
    }

    #[test]
    fn scalar_accessors() {
        assert_eq!(Node::from("clk").as_str(), Some("clk"));
        assert_eq!(Node::from(8).as_int(), Some(8));
        assert_eq!(Node::from(true).as_bool(), Some(true));
        assert_eq!(Node::from(8).as_str(), None);
        assert!(Node::from(8).is_scalar());
        assert!(!Node::Sequence(vec![]).is_scalar());
    }

    #[test]
    fn get_on_mapping_and_scalar() {
        let node = mapping(&[("width", Node::from(8))]);
        assert_eq!(node.get("width"), Some(&Node::Integer(8)));
        assert_eq!(node.get("missing"), None);
        assert_eq!(Node::from("x").get("width"), None);
    }

    #[test]
    fn mapping_keeps_insertion_order() {
        let node = mapping(&[
            ("zeta", Node::from(1)),
            ("alpha", Node::from(2)),
            ("mid", Node::from(3)),
        ]);
        let keys: Vec<_> = node.as_mapping().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }
}
