//! Field access on document mappings with path-aware errors.
//!
//! Errors name the key relative to the mapping being read; parents prefix
//! the path with [`ProtocolError::within`] as they propagate.

use bustool_common::Node;
use bustool_expr::Expression;
use indexmap::IndexMap;

use crate::errors::ProtocolError;

/// A read-only view of a mapping node.
#[derive(Debug, Clone, Copy)]
pub struct MapReader<'a> {
    entries: &'a IndexMap<String, Node>,
}

impl<'a> MapReader<'a> {
    /// Wraps `node`, failing with [`ProtocolError::TypeMismatch`] if it is not a mapping.
    pub fn new(node: &'a Node) -> Result<Self, ProtocolError> {
        match node {
            Node::Mapping(entries) => Ok(Self { entries }),
            other => Err(ProtocolError::TypeMismatch {
                field: String::new(),
                expected: "mapping",
                found: other.kind(),
            }),
        }
    }

    /// Returns all entries in document order.
    pub fn entries(&self) -> &'a IndexMap<String, Node> {
        self.entries
    }

    /// Returns `true` if `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the node at `key`, if present.
    pub fn get(&self, key: &str) -> Option<&'a Node> {
        self.entries.get(key)
    }

    /// Returns the node at `key` or [`ProtocolError::MissingField`].
    pub fn require(&self, key: &str) -> Result<&'a Node, ProtocolError> {
        self.get(key).ok_or_else(|| ProtocolError::MissingField {
            field: key.to_string(),
        })
    }

    /// Returns the string at `key`, which must be present.
    pub fn require_str(&self, key: &str) -> Result<&'a str, ProtocolError> {
        as_str(key, self.require(key)?)
    }

    /// Returns the string at `key`, if present.
    pub fn optional_str(&self, key: &str) -> Result<Option<&'a str>, ProtocolError> {
        self.get(key).map(|node| as_str(key, node)).transpose()
    }

    /// Returns the boolean at `key`, if present.
    pub fn optional_bool(&self, key: &str) -> Result<Option<bool>, ProtocolError> {
        self.get(key)
            .map(|node| {
                node.as_bool().ok_or_else(|| ProtocolError::TypeMismatch {
                    field: key.to_string(),
                    expected: "boolean",
                    found: node.kind(),
                })
            })
            .transpose()
    }

    /// Returns the mapping at `key`, which must be present.
    pub fn require_mapping(&self, key: &str) -> Result<MapReader<'a>, ProtocolError> {
        MapReader::new(self.require(key)?).map_err(|e| e.within(key))
    }

    /// Returns the mapping at `key`, if present.
    pub fn optional_mapping(&self, key: &str) -> Result<Option<MapReader<'a>>, ProtocolError> {
        self.get(key)
            .map(|node| MapReader::new(node).map_err(|e| e.within(key)))
            .transpose()
    }

    /// Returns the string at `key`, checked against `expected`.
    pub fn require_enum(
        &self,
        key: &str,
        expected: &'static [&'static str],
    ) -> Result<&'a str, ProtocolError> {
        let value = self.require_str(key)?;
        if expected.contains(&value) {
            Ok(value)
        } else {
            Err(ProtocolError::InvalidEnum {
                field: key.to_string(),
                value: value.to_string(),
                expected,
            })
        }
    }

    /// Parses the expression at `key`, which must be present.
    pub fn require_expr(&self, key: &str) -> Result<Expression, ProtocolError> {
        parse_expr(key, self.require(key)?)
    }

    /// Parses the expression at `key`, if present.
    pub fn optional_expr(&self, key: &str) -> Result<Option<Expression>, ProtocolError> {
        self.get(key).map(|node| parse_expr(key, node)).transpose()
    }
}

fn as_str<'a>(key: &str, node: &'a Node) -> Result<&'a str, ProtocolError> {
    node.as_str().ok_or_else(|| ProtocolError::TypeMismatch {
        field: key.to_string(),
        expected: "string",
        found: node.kind(),
    })
}

/// Parses an expression node, attaching `field` to any failure.
pub fn parse_expr(field: &str, node: &Node) -> Result<Expression, ProtocolError> {
    Expression::parse(node).map_err(|source| ProtocolError::Expr {
        field: field.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bustool_common::{load_document_from_str, DocumentFormat};

    fn doc(json: &str) -> Node {
        load_document_from_str(json, DocumentFormat::Json).unwrap()
    }

    #[test]
    fn non_mapping_is_rejected() {
        let err = MapReader::new(&Node::from(3i64)).unwrap_err();
        assert!(matches!(err, ProtocolError::TypeMismatch { .. }));
    }

    #[test]
    fn required_and_optional_strings() {
        let node = doc(r#"{"controller": "master", "desc": 4}"#);
        let reader = MapReader::new(&node).unwrap();
        assert_eq!(reader.require_str("controller").unwrap(), "master");
        assert_eq!(reader.optional_str("device").unwrap(), None);
        assert_eq!(
            reader.require_str("device").unwrap_err(),
            ProtocolError::MissingField {
                field: "device".into()
            }
        );
        assert!(matches!(
            reader.optional_str("desc"),
            Err(ProtocolError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn enum_values() {
        let node = doc(r#"{"edge": "both"}"#);
        let reader = MapReader::new(&node).unwrap();
        let err = reader.require_enum("edge", &["rising", "falling"]).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidEnum { ref value, .. } if value == "both"));
    }

    #[test]
    fn nested_mapping_errors_carry_path() {
        let node = doc(r#"{"clock": 5}"#);
        let reader = MapReader::new(&node).unwrap();
        let err = reader.require_mapping("clock").unwrap_err();
        assert_eq!(err.field(), "clock");
    }

    #[test]
    fn expression_fields() {
        let node = doc(r#"{"count": {"$add": ["N", 1]}, "bad": {"$nope": 1}}"#);
        let reader = MapReader::new(&node).unwrap();
        assert_eq!(reader.require_expr("count").unwrap().to_string(), "N + 1");
        assert_eq!(reader.optional_expr("time").unwrap(), None);
        let err = reader.require_expr("bad").unwrap_err();
        assert_eq!(err.field(), "bad");
    }
}
