//! Entity parameters.

use bustool_common::Node;
use bustool_expr::Expression;
use serde::Serialize;

use crate::access::MapReader;
use crate::errors::ProtocolError;

/// A compile-time parameter with a default value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    /// Parameter name.
    pub id: String,
    /// Optional description, emitted as a comment.
    pub desc: Option<String>,
    /// Default value.
    pub default: Expression,
}

impl Parameter {
    /// Creates a parameter.
    pub fn new(id: impl Into<String>, desc: Option<String>, default: Expression) -> Self {
        Self {
            id: id.into(),
            desc,
            default,
        }
    }

    /// Parses `{desc?, default}`.
    pub fn parse(id: &str, node: &Node) -> Result<Self, ProtocolError> {
        let map = MapReader::new(node)?;
        Ok(Self {
            id: id.to_string(),
            desc: map.optional_str("desc")?.map(str::to_string),
            default: map.require_expr("default")?,
        })
    }
}
