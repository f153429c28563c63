//! Transaction handshake predicates.

use bustool_common::Node;
use bustool_expr::Expression;
use serde::Serialize;

use crate::access::MapReader;
use crate::errors::ProtocolError;

/// The request/accept/stall predicates governing a bus transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransSpec {
    /// Asserted when the controller starts a transaction.
    pub request: Expression,
    /// Asserted when the device takes the request. Defaults to `1`.
    pub accept: Expression,
    /// Asserted while the transaction is held up. Defaults to `0`.
    pub stall: Expression,
}

impl TransSpec {
    /// Parses `{request, accept?, stall?}`.
    pub fn parse(node: &Node) -> Result<Self, ProtocolError> {
        let map = MapReader::new(node)?;
        Ok(Self {
            request: map.require_expr("request")?,
            accept: map
                .optional_expr("accept")?
                .unwrap_or_else(|| Expression::constant(1)),
            stall: map
                .optional_expr("stall")?
                .unwrap_or_else(|| Expression::constant(0)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bustool_common::{load_document_from_str, DocumentFormat};

    fn trans(json: &str) -> Result<TransSpec, ProtocolError> {
        TransSpec::parse(&load_document_from_str(json, DocumentFormat::Json).unwrap())
    }

    #[test]
    fn defaults() {
        let t = trans(r#"{"request": "req"}"#).unwrap();
        assert_eq!(t.request, Expression::var("req"));
        assert_eq!(t.accept, Expression::constant(1));
        assert_eq!(t.stall, Expression::constant(0));
    }

    #[test]
    fn explicit_predicates() {
        let t = trans(r#"{"request": "req", "accept": "ack", "stall": {"$not": "ready"}}"#)
            .unwrap();
        assert_eq!(t.accept.to_string(), "ack");
        assert_eq!(t.stall.to_string(), "!ready");
    }

    #[test]
    fn request_is_required() {
        assert_eq!(
            trans(r#"{"accept": "ack"}"#).unwrap_err(),
            ProtocolError::MissingField {
                field: "request".into()
            }
        );
    }
}
