//! Bus and module signals.

use bustool_common::Node;
use bustool_expr::Expression;
use serde::Serialize;

use crate::access::MapReader;
use crate::errors::ProtocolError;
use crate::span::Span;

/// Signal direction, seen from the controller side of a bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Driven towards the controller.
    Input,
    /// Driven by the controller.
    Output,
}

impl Direction {
    const NAMES: &'static [&'static str] = &["input", "output"];

    /// Returns the SystemVerilog keyword.
    pub fn keyword(self) -> &'static str {
        match self {
            Direction::Input => "input",
            Direction::Output => "output",
        }
    }

    /// Returns the direction seen from the other end of the wire.
    pub fn flip(self) -> Self {
        match self {
            Direction::Input => Direction::Output,
            Direction::Output => Direction::Input,
        }
    }
}

/// A wire or wire array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signal {
    /// Signal name.
    pub id: String,
    /// Optional description, emitted as a comment.
    pub desc: Option<String>,
    /// Bit range of one element.
    pub span: Span,
    /// Number of elements. Defaults to `1`.
    pub count: Expression,
    /// Pipeline latency in cycles of the path producing this signal. Defaults to `0`.
    pub time: Expression,
    /// Direction, if the signal has one.
    pub direction: Option<Direction>,
    /// Whether devices see zero instead of the live value while unselected.
    pub masked: bool,
}

impl Signal {
    /// Creates a directionless, unreplicated signal with zero latency.
    pub fn new(id: impl Into<String>, span: Span) -> Self {
        Self {
            id: id.into(),
            desc: None,
            span,
            count: Expression::constant(1),
            time: Expression::constant(0),
            direction: None,
            masked: false,
        }
    }

    /// Sets the description.
    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = Some(desc.into());
        self
    }

    /// Sets the element count.
    pub fn with_count(mut self, count: Expression) -> Self {
        self.count = count;
        self
    }

    /// Sets the direction.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Returns `true` unless the element count is the constant `1`.
    pub fn is_replicated(&self) -> bool {
        self.count.as_constant() != Some(1)
    }

    /// Parses `{desc?, span?, count?, time?, dir?, masked?}`.
    pub fn parse(id: &str, node: &Node) -> Result<Self, ProtocolError> {
        let map = MapReader::new(node)?;
        let span = match map.get("span") {
            Some(node) => Span::parse(node).map_err(|e| e.within("span"))?,
            None => Span::default(),
        };
        let direction = if map.contains("dir") {
            match map.require_enum("dir", Direction::NAMES)? {
                "output" => Some(Direction::Output),
                _ => Some(Direction::Input),
            }
        } else {
            None
        };
        Ok(Self {
            id: id.to_string(),
            desc: map.optional_str("desc")?.map(str::to_string),
            span,
            count: map
                .optional_expr("count")?
                .unwrap_or_else(|| Expression::constant(1)),
            time: map
                .optional_expr("time")?
                .unwrap_or_else(|| Expression::constant(0)),
            direction,
            masked: map.optional_bool("masked")?.unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bustool_common::{load_document_from_str, DocumentFormat};
    use bustool_expr::Verbatim;

    fn signal(json: &str) -> Result<Signal, ProtocolError> {
        Signal::parse("s", &load_document_from_str(json, DocumentFormat::Json).unwrap())
    }

    #[test]
    fn defaults() {
        let s = signal("{}").unwrap();
        assert!(s.span.is_default());
        assert_eq!(s.count, Expression::constant(1));
        assert_eq!(s.time, Expression::constant(0));
        assert_eq!(s.direction, None);
        assert!(!s.masked);
        assert!(!s.is_replicated());
    }

    #[test]
    fn full_signal() {
        let s = signal(
            r#"{"desc": "Read data.", "span": "W", "time": 2, "dir": "input", "masked": true}"#,
        )
        .unwrap();
        assert_eq!(s.span.render(&Verbatim).unwrap(), "[W - 1:0]");
        assert_eq!(s.time, Expression::constant(2));
        assert_eq!(s.direction, Some(Direction::Input));
        assert!(s.masked);
    }

    #[test]
    fn invalid_direction() {
        let err = signal(r#"{"dir": "inout"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidEnum { .. }));
    }

    #[test]
    fn span_errors_are_prefixed() {
        let err = signal(r#"{"span": [1]}"#).unwrap_err();
        assert_eq!(err.field(), "span");
    }

    #[test]
    fn masked_must_be_boolean() {
        let err = signal(r#"{"masked": "yes"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::TypeMismatch { .. }));
    }

    #[test]
    fn direction_flip() {
        assert_eq!(Direction::Input.flip(), Direction::Output);
        assert_eq!(Direction::Output.flip().keyword(), "input");
    }
}
