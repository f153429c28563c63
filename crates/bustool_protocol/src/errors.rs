//! Descriptor errors and their diagnostic codes.
//!
//! Error codes `E201`--`E206` cover malformed or inconsistent descriptor
//! fields. Every variant names the dotted field path inside its entity.

use bustool_common::NodeKind;
use bustool_diagnostics::{Category, Diagnostic, DiagnosticCode, Location};
use bustool_expr::ExprError;

/// A required field is absent.
pub const E201: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 201,
};

/// A field holds a value outside its enumeration.
pub const E202: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 202,
};

/// A field holds a node of the wrong shape.
pub const E203: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 203,
};

/// A bit span literal could not be interpreted.
pub const E204: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 204,
};

/// An identifier is declared twice in one scope.
pub const E205: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 205,
};

/// The bus address signal names no declared signal.
pub const E206: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 206,
};

/// Errors raised while parsing protocol descriptors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// A required key is absent.
    #[error("missing required field `{field}`")]
    MissingField {
        /// Dotted path of the absent key.
        field: String,
    },

    /// A string field holds a value outside its enumeration.
    #[error("invalid value `{value}` for `{field}`, expected one of: {}", .expected.join(", "))]
    InvalidEnum {
        /// Dotted path of the field.
        field: String,
        /// The value found.
        value: String,
        /// The accepted values.
        expected: &'static [&'static str],
    },

    /// A field holds a node of the wrong shape.
    #[error("`{field}` must be a {expected}, found {found}")]
    TypeMismatch {
        /// Dotted path of the field.
        field: String,
        /// The expected shape.
        expected: &'static str,
        /// The shape found.
        found: NodeKind,
    },

    /// A span is neither a pair, a `"H-L"` literal, nor a width expression.
    #[error("invalid span `{text}` at `{field}`")]
    InvalidSpan {
        /// Dotted path of the field.
        field: String,
        /// The offending text.
        text: String,
    },

    /// An expression field failed to parse.
    #[error("invalid expression at `{field}`: {source}")]
    Expr {
        /// Dotted path of the field.
        field: String,
        /// The underlying expression error.
        #[source]
        source: ExprError,
    },

    /// Two entries of one list share an id.
    #[error("duplicate identifier `{id}` in `{field}`")]
    DuplicateIdentifier {
        /// Dotted path of the list.
        field: String,
        /// The repeated id.
        id: String,
    },

    /// The bus address signal is not one of the bus signals.
    #[error("address signal `{id}` is not declared in `signals`")]
    UnknownAddressSignal {
        /// The named address signal.
        id: String,
    },
}

impl ProtocolError {
    /// Returns the diagnostic code for this error.
    ///
    /// Expression failures keep their own `E1xx` code.
    pub fn code(&self) -> DiagnosticCode {
        match self {
            ProtocolError::MissingField { .. } => E201,
            ProtocolError::InvalidEnum { .. } => E202,
            ProtocolError::TypeMismatch { .. } => E203,
            ProtocolError::InvalidSpan { .. } => E204,
            ProtocolError::Expr { source, .. } => source.code(),
            ProtocolError::DuplicateIdentifier { .. } => E205,
            ProtocolError::UnknownAddressSignal { .. } => E206,
        }
    }

    /// Returns the dotted field path the error points at.
    pub fn field(&self) -> &str {
        match self {
            ProtocolError::MissingField { field }
            | ProtocolError::InvalidEnum { field, .. }
            | ProtocolError::TypeMismatch { field, .. }
            | ProtocolError::InvalidSpan { field, .. }
            | ProtocolError::Expr { field, .. }
            | ProtocolError::DuplicateIdentifier { field, .. } => field,
            ProtocolError::UnknownAddressSignal { .. } => "addr",
        }
    }

    /// Prefixes the field path with `prefix`, used when a nested descriptor
    /// error surfaces through its parent.
    pub fn within(self, prefix: &str) -> Self {
        let join = |field: String| {
            if field.is_empty() {
                prefix.to_string()
            } else {
                format!("{prefix}.{field}")
            }
        };
        match self {
            ProtocolError::MissingField { field } => ProtocolError::MissingField {
                field: join(field),
            },
            ProtocolError::InvalidEnum {
                field,
                value,
                expected,
            } => ProtocolError::InvalidEnum {
                field: join(field),
                value,
                expected,
            },
            ProtocolError::TypeMismatch {
                field,
                expected,
                found,
            } => ProtocolError::TypeMismatch {
                field: join(field),
                expected,
                found,
            },
            ProtocolError::InvalidSpan { field, text } => ProtocolError::InvalidSpan {
                field: join(field),
                text,
            },
            ProtocolError::Expr { field, source } => ProtocolError::Expr {
                field: join(field),
                source,
            },
            ProtocolError::DuplicateIdentifier { field, id } => {
                ProtocolError::DuplicateIdentifier {
                    field: join(field),
                    id,
                }
            }
            other @ ProtocolError::UnknownAddressSignal { .. } => other,
        }
    }

    /// Converts this error into a diagnostic located in `entity`.
    pub fn to_diagnostic(&self, entity: &str) -> Diagnostic {
        let location = Location::field(entity, self.field());
        match self {
            ProtocolError::Expr { source, .. } => {
                let mut diag = source.to_diagnostic(location);
                diag.message = self.to_string();
                diag
            }
            ProtocolError::UnknownAddressSignal { .. } => {
                Diagnostic::error(self.code(), self.to_string(), location)
                    .with_help("set `addr` to the id of the signal carrying the address")
            }
            _ => Diagnostic::error(self.code(), self.to_string(), location),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_prefixes_paths() {
        let err = ProtocolError::MissingField {
            field: "edge".into(),
        }
        .within("clock");
        assert_eq!(err.field(), "clock.edge");
        assert_eq!(err.to_string(), "missing required field `clock.edge`");
    }

    #[test]
    fn within_empty_field() {
        let err = ProtocolError::TypeMismatch {
            field: String::new(),
            expected: "mapping",
            found: NodeKind::Integer,
        }
        .within("signals.addr");
        assert_eq!(err.field(), "signals.addr");
    }

    #[test]
    fn invalid_enum_message() {
        let err = ProtocolError::InvalidEnum {
            field: "clock.edge".into(),
            value: "both".into(),
            expected: &["rising", "falling"],
        };
        assert_eq!(
            err.to_string(),
            "invalid value `both` for `clock.edge`, expected one of: rising, falling"
        );
        assert_eq!(err.code(), E202);
    }

    #[test]
    fn expression_errors_keep_their_code() {
        let err = ProtocolError::Expr {
            field: "parameters.W.default".into(),
            source: ExprError::UnknownOperator { key: "$pow".into() },
        };
        assert_eq!(err.code().to_string(), "E102");
        let diag = err.to_diagnostic("bus_a");
        assert_eq!(diag.location, Location::field("bus_a", "parameters.W.default"));
        assert!(diag.message.contains("parameters.W.default"));
    }
}
