//! Diagnostic codes and errors for elaboration.
//!
//! Error codes `E301`--`E303` cover failures while binding and generating
//! entities. Warning codes `W300`--`W301` cover parts of a description that
//! are accepted but not turned into logic.

use bustool_diagnostics::{Category, Diagnostic, DiagnosticCode, Location};
use bustool_expr::ExprError;
use bustool_protocol::ProtocolError;

/// An entity names a bus that is not an `asymmetric_bus` in the document.
pub const E301: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 301,
};

/// A multiplexer is built over a bus without an address signal.
pub const E302: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 302,
};

/// An entity selected for output does not exist.
pub const E303: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 303,
};

/// A bus signal without a direction is not routed by a multiplexer.
pub const W300: DiagnosticCode = DiagnosticCode {
    category: Category::Warning,
    number: 300,
};

/// Crossbar arbitration logic is not synthesized.
pub const W301: DiagnosticCode = DiagnosticCode {
    category: Category::Warning,
    number: 301,
};

/// Errors raised while parsing, analyzing or generating entities.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ElabError {
    /// An entity definition failed to parse.
    #[error("in `{entity}`: {source}")]
    Protocol {
        /// The entity being parsed.
        entity: String,
        /// The underlying descriptor error.
        #[source]
        source: ProtocolError,
    },

    /// An expression could not be built during generation.
    #[error("in `{entity}`, {context}: {source}")]
    Expr {
        /// The entity being generated.
        entity: String,
        /// What was being built.
        context: String,
        /// The underlying expression error.
        #[source]
        source: ExprError,
    },

    /// The bus key of an entity does not name a bus template.
    #[error("`{entity}` refers to `{bus}`, which is not an asymmetric bus")]
    UnresolvedBusReference {
        /// The referring entity.
        entity: String,
        /// The unresolved key.
        bus: String,
    },

    /// The bus template has no `addr` signal to decode.
    #[error("`{entity}` decodes addresses but bus `{bus}` declares no address signal")]
    MissingAddressSignal {
        /// The multiplexer.
        entity: String,
        /// The bus template.
        bus: String,
    },

    /// An entity requested for output is not in the document.
    #[error("unknown entity `{id}`")]
    UnknownEntity {
        /// The requested id.
        id: String,
    },
}

impl ElabError {
    /// Returns the diagnostic code for this error.
    ///
    /// Wrapped descriptor and expression errors keep their own codes.
    pub fn code(&self) -> DiagnosticCode {
        match self {
            ElabError::Protocol { source, .. } => source.code(),
            ElabError::Expr { source, .. } => source.code(),
            ElabError::UnresolvedBusReference { .. } => E301,
            ElabError::MissingAddressSignal { .. } => E302,
            ElabError::UnknownEntity { .. } => E303,
        }
    }

    /// Returns the entity the error is located in, if any.
    pub fn entity(&self) -> Option<&str> {
        match self {
            ElabError::Protocol { entity, .. }
            | ElabError::Expr { entity, .. }
            | ElabError::UnresolvedBusReference { entity, .. }
            | ElabError::MissingAddressSignal { entity, .. } => Some(entity),
            ElabError::UnknownEntity { .. } => None,
        }
    }

    /// Converts this error into a diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ElabError::Protocol { entity, source } => source.to_diagnostic(entity),
            ElabError::Expr { entity, source, .. } => {
                let mut diag = source.to_diagnostic(Location::entity(entity.clone()));
                diag.message = self.to_string();
                diag
            }
            ElabError::UnresolvedBusReference { entity, .. } => {
                Diagnostic::error(E301, self.to_string(), Location::field(entity.clone(), "bus"))
                    .with_help("`bus` must name an entity of type `asymmetric_bus`")
            }
            ElabError::MissingAddressSignal { entity, bus } => {
                Diagnostic::error(E302, self.to_string(), Location::field(entity.clone(), "bus"))
                    .with_help(format!("add an `addr` field to `{bus}`"))
            }
            ElabError::UnknownEntity { .. } => {
                Diagnostic::error(E303, self.to_string(), Location::UNKNOWN)
            }
        }
    }
}

/// Creates a `W300` warning for a directionless signal skipped by a multiplexer.
pub fn warn_unrouted_signal(entity: &str, bus: &str, signal: &str) -> Diagnostic {
    Diagnostic::warning(
        W300,
        format!("signal `{signal}` of `{bus}` has no direction and is not routed"),
        Location::entity(entity),
    )
    .with_help(format!("set `dir` on `{bus}.signals.{signal}`"))
}

/// Creates a `W301` warning for a crossbar whose arbiter is only recorded.
pub fn warn_arbiter_not_synthesized(entity: &str, arbiter: &str) -> Diagnostic {
    Diagnostic::warning(
        W301,
        format!("arbitration logic for `{arbiter}` is not synthesized"),
        Location::field(entity, "arbiter"),
    )
    .with_note("the crossbar declares its ports and parameters only")
}

#[cfg(test)]
mod tests {
    use super::*;
    use bustool_diagnostics::Severity;

    #[test]
    fn unresolved_points_at_bus_field() {
        let err = ElabError::UnresolvedBusReference {
            entity: "mux".into(),
            bus: "bus_b".into(),
        };
        let diag = err.to_diagnostic();
        assert_eq!(diag.code.to_string(), "E301");
        assert_eq!(diag.location, Location::field("mux", "bus"));
        assert_eq!(
            diag.message,
            "`mux` refers to `bus_b`, which is not an asymmetric bus"
        );
    }

    #[test]
    fn wrapped_errors_keep_codes() {
        let err = ElabError::Protocol {
            entity: "bus_a".into(),
            source: ProtocolError::MissingField {
                field: "clock".into(),
            },
        };
        assert_eq!(err.code().to_string(), "E201");
        assert_eq!(err.to_diagnostic().location, Location::field("bus_a", "clock"));

        let err = ElabError::Expr {
            entity: "mux".into(),
            context: "decode logic".into(),
            source: ExprError::UnboundVariable { name: "q".into() },
        };
        assert_eq!(err.code().to_string(), "E104");
        assert_eq!(err.entity(), Some("mux"));
    }

    #[test]
    fn warnings_are_warnings() {
        let diag = warn_unrouted_signal("mux", "bus_a", "irq");
        assert_eq!(diag.severity, Severity::Warning);
        assert_eq!(diag.code.to_string(), "W300");
        let diag = warn_arbiter_not_synthesized("xbar", "round_robin");
        assert_eq!(diag.code, W301);
        assert_eq!(diag.location, Location::field("xbar", "arbiter"));
    }
}
