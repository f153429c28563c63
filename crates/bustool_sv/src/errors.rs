//! Rendering errors and their diagnostic codes.

use bustool_diagnostics::{Category, Diagnostic, DiagnosticCode, Location};
use bustool_expr::ExprError;

/// A name is declared twice in one entity scope.
pub const E401: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 401,
};

/// Writing the output failed.
pub const E501: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 501,
};

/// Errors raised while building an entity scope or emitting text.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Two declarations of one entity share a name.
    #[error("duplicate identifier `{id}` in `{entity}`")]
    DuplicateIdentifier {
        /// The entity being rendered.
        entity: String,
        /// The repeated name.
        id: String,
    },

    /// An expression could not be rendered in the entity scope.
    #[error("cannot render {context} of `{entity}`: {source}")]
    Expr {
        /// The entity being rendered.
        entity: String,
        /// What was being rendered (`port map_addr`, `assign target`).
        context: String,
        /// The underlying expression error.
        #[source]
        source: ExprError,
    },

    /// The output sink failed.
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    /// Returns the diagnostic code for this error.
    pub fn code(&self) -> DiagnosticCode {
        match self {
            RenderError::DuplicateIdentifier { .. } => E401,
            RenderError::Expr { source, .. } => source.code(),
            RenderError::Io(_) => E501,
        }
    }

    /// Converts this error into a diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let location = match self {
            RenderError::DuplicateIdentifier { entity, .. }
            | RenderError::Expr { entity, .. } => Location::entity(entity.clone()),
            RenderError::Io(_) => Location::UNKNOWN,
        };
        let diag = Diagnostic::error(self.code(), self.to_string(), location);
        match self {
            RenderError::DuplicateIdentifier { .. } => diag.with_note(
                "parameters, ports, bus members, and body declarations share one namespace",
            ),
            _ => diag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_diagnostic() {
        let err = RenderError::DuplicateIdentifier {
            entity: "mux".into(),
            id: "x".into(),
        };
        let diag = err.to_diagnostic();
        assert_eq!(diag.code.to_string(), "E401");
        assert_eq!(diag.location, Location::entity("mux"));
        assert_eq!(diag.message, "duplicate identifier `x` in `mux`");
    }

    #[test]
    fn expr_keeps_expression_code() {
        let err = RenderError::Expr {
            entity: "mux".into(),
            context: "assign target".into(),
            source: ExprError::UnboundVariable { name: "y".into() },
        };
        assert_eq!(err.code().to_string(), "E104");
    }

    #[test]
    fn io_has_no_location() {
        let err = RenderError::from(std::io::Error::other("disk full"));
        assert!(err.to_diagnostic().location.is_unknown());
        assert_eq!(err.code(), E501);
    }
}
