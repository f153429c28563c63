//! Expression errors and their diagnostic codes.
//!
//! Error codes `E101`--`E105` cover expression construction and evaluation
//! failures.

use bustool_diagnostics::{Category, Diagnostic, DiagnosticCode, Location};

use crate::op::Arity;

/// Expression node of an unsupported shape.
pub const E101: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 101,
};

/// Operator key missing from the operator table.
pub const E102: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 102,
};

/// Operand count outside the operator's arity.
pub const E103: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 103,
};

/// Variable with no binding during evaluation or rendering.
pub const E104: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 104,
};

/// Expression that cannot be reduced to an integer.
pub const E105: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 105,
};

/// Errors raised while building, evaluating or rendering an expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExprError {
    /// The document node is not a string, integer, or single-key mapping.
    #[error("malformed expression: {found}")]
    Malformed {
        /// What was found instead.
        found: String,
    },

    /// The mapping key does not name an operator.
    #[error("unknown operator `{key}`")]
    UnknownOperator {
        /// The offending key.
        key: String,
    },

    /// The operator received the wrong number of operands.
    #[error("operator `{op}` takes {expected} operand(s), found {found}")]
    Arity {
        /// The operator key.
        op: &'static str,
        /// The accepted operand counts.
        expected: Arity,
        /// The operand count supplied.
        found: usize,
    },

    /// A variable has no binding in the evaluation or rendering scope.
    #[error("unbound variable `{name}`")]
    UnboundVariable {
        /// The variable name.
        name: String,
    },

    /// The expression has no integer value.
    #[error("expression is not evaluable: {reason}")]
    NotEvaluable {
        /// Why evaluation stopped.
        reason: String,
    },
}

impl ExprError {
    /// Returns the diagnostic code for this error.
    pub fn code(&self) -> DiagnosticCode {
        match self {
            ExprError::Malformed { .. } => E101,
            ExprError::UnknownOperator { .. } => E102,
            ExprError::Arity { .. } => E103,
            ExprError::UnboundVariable { .. } => E104,
            ExprError::NotEvaluable { .. } => E105,
        }
    }

    /// Converts this error into a diagnostic at `location`.
    pub fn to_diagnostic(&self, location: Location) -> Diagnostic {
        let diag = Diagnostic::error(self.code(), self.to_string(), location);
        match self {
            ExprError::UnknownOperator { .. } => {
                diag.with_help("operators are keys such as `$add`, `$andb` or `$clog2`")
            }
            ExprError::Malformed { .. } => diag.with_note(
                "an expression is a name, an integer, or a mapping with exactly one operator key",
            ),
            _ => diag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::Op;

    #[test]
    fn codes_are_distinct() {
        let errors = [
            ExprError::Malformed {
                found: "sequence".into(),
            },
            ExprError::UnknownOperator { key: "$pow".into() },
            ExprError::Arity {
                op: "$add",
                expected: Op::Add.arity(),
                found: 1,
            },
            ExprError::UnboundVariable { name: "N".into() },
            ExprError::NotEvaluable {
                reason: "raw text".into(),
            },
        ];
        let codes: Vec<String> = errors.iter().map(|e| e.code().to_string()).collect();
        assert_eq!(codes, ["E101", "E102", "E103", "E104", "E105"]);
    }

    #[test]
    fn arity_message() {
        let err = ExprError::Arity {
            op: "$if",
            expected: Op::If.arity(),
            found: 2,
        };
        assert_eq!(err.to_string(), "operator `$if` takes 3 operand(s), found 2");
    }

    #[test]
    fn diagnostic_carries_location() {
        let err = ExprError::UnknownOperator { key: "$pow".into() };
        let diag = err.to_diagnostic(Location::field("bus_a", "parameters.W.default"));
        assert_eq!(diag.code, E102);
        assert_eq!(diag.location.field.as_deref(), Some("parameters.W.default"));
        assert_eq!(diag.help.len(), 1);
    }
}
