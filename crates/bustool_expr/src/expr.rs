//! The expression tree: parsing, evaluation, rendering and rewriting.

use bustool_common::Node;
use indexmap::IndexSet;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;

use crate::errors::ExprError;
use crate::op::Op;
use crate::scope::{EvalEnv, RenderScope, Verbatim};

/// Precedence of variables, constants and raw text. Atoms never need parentheses.
pub const ATOM_PRECEDENCE: i32 = 11;

/// An expression of the bus description language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// A named value resolved through the evaluation or rendering scope.
    Variable(String),
    /// An integer literal.
    Constant(i64),
    /// Text passed through to the output unchanged. Has no integer value.
    RawText(String),
    /// An operator applied to operands.
    Operation(Operation),
}

/// An operator together with an operand list whose length its arity accepts.
///
/// The fields are private so that the arity check in [`Operation::new`]
/// cannot be bypassed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    op: Op,
    args: Vec<Expression>,
}

impl Operation {
    /// Builds an operation, failing with [`ExprError::Arity`] if `op` does not
    /// accept `args.len()` operands.
    pub fn new(op: Op, args: Vec<Expression>) -> Result<Self, ExprError> {
        op.check_arity(args.len())?;
        Ok(Self { op, args })
    }

    /// Returns the operator.
    pub fn op(&self) -> Op {
        self.op
    }

    /// Returns the operands.
    pub fn args(&self) -> &[Expression] {
        &self.args
    }
}

impl Expression {
    /// Creates a variable reference.
    pub fn var(name: impl Into<String>) -> Self {
        Expression::Variable(name.into())
    }

    /// Creates an integer literal.
    pub fn constant(value: i64) -> Self {
        Expression::Constant(value)
    }

    /// Creates raw pass-through text.
    pub fn raw(text: impl Into<String>) -> Self {
        Expression::RawText(text.into())
    }

    /// Applies `op` to `args`, checking arity.
    pub fn operation(op: Op, args: Vec<Expression>) -> Result<Self, ExprError> {
        Operation::new(op, args).map(Expression::Operation)
    }

    /// Applies a two-operand operator.
    pub fn binary(op: Op, lhs: Expression, rhs: Expression) -> Result<Self, ExprError> {
        Self::operation(op, vec![lhs, rhs])
    }

    /// Parses an expression from a document node.
    ///
    /// - a string is a variable
    /// - an integer is a constant
    /// - a single-key mapping `{"$op": operands}` is an operation; a sequence
    ///   value supplies the operands, any other value is the only operand
    pub fn parse(node: &Node) -> Result<Self, ExprError> {
        match node {
            Node::String(name) => Ok(Expression::Variable(name.clone())),
            Node::Integer(value) => Ok(Expression::Constant(*value)),
            Node::Mapping(entries) => {
                if entries.len() != 1 {
                    return Err(ExprError::Malformed {
                        found: format!("mapping with {} keys", entries.len()),
                    });
                }
                let Some((key, value)) = entries.first() else {
                    return Err(ExprError::Malformed {
                        found: "empty mapping".to_string(),
                    });
                };
                let op = Op::from_key(key)
                    .ok_or_else(|| ExprError::UnknownOperator { key: key.clone() })?;
                let args = match value {
                    Node::Sequence(items) => {
                        op.check_arity(items.len())?;
                        items.iter().map(Expression::parse).collect::<Result<_, _>>()?
                    }
                    other => vec![Expression::parse(other)?],
                };
                Self::operation(op, args)
            }
            other => Err(ExprError::Malformed {
                found: other.kind().to_string(),
            }),
        }
    }

    /// Returns the rendering precedence of this node.
    pub fn precedence(&self) -> i32 {
        match self {
            Expression::Operation(operation) => operation.op.precedence(),
            _ => ATOM_PRECEDENCE,
        }
    }

    /// Returns the literal value if this node is a constant.
    pub fn as_constant(&self) -> Option<i64> {
        match self {
            Expression::Constant(value) => Some(*value),
            _ => None,
        }
    }

    /// Evaluates the expression to an integer.
    pub fn evaluate<E: EvalEnv + ?Sized>(&self, env: &E) -> Result<i64, ExprError> {
        match self {
            Expression::Variable(name) => env
                .value(name)
                .ok_or_else(|| ExprError::UnboundVariable { name: name.clone() }),
            Expression::Constant(value) => Ok(*value),
            Expression::RawText(text) => Err(ExprError::NotEvaluable {
                reason: format!("raw text `{text}` has no value"),
            }),
            Expression::Operation(operation) => {
                let values = operation
                    .args
                    .iter()
                    .map(|arg| arg.evaluate(env))
                    .collect::<Result<Vec<_>, _>>()?;
                operation.op.evaluate(&values)
            }
        }
    }

    /// Renders the expression as SystemVerilog text.
    ///
    /// An operand is parenthesized exactly when its precedence is strictly
    /// lower than its parent's.
    pub fn render<S: RenderScope + ?Sized>(&self, scope: &S) -> Result<String, ExprError> {
        match self {
            Expression::Variable(name) => scope
                .resolve(name)
                .ok_or_else(|| ExprError::UnboundVariable { name: name.clone() }),
            Expression::Constant(value) => Ok(value.to_string()),
            Expression::RawText(text) => Ok(text.clone()),
            Expression::Operation(operation) => {
                let own = operation.op.precedence();
                let parts = operation
                    .args
                    .iter()
                    .map(|arg| {
                        let text = arg.render(scope)?;
                        Ok(if arg.precedence() < own {
                            format!("({text})")
                        } else {
                            text
                        })
                    })
                    .collect::<Result<Vec<_>, ExprError>>()?;
                operation.op.render(&parts)
            }
        }
    }

    /// Returns the variable names referenced anywhere in the tree, in first
    /// occurrence order.
    pub fn free_vars(&self) -> IndexSet<String> {
        let mut vars = IndexSet::new();
        self.collect_vars(&mut vars);
        vars
    }

    fn collect_vars(&self, vars: &mut IndexSet<String>) {
        match self {
            Expression::Variable(name) => {
                vars.insert(name.clone());
            }
            Expression::Operation(operation) => {
                for arg in &operation.args {
                    arg.collect_vars(vars);
                }
            }
            Expression::Constant(_) | Expression::RawText(_) => {}
        }
    }

    /// Rebuilds the tree top-down, replacing every node for which `f`
    /// returns `Some`. Replaced nodes are not visited again.
    ///
    /// Operand counts never change, so the arity invariant is preserved.
    pub fn rewrite<F>(&self, f: &mut F) -> Expression
    where
        F: FnMut(&Expression) -> Option<Expression>,
    {
        if let Some(replacement) = f(self) {
            return replacement;
        }
        match self {
            Expression::Operation(operation) => Expression::Operation(Operation {
                op: operation.op,
                args: operation.args.iter().map(|arg| arg.rewrite(f)).collect(),
            }),
            other => other.clone(),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.render(&Verbatim).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

/// Serializes in document notation: names as strings, constants as integers,
/// operations as `{"$op": [operands]}` and raw text as `{"raw": text}`.
impl Serialize for Expression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Expression::Variable(name) => serializer.serialize_str(name),
            Expression::Constant(value) => serializer.serialize_i64(*value),
            Expression::RawText(text) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("raw", text)?;
                map.end()
            }
            Expression::Operation(operation) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(operation.op.key(), &operation.args)?;
                map.end()
            }
        }
    }
}

impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.op.key(), &self.args)?;
        map.end()
    }
}
