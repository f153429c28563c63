//! Inclusive bit ranges.

use bustool_common::Node;
use bustool_expr::{EvalEnv, ExprError, Expression, Op, RenderScope};
use serde::Serialize;

use crate::access::parse_expr;
use crate::errors::ProtocolError;

/// An inclusive bit range `[msb:lsb]`.
///
/// The default span `[0:0]` describes a scalar and renders as nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    /// The most significant bit.
    pub msb: Expression,
    /// The least significant bit.
    pub lsb: Expression,
}

impl Default for Span {
    fn default() -> Self {
        Self {
            msb: Expression::constant(0),
            lsb: Expression::constant(0),
        }
    }
}

impl Span {
    /// Creates a span from explicit bounds.
    pub fn new(msb: Expression, lsb: Expression) -> Self {
        Self { msb, lsb }
    }

    /// Creates the span `[width - 1:0]`.
    ///
    /// A constant width is folded, so `8` yields `[7:0]` rather than `[8 - 1:0]`.
    pub fn from_width(width: Expression) -> Result<Self, ExprError> {
        let msb = match width.as_constant() {
            Some(w) => Expression::constant(w.checked_sub(1).ok_or_else(|| {
                ExprError::NotEvaluable {
                    reason: format!("span width {w} is out of range"),
                }
            })?),
            None => Expression::binary(Op::Sub, width, Expression::constant(1))?,
        };
        Ok(Self {
            msb,
            lsb: Expression::constant(0),
        })
    }

    /// Parses a span from one of its three document forms:
    ///
    /// - a two-element sequence `[msb, lsb]`
    /// - a dash literal `"H-L"` with integer bounds
    /// - any other expression, taken as a width
    ///
    /// Errors name the field relative to the span node itself.
    pub fn parse(node: &Node) -> Result<Self, ProtocolError> {
        match node {
            Node::Sequence(items) => match items.as_slice() {
                [msb, lsb] => Ok(Self {
                    msb: parse_expr("0", msb)?,
                    lsb: parse_expr("1", lsb)?,
                }),
                _ => Err(ProtocolError::InvalidSpan {
                    field: String::new(),
                    text: format!("sequence of {} elements", items.len()),
                }),
            },
            Node::String(text) if text.contains('-') => {
                let bound = |part: Option<&str>| part.and_then(|p| p.trim().parse::<i64>().ok());
                let mut parts = text.splitn(2, '-');
                match (bound(parts.next()), bound(parts.next())) {
                    (Some(msb), Some(lsb)) => Ok(Self {
                        msb: Expression::constant(msb),
                        lsb: Expression::constant(lsb),
                    }),
                    _ => Err(ProtocolError::InvalidSpan {
                        field: String::new(),
                        text: text.clone(),
                    }),
                }
            }
            other => {
                let width = parse_expr("", other)?;
                Self::from_width(width).map_err(|source| ProtocolError::Expr {
                    field: String::new(),
                    source,
                })
            }
        }
    }

    /// Returns `true` for the scalar span `[0:0]`.
    pub fn is_default(&self) -> bool {
        self.msb.as_constant() == Some(0) && self.lsb.as_constant() == Some(0)
    }

    /// Renders `[msb:lsb]`.
    pub fn render<S: RenderScope + ?Sized>(&self, scope: &S) -> Result<String, ExprError> {
        Ok(format!(
            "[{}:{}]",
            self.msb.render(scope)?,
            self.lsb.render(scope)?
        ))
    }

    /// Renders `[msb:lsb]`, or nothing for the default span.
    pub fn render_range<S: RenderScope + ?Sized>(&self, scope: &S) -> Result<String, ExprError> {
        if self.is_default() {
            Ok(String::new())
        } else {
            self.render(scope)
        }
    }

    /// Evaluates the number of bits covered.
    pub fn width<E: EvalEnv + ?Sized>(&self, env: &E) -> Result<i64, ExprError> {
        let (msb, lsb) = (self.msb.evaluate(env)?, self.lsb.evaluate(env)?);
        msb.checked_sub(lsb)
            .and_then(|d| d.checked_add(1))
            .ok_or_else(|| ExprError::NotEvaluable {
                reason: format!("span [{msb}:{lsb}] is wider than 64 bits"),
            })
    }
}
