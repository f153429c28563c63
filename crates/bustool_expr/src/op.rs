//! The closed operator table.
//!
//! Every operator has a document key (`$add`), a rendering precedence, an
//! arity range, a constant-evaluation rule, and a rendering rule. Precedence
//! only drives parenthesization on output; the document structure alone
//! decides the shape of the tree.

use serde::{Serialize, Serializer};
use std::fmt;

use crate::errors::ExprError;

/// A named operator of the expression language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// Variadic sum (`$sum`), rendered as a `+` chain.
    Sum,
    /// Variadic product (`$prod`), rendered as a `*` chain.
    Prod,
    /// Ceiling log-base-2 (`$clog2`), rendered as a system function call.
    Clog2,
    /// Logical negation (`$not`).
    Not,
    /// Logical conjunction (`$and`).
    And,
    /// Logical disjunction (`$or`).
    Or,
    /// Bitwise complement (`$notb`).
    NotB,
    /// Bitwise AND (`$andb`).
    AndB,
    /// Bitwise OR (`$orb`).
    OrB,
    /// Bitwise XOR (`$xorb`).
    XorB,
    /// Left shift (`$shl`).
    Shl,
    /// Arithmetic right shift (`$shr`).
    Shr,
    /// Binary addition (`$add`).
    Add,
    /// Binary subtraction (`$sub`).
    Sub,
    /// Binary multiplication (`$mul`).
    Mul,
    /// Floor division (`$div`).
    Div,
    /// Floor modulo (`$mod`).
    Mod,
    /// Greater than (`$gt`).
    Gt,
    /// Less than (`$lt`).
    Lt,
    /// Greater or equal (`$ge`).
    Ge,
    /// Less or equal (`$le`).
    Le,
    /// Equality (`$eq`).
    Eq,
    /// Inequality (`$ne`).
    Ne,
    /// Conditional select (`$if`), rendered as `c ? a : b`.
    If,
    /// Assignment (`$set`), rendered as `a = b`.
    Set,
    /// Bit slice (`$slice`), rendered as `base[hi:lo]`.
    Slice,
    /// Bit index (`$index`), rendered as `base[idx]`.
    Index,
}

/// How an operator turns its rendered operands into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Call(&'static str),
    Prefix(&'static str),
    Infix(&'static str),
    Ternary,
    Bracket,
}

/// The inclusive range of operand counts an operator accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    /// Fewest operands accepted.
    pub min: usize,
    /// Most operands accepted, `None` for unbounded.
    pub max: Option<usize>,
}

impl Arity {
    const fn exactly(n: usize) -> Self {
        Self {
            min: n,
            max: Some(n),
        }
    }

    const fn at_least(n: usize) -> Self {
        Self { min: n, max: None }
    }

    /// Returns `true` if `n` operands are accepted.
    pub fn accepts(&self, n: usize) -> bool {
        n >= self.min && self.max.map_or(true, |max| n <= max)
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "{max}"),
            Some(max) => write!(f, "{}..={max}", self.min),
            None => write!(f, "at least {}", self.min),
        }
    }
}

impl Op {
    /// Every operator, in table order.
    pub const ALL: [Op; 27] = [
        Op::Sum,
        Op::Prod,
        Op::Clog2,
        Op::Not,
        Op::And,
        Op::Or,
        Op::NotB,
        Op::AndB,
        Op::OrB,
        Op::XorB,
        Op::Shl,
        Op::Shr,
        Op::Add,
        Op::Sub,
        Op::Mul,
        Op::Div,
        Op::Mod,
        Op::Gt,
        Op::Lt,
        Op::Ge,
        Op::Le,
        Op::Eq,
        Op::Ne,
        Op::If,
        Op::Set,
        Op::Slice,
        Op::Index,
    ];

    /// Looks up an operator by its document key, including the `$` prefix.
    pub fn from_key(key: &str) -> Option<Op> {
        Op::ALL.into_iter().find(|op| op.key() == key)
    }

    /// Returns the document key (`$add`).
    pub fn key(self) -> &'static str {
        match self {
            Op::Sum => "$sum",
            Op::Prod => "$prod",
            Op::Clog2 => "$clog2",
            Op::Not => "$not",
            Op::And => "$and",
            Op::Or => "$or",
            Op::NotB => "$notb",
            Op::AndB => "$andb",
            Op::OrB => "$orb",
            Op::XorB => "$xorb",
            Op::Shl => "$shl",
            Op::Shr => "$shr",
            Op::Add => "$add",
            Op::Sub => "$sub",
            Op::Mul => "$mul",
            Op::Div => "$div",
            Op::Mod => "$mod",
            Op::Gt => "$gt",
            Op::Lt => "$lt",
            Op::Ge => "$ge",
            Op::Le => "$le",
            Op::Eq => "$eq",
            Op::Ne => "$ne",
            Op::If => "$if",
            Op::Set => "$set",
            Op::Slice => "$slice",
            Op::Index => "$index",
        }
    }

    /// Returns the operator name without the `$` prefix.
    pub fn name(self) -> &'static str {
        &self.key()[1..]
    }

    /// Returns the rendering precedence. Higher binds tighter; atoms are 11.
    pub fn precedence(self) -> i32 {
        match self {
            Op::Set => -2,
            Op::If => -1,
            Op::Or => 0,
            Op::And => 1,
            Op::OrB => 2,
            Op::XorB => 3,
            Op::AndB => 4,
            Op::Eq | Op::Ne => 5,
            Op::Gt | Op::Lt | Op::Ge | Op::Le => 6,
            Op::Shl | Op::Shr => 7,
            Op::Sum | Op::Add | Op::Sub => 8,
            Op::Prod | Op::Mul | Op::Div | Op::Mod => 9,
            Op::Clog2 | Op::Not | Op::NotB | Op::Slice | Op::Index => 10,
        }
    }

    /// Returns the accepted operand counts.
    pub fn arity(self) -> Arity {
        match self {
            Op::Sum | Op::Prod => Arity::at_least(2),
            Op::Clog2 | Op::Not | Op::NotB => Arity::exactly(1),
            Op::If | Op::Slice => Arity::exactly(3),
            _ => Arity::exactly(2),
        }
    }

    fn shape(self) -> Shape {
        match self {
            Op::Sum | Op::Add => Shape::Infix("+"),
            Op::Prod | Op::Mul => Shape::Infix("*"),
            Op::Clog2 => Shape::Call("$clog2"),
            Op::Not => Shape::Prefix("!"),
            Op::And => Shape::Infix("&&"),
            Op::Or => Shape::Infix("||"),
            Op::NotB => Shape::Prefix("~"),
            Op::AndB => Shape::Infix("&"),
            Op::OrB => Shape::Infix("|"),
            Op::XorB => Shape::Infix("^"),
            Op::Shl => Shape::Infix("<<"),
            Op::Shr => Shape::Infix(">>"),
            Op::Sub => Shape::Infix("-"),
            Op::Div => Shape::Infix("/"),
            Op::Mod => Shape::Infix("%"),
            Op::Gt => Shape::Infix(">"),
            Op::Lt => Shape::Infix("<"),
            Op::Ge => Shape::Infix(">="),
            Op::Le => Shape::Infix("<="),
            Op::Eq => Shape::Infix("=="),
            Op::Ne => Shape::Infix("!="),
            Op::If => Shape::Ternary,
            Op::Set => Shape::Infix("="),
            Op::Slice | Op::Index => Shape::Bracket,
        }
    }

    /// Checks that `n` operands are acceptable for this operator.
    pub fn check_arity(self, n: usize) -> Result<(), ExprError> {
        let arity = self.arity();
        if arity.accepts(n) {
            Ok(())
        } else {
            Err(ExprError::Arity {
                op: self.key(),
                expected: arity,
                found: n,
            })
        }
    }

    /// Applies the operator to already-evaluated operands.
    ///
    /// Arithmetic wraps on overflow. Logical operators and comparisons yield
    /// `0` or `1`. Division and modulo round toward negative infinity.
    pub fn evaluate(self, args: &[i64]) -> Result<i64, ExprError> {
        self.check_arity(args.len())?;
        let a = args[0];
        let b = || args[1];
        let value = match self {
            Op::Sum => args.iter().fold(0i64, |acc, v| acc.wrapping_add(*v)),
            Op::Prod => args.iter().fold(1i64, |acc, v| acc.wrapping_mul(*v)),
            Op::Clog2 => clog2(a),
            Op::Not => (a == 0) as i64,
            Op::And => (a != 0 && b() != 0) as i64,
            Op::Or => (a != 0 || b() != 0) as i64,
            Op::NotB => !a,
            Op::AndB => a & b(),
            Op::OrB => a | b(),
            Op::XorB => a ^ b(),
            Op::Shl => shift_left(a, b())?,
            Op::Shr => shift_right(a, b())?,
            Op::Add => a.wrapping_add(b()),
            Op::Sub => a.wrapping_sub(b()),
            Op::Mul => a.wrapping_mul(b()),
            Op::Div => floor_div(a, b())?,
            Op::Mod => floor_mod(a, b())?,
            Op::Gt => (a > b()) as i64,
            Op::Lt => (a < b()) as i64,
            Op::Ge => (a >= b()) as i64,
            Op::Le => (a <= b()) as i64,
            Op::Eq => (a == b()) as i64,
            Op::Ne => (a != b()) as i64,
            Op::If => {
                if a != 0 {
                    args[1]
                } else {
                    args[2]
                }
            }
            Op::Set => b(),
            Op::Slice => bit_slice(a, args[1], args[2])?,
            Op::Index => shift_right(a, b())? & 1,
        };
        Ok(value)
    }

    /// Joins already-rendered (and already-parenthesized) operands.
    pub fn render(self, args: &[String]) -> Result<String, ExprError> {
        self.check_arity(args.len())?;
        let text = match self.shape() {
            Shape::Call(name) => format!("{name}({})", args.join(", ")),
            Shape::Prefix(symbol) => format!("{symbol}{}", args[0]),
            Shape::Infix(symbol) => args.join(&format!(" {symbol} ")),
            Shape::Ternary => format!("{} ? {} : {}", args[0], args[1], args[2]),
            Shape::Bracket => {
                let indices: Vec<&str> = args[1..].iter().map(|a| strip_parens(a)).collect();
                format!("{}[{}]", args[0], indices.join(":"))
            }
        };
        Ok(text)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl Serialize for Op {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

/// Brackets already delimit index operands, so one outer pair is redundant.
fn strip_parens(text: &str) -> &str {
    text.strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .unwrap_or(text)
}

/// Ceiling of log-base-2 with `$clog2` semantics (`clog2(0) = clog2(1) = 0`).
fn clog2(n: i64) -> i64 {
    if n <= 1 {
        return 0;
    }
    64 - i64::from((n - 1).leading_zeros())
}

fn shift_amount(amount: i64) -> Result<u32, ExprError> {
    if amount < 0 {
        return Err(ExprError::NotEvaluable {
            reason: format!("negative shift amount {amount}"),
        });
    }
    Ok(u32::try_from(amount).unwrap_or(u32::MAX))
}

fn shift_left(value: i64, amount: i64) -> Result<i64, ExprError> {
    let amount = shift_amount(amount)?;
    Ok(value.checked_shl(amount).unwrap_or(0))
}

fn shift_right(value: i64, amount: i64) -> Result<i64, ExprError> {
    let amount = shift_amount(amount)?;
    Ok(value
        .checked_shr(amount)
        .unwrap_or(if value < 0 { -1 } else { 0 }))
}

fn floor_div(a: i64, b: i64) -> Result<i64, ExprError> {
    if b == 0 {
        return Err(ExprError::NotEvaluable {
            reason: format!("division of {a} by zero"),
        });
    }
    let q = a.wrapping_div(b);
    if a.wrapping_rem(b) != 0 && ((a < 0) != (b < 0)) {
        Ok(q - 1)
    } else {
        Ok(q)
    }
}

fn floor_mod(a: i64, b: i64) -> Result<i64, ExprError> {
    if b == 0 {
        return Err(ExprError::NotEvaluable {
            reason: format!("modulo of {a} by zero"),
        });
    }
    let r = a.wrapping_rem(b);
    if r != 0 && ((r < 0) != (b < 0)) {
        Ok(r + b)
    } else {
        Ok(r)
    }
}

/// Extracts the inclusive bit range `[msb:lsb]` of `value`.
fn bit_slice(value: i64, msb: i64, lsb: i64) -> Result<i64, ExprError> {
    if msb < lsb {
        return Err(ExprError::NotEvaluable {
            reason: format!("slice [{msb}:{lsb}] has msb below lsb"),
        });
    }
    let shifted = shift_right(value, lsb)?;
    let width = msb
        .checked_sub(lsb)
        .and_then(|d| d.checked_add(1))
        .ok_or_else(|| ExprError::NotEvaluable {
            reason: format!("slice [{msb}:{lsb}] is wider than 64 bits"),
        })?;
    if width >= 64 {
        Ok(shifted)
    } else {
        Ok(shifted & ((1i64 << width) - 1))
    }
}
