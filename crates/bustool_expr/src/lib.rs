//! The expression sub-language of bus descriptions.
//!
//! Expressions appear wherever a description needs a number or a piece of
//! logic: parameter defaults, bit spans, replication counts, handshake
//! predicates. The same tree is used for compile-time evaluation and for
//! re-emitting SystemVerilog text with minimal parenthesization.
//!
//! Documents spell operations as single-key mappings:
//!
//! ```
//! use bustool_common::load_document_from_str;
//! use bustool_common::DocumentFormat;
//! use bustool_expr::{Bindings, Expression, Verbatim};
//!
//! let node = load_document_from_str(r#"{"$mul": [{"$add": [1, 2]}, 3]}"#, DocumentFormat::Json).unwrap();
//! let expr = Expression::parse(&node).unwrap();
//! assert_eq!(expr.render(&Verbatim).unwrap(), "(1 + 2) * 3");
//! assert_eq!(expr.evaluate(&Bindings::new()).unwrap(), 9);
//! ```

#![warn(missing_docs)]

pub mod errors;
pub mod expr;
pub mod op;
pub mod scope;

pub use errors::ExprError;
pub use expr::{Expression, Operation, ATOM_PRECEDENCE};
pub use op::{Arity, Op};
pub use scope::{Bindings, EvalEnv, RenderScope, Verbatim};
