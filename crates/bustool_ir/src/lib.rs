//! The declarative statement tree handed from elaboration to rendering.
//!
//! An [`EntityDecl`] is a complete module or interface: parameters, ports
//! and a body of [`Statement`]s. Statements are a closed union so every
//! consumer matches them exhaustively; procedural code inside `always` and
//! `generate` regions uses the nested [`BlockStatement`] union.

#![warn(missing_docs)]

pub mod entity;
pub mod stmt;

pub use entity::{EntityDecl, EntityKind, Port};
pub use stmt::{
    Assign, Binding, Block, BlockStatement, ClockEdge, Decl, For, GenBlock, If, Instance,
    RoleView, Statement, While,
};
