//! SystemVerilog emission for generated entity declarations.
//!
//! [`EntityRenderer`] builds the collision-checked name scope of an
//! [`EntityDecl`](bustool_ir::EntityDecl) and walks its statements into an
//! indentation-aware [`Writer`].

#![warn(missing_docs)]

pub mod errors;
pub mod render;
pub mod scope;
pub mod writer;

pub use errors::RenderError;
pub use render::{render_all, render_to_string, AssignForm, EntityRenderer};
pub use scope::EntityScope;
pub use writer::Writer;
