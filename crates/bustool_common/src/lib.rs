//! Shared foundational types used across the bustool generator.
//!
//! This crate provides the generic document tree that bus descriptions are
//! read into, and the loaders that build it from JSON or TOML sources.

#![warn(missing_docs)]

pub mod document;
pub mod node;

pub use document::{load_document, load_document_from_str, DocumentError, DocumentFormat};
pub use node::{Node, NodeKind};
