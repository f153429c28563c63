//! Diagnostic creation, severity management, and terminal rendering.
//!
//! Every structured error raised while compiling a bus description is turned
//! into a [`Diagnostic`] carrying a stable code and the [`Location`] of the
//! offending entity and field. Non-fatal findings are collected in the
//! thread-safe [`DiagnosticSink`] while entities are generated in parallel.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::{Diagnostic, Location};
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
