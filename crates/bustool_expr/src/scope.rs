//! Name lookup for evaluation and rendering.
//!
//! Evaluation maps variable names to integers; rendering maps them to the
//! text that refers to them in the emitted entity (usually the name itself,
//! sometimes a dotted path through a bus port).

use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap};

/// Integer bindings used for constant evaluation.
pub type Bindings = HashMap<String, i64>;

/// Supplies integer values for variables during evaluation.
pub trait EvalEnv {
    /// Returns the value bound to `name`, if any.
    fn value(&self, name: &str) -> Option<i64>;
}

/// Supplies reference text for variables during rendering.
pub trait RenderScope {
    /// Returns the text that refers to `name`, if it is in scope.
    fn resolve(&self, name: &str) -> Option<String>;
}

impl EvalEnv for HashMap<String, i64> {
    fn value(&self, name: &str) -> Option<i64> {
        self.get(name).copied()
    }
}

impl EvalEnv for IndexMap<String, i64> {
    fn value(&self, name: &str) -> Option<i64> {
        self.get(name).copied()
    }
}

impl EvalEnv for BTreeMap<String, i64> {
    fn value(&self, name: &str) -> Option<i64> {
        self.get(name).copied()
    }
}

impl RenderScope for HashMap<String, String> {
    fn resolve(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl RenderScope for IndexMap<String, String> {
    fn resolve(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl RenderScope for BTreeMap<String, String> {
    fn resolve(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// A scope that resolves every name to itself.
///
/// Used for `Display` and for text that is rendered before an entity scope
/// exists (parameter defaults of a bus template, for instance).
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbatim;

impl RenderScope for Verbatim {
    fn resolve(&self, name: &str) -> Option<String> {
        Some(name.to_string())
    }
}
