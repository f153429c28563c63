//! Structured diagnostic messages with severity, codes, and document locations.

use crate::code::DiagnosticCode;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where in the description document a diagnostic originated.
///
/// Documents arrive as already-parsed trees without byte offsets, so
/// locations name the entity id and the dotted field path inside it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// The top-level entity id (`bus_a`, `mux0`, ...).
    pub entity: Option<String>,
    /// The dotted field path inside the entity (`signals.addr.span`).
    pub field: Option<String>,
}

impl Location {
    /// A location with no entity or field information.
    pub const UNKNOWN: Location = Location {
        entity: None,
        field: None,
    };

    /// Creates a location naming only an entity.
    pub fn entity(entity: impl Into<String>) -> Self {
        Self {
            entity: Some(entity.into()),
            field: None,
        }
    }

    /// Creates a location naming an entity and a field inside it.
    pub fn field(entity: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            entity: Some(entity.into()),
            field: Some(field.into()),
        }
    }

    /// Returns `true` if neither entity nor field is known.
    pub fn is_unknown(&self) -> bool {
        self.entity.is_none() && self.field.is_none()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.entity, &self.field) {
            (Some(e), Some(field)) => write!(f, "entity `{e}`, field `{field}`"),
            (Some(e), None) => write!(f, "entity `{e}`"),
            (None, Some(field)) => write!(f, "field `{field}`"),
            (None, None) => write!(f, "<unknown>"),
        }
    }
}

/// A structured diagnostic message.
///
/// Each diagnostic includes a severity level, a unique code, the primary
/// message, the document location, and optional notes and help text.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// The unique code identifying the type of diagnostic.
    pub code: DiagnosticCode,
    /// The main diagnostic message.
    pub message: String,
    /// Where the issue was detected.
    pub location: Location,
    /// Explanatory footnotes (e.g., "note: ...").
    pub notes: Vec<String>,
    /// Actionable suggestions (e.g., "help: ...").
    pub help: Vec<String>,
}

impl Diagnostic {
    /// Creates a new error diagnostic.
    pub fn error(code: DiagnosticCode, message: impl Into<String>, location: Location) -> Self {
        Self::new(Severity::Error, code, message, location)
    }

    /// Creates a new warning diagnostic.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>, location: Location) -> Self {
        Self::new(Severity::Warning, code, message, location)
    }

    fn new(
        severity: Severity,
        code: DiagnosticCode,
        message: impl Into<String>,
        location: Location,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            location,
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    /// Adds a note to this diagnostic.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Adds a help message to this diagnostic.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }
}
