//! Diagnostic rendering for human-readable terminal output.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;

/// Trait for rendering diagnostics into formatted output strings.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic into a formatted string.
    fn render(&self, diag: &Diagnostic) -> String;
}

/// Renders diagnostics in a rustc-style terminal format.
///
/// Produces output like:
/// ```text
/// error[E201]: missing required field `controller`
///   --> design.json: entity `bus_a`
///    = help: ...
/// ```
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
    /// The document path shown in location lines.
    pub origin: Option<String>,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool, origin: Option<String>) -> Self {
        Self { color, origin }
    }

    fn paint(&self, severity: Severity, text: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        let code = match severity {
            Severity::Error => "31",
            Severity::Warning => "33",
        };
        format!("\x1b[1;{code}m{text}\x1b[0m")
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        let mut out = String::new();

        let header = format!("{}[{}]", diag.severity, diag.code);
        out.push_str(&format!(
            "{}: {}\n",
            self.paint(diag.severity, &header),
            diag.message
        ));

        if !diag.location.is_unknown() || self.origin.is_some() {
            out.push_str("  --> ");
            if let Some(origin) = &self.origin {
                out.push_str(origin);
                if !diag.location.is_unknown() {
                    out.push_str(": ");
                }
            }
            if !diag.location.is_unknown() {
                out.push_str(&diag.location.to_string());
            }
            out.push('\n');
        }

        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }
        for help in &diag.help {
            out.push_str(&format!("   = help: {help}\n"));
        }

        out
    }
}
