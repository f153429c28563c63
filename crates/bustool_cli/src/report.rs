//! Diagnostic reporting on standard error.

use bustool_diagnostics::{Diagnostic, DiagnosticRenderer, Severity, TerminalRenderer};

use crate::ReportFormat;

/// Formats `diagnostics` for display.
///
/// Text output is one rustc-style block per diagnostic. JSON output is a
/// single pretty-printed array.
pub fn format_report(
    diagnostics: &[Diagnostic],
    format: ReportFormat,
    color: bool,
    origin: Option<&str>,
) -> String {
    match format {
        ReportFormat::Text => {
            let renderer = TerminalRenderer::new(color, origin.map(str::to_string));
            diagnostics
                .iter()
                .map(|diag| renderer.render(diag))
                .collect()
        }
        ReportFormat::Json => {
            serde_json::to_string_pretty(diagnostics).unwrap_or_else(|_| "[]".to_string()) + "\n"
        }
    }
}

/// Returns the `(errors, warnings)` counts of `diagnostics`.
pub fn counts(diagnostics: &[Diagnostic]) -> (usize, usize) {
    let errors = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    let warnings = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .count();
    (errors, warnings)
}
