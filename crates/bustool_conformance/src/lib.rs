//! Conformance test helpers for bustool.
//!
//! Runs description documents through the full pipeline (load, register,
//! analyze, generate, render) and returns structured results for assertion
//! in integration tests.

#![warn(missing_docs)]

use bustool_common::{load_document_from_str, DocumentFormat};
use bustool_diagnostics::{Diagnostic, DiagnosticSink, Severity};
use bustool_elaborate::{elaborate, Registry};
use bustool_ir::EntityDecl;

/// Indent unit used by every conformance expectation.
pub const INDENT: &str = "    ";

/// Result of running the full pipeline on one document.
pub struct PipelineResult {
    /// The generated declarations, empty if elaboration failed.
    pub decls: Vec<EntityDecl>,
    /// The rendered text of each declaration, in document order. Empty if
    /// any stage failed.
    pub rendered: Vec<String>,
    /// All diagnostics emitted during the pipeline.
    pub diagnostics: Vec<Diagnostic>,
    /// Whether any errors were emitted.
    pub has_errors: bool,
    /// Number of error-severity diagnostics.
    pub error_count: usize,
    /// Number of warning-severity diagnostics.
    pub warning_count: usize,
}

impl PipelineResult {
    /// Returns the rendered text of entity `id`.
    pub fn entity(&self, id: &str) -> Option<&str> {
        self.decls
            .iter()
            .position(|d| d.id == id)
            .and_then(|i| self.rendered.get(i))
            .map(String::as_str)
    }

    /// Returns `true` if a diagnostic with the given code text (`E301`,
    /// `W300`) was emitted.
    pub fn has_code(&self, code: &str) -> bool {
        self.diagnostics.iter().any(|d| d.code.to_string() == code)
    }

    /// Concatenates every rendered entity, separated by blank lines.
    pub fn text(&self) -> String {
        self.rendered.join("\n")
    }
}

/// Runs the full pipeline on a JSON document, emitting every entity.
pub fn run_json(source: &str) -> PipelineResult {
    run_pipeline(source, DocumentFormat::Json, &[])
}

/// Runs the full pipeline on a TOML document, emitting every entity.
pub fn run_toml(source: &str) -> PipelineResult {
    run_pipeline(source, DocumentFormat::Toml, &[])
}

/// Runs the full pipeline, emitting only `selection` (all when empty).
///
/// Structured errors from any stage, loading included, become diagnostics.
pub fn run_pipeline(source: &str, format: DocumentFormat, selection: &[&str]) -> PipelineResult {
    let sink = DiagnosticSink::new();
    let selection: Vec<String> = selection.iter().map(|s| s.to_string()).collect();

    let decls = match load_document_from_str(source, format) {
        Ok(document) => Registry::from_document(&document)
            .and_then(|registry| elaborate(&registry, &selection, &sink))
            .unwrap_or_else(|e| {
                sink.emit(e.to_diagnostic());
                Vec::new()
            }),
        Err(e) => {
            sink.emit(e.to_diagnostic());
            Vec::new()
        }
    };

    let rendered = if sink.has_errors() {
        Vec::new()
    } else {
        bustool_sv::render_all(&decls, INDENT, "\n").unwrap_or_else(|e| {
            sink.emit(e.to_diagnostic());
            Vec::new()
        })
    };

    let diagnostics = sink.take_all();
    let error_count = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    let warning_count = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .count();

    PipelineResult {
        decls,
        rendered,
        has_errors: error_count > 0,
        diagnostics,
        error_count,
        warning_count,
    }
}
