//! Collecting diagnostics while entities are generated on worker threads.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Shared collector handed to every generation worker.
///
/// Entities are generated in parallel, so a worker only reports problems
/// here and never stops its siblings. The pipeline checks
/// [`has_errors`](Self::has_errors) once all entities are done and discards
/// the whole output if any entity failed.
///
/// Both tallies are kept beside the list so the summary line can be printed
/// without cloning every diagnostic.
#[derive(Default)]
pub struct DiagnosticSink {
    reported: Mutex<Vec<Diagnostic>>,
    errors: AtomicUsize,
    warnings: AtomicUsize,
}

impl DiagnosticSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one diagnostic.
    pub fn emit(&self, diag: Diagnostic) {
        let tally = match diag.severity {
            Severity::Error => &self.errors,
            Severity::Warning => &self.warnings,
        };
        tally.fetch_add(1, Ordering::Relaxed);
        self.reported().push(diag);
    }

    /// Whether any entity reported an error.
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Errors reported so far, drained ones included.
    pub fn error_count(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }

    /// Warnings (`W300` unsupported clocks, `W301` arbiters) reported so far,
    /// drained ones included.
    pub fn warning_count(&self) -> usize {
        self.warnings.load(Ordering::Relaxed)
    }

    /// Removes and returns everything reported, in arrival order.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.reported())
    }

    /// Copies everything reported without draining the sink.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.reported().clone()
    }

    // A worker that panicked mid-push leaves a complete list behind, so a
    // poisoned lock is still usable.
    fn reported(&self) -> MutexGuard<'_, Vec<Diagnostic>> {
        self.reported
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::DiagnosticCode;
    use crate::diagnostic::Location;

    fn unresolved_bus(entity: &str) -> Diagnostic {
        Diagnostic::error(
            DiagnosticCode::error(301),
            "unresolved bus `bus_z`",
            Location::field(entity, "bus"),
        )
    }

    fn unsynthesized_arbiter(entity: &str) -> Diagnostic {
        Diagnostic::warning(
            DiagnosticCode::warning(301),
            "arbiter `round_robin` is not synthesized",
            Location::entity(entity),
        )
    }

    #[test]
    fn clean_run_reports_nothing() {
        let sink = DiagnosticSink::new();
        assert!(!sink.has_errors());
        assert_eq!((sink.error_count(), sink.warning_count()), (0, 0));
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn arbiter_warning_keeps_output() {
        let sink = DiagnosticSink::new();
        sink.emit(unsynthesized_arbiter("xbar"));
        assert!(!sink.has_errors());
        assert_eq!(sink.warning_count(), 1);
    }

    #[test]
    fn draining_keeps_the_tallies() {
        let sink = DiagnosticSink::new();
        sink.emit(unsynthesized_arbiter("xbar"));
        sink.emit(unresolved_bus("mux"));
        let drained = sink.take_all();
        assert_eq!(drained[1].location.entity.as_deref(), Some("mux"));
        assert!(sink.diagnostics().is_empty());
        assert!(sink.has_errors());
        assert_eq!(sink.warning_count(), 1);
    }

    #[test]
    fn entities_report_from_worker_threads() {
        let sink = DiagnosticSink::new();
        std::thread::scope(|scope| {
            for n in 0..16 {
                let sink = &sink;
                scope.spawn(move || {
                    let entity = format!("mux_{n}");
                    if n % 4 == 0 {
                        sink.emit(unresolved_bus(&entity));
                    } else {
                        sink.emit(unsynthesized_arbiter(&entity));
                    }
                });
            }
        });
        assert_eq!(sink.error_count(), 4);
        assert_eq!(sink.warning_count(), 12);
        assert_eq!(sink.take_all().len(), 16);
    }
}
