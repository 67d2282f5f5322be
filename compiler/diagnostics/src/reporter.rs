//! The diagnostic reporter.

use super::{BareDiagnostic, Severity};
use crate::error::ErasedReportedError;
use span::SourceMap;
use std::{
    collections::BTreeSet,
    mem,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, RwLock, RwLockReadGuard,
    },
};
use utility::pluralize;

/// A diagnostic reporter.
pub struct Reporter {
    kind: ReporterKind,
    map: Option<Arc<RwLock<SourceMap>>>,
}

impl Reporter {
    fn new(kind: ReporterKind) -> Self {
        Self { kind, map: None }
    }

    pub fn silent() -> Self {
        Self::new(ReporterKind::Silent)
    }

    pub fn buffer(diagnostics: Buffer) -> Self {
        Self::new(ReporterKind::Buffer(diagnostics))
    }

    pub fn stderr() -> Self {
        Self::new(ReporterKind::Stderr)
    }

    pub fn buffered_stderr(reported_any_errors: Arc<AtomicBool>) -> Self {
        Self::new(ReporterKind::BufferedStderr(StderrBuffer {
            errors: Mutex::default(),
            warnings: Mutex::default(),
            reported_any_errors,
        }))
    }

    #[must_use]
    pub fn with_map(mut self, map: Arc<RwLock<SourceMap>>) -> Self {
        self.map = Some(map);
        self
    }

    fn map(&self) -> Option<RwLockReadGuard<'_, SourceMap>> {
        self.map.as_ref().map(|map| map.read().unwrap())
    }

    pub(super) fn report(&self, diagnostic: BareDiagnostic) -> ErasedReportedError {
        match &self.kind {
            ReporterKind::Silent => {}
            ReporterKind::Buffer(diagnostics) => {
                diagnostics.lock().unwrap().insert(diagnostic);
            }
            ReporterKind::Stderr => stderr_print(&diagnostic.format(self.map().as_deref())),
            ReporterKind::BufferedStderr(buffer) => match diagnostic.severity {
                Severity::Bug | Severity::Error => {
                    buffer.errors.lock().unwrap().insert(diagnostic);
                }
                Severity::Warning => {
                    buffer.warnings.lock().unwrap().insert(diagnostic);
                }
            },
        }

        ErasedReportedError::new()
    }
}

impl Drop for Reporter {
    fn drop(&mut self) {
        if let ReporterKind::BufferedStderr(buffer) = &self.kind {
            buffer.flush(self.map().as_deref());
        }
    }
}

enum ReporterKind {
    Silent,
    Buffer(Buffer),
    Stderr,
    BufferedStderr(StderrBuffer),
}

pub type Buffer = Arc<Mutex<BTreeSet<BareDiagnostic>>>;

struct StderrBuffer {
    errors: Mutex<BTreeSet<BareDiagnostic>>,
    warnings: Mutex<BTreeSet<BareDiagnostic>>,
    reported_any_errors: Arc<AtomicBool>,
}

impl StderrBuffer {
    fn flush(&self, map: Option<&SourceMap>) {
        let warnings = mem::take(&mut *self.warnings.lock().unwrap());

        for warning in &warnings {
            stderr_print(&warning.format(map));
        }

        if !warnings.is_empty() {
            Self::report_warning_summary(&warnings, map);
        }

        let errors = mem::take(&mut *self.errors.lock().unwrap());

        for error in &errors {
            stderr_print(&error.format(map));
        }

        if !errors.is_empty() {
            self.reported_any_errors.store(true, Ordering::SeqCst);
            Self::report_error_summary(&errors, map);
        }
    }

    fn report_error_summary(errors: &BTreeSet<BareDiagnostic>, map: Option<&SourceMap>) {
        let summary = super::Diagnostic::error()
            .message(pluralize!(
                errors.len(),
                "aborting due to previous error",
                format!("aborting due to {} previous errors", errors.len()),
            ))
            .bare
            .format(map);

        stderr_print(&summary);
    }

    fn report_warning_summary(warnings: &BTreeSet<BareDiagnostic>, map: Option<&SourceMap>) {
        let summary = super::Diagnostic::warning()
            .message(format!(
                "emitted {} {}",
                warnings.len(),
                pluralize!(warnings.len(), "warning")
            ))
            .bare
            .format(map);

        stderr_print(&summary);
    }
}

fn stderr_print(message: &impl std::fmt::Display) {
    eprintln!("{message}");
    eprintln!();
}
