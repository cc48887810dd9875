use std::fmt;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::ImportError;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ImportSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (the file was rejected).
    Error,
    /// Critical error (typically I/O or other infrastructure failures).
    Critical,
}

impl ImportSeverity {
    /// Severity of a file-level failure.
    pub fn for_error(e: &ImportError) -> Self {
        match e {
            ImportError::Io(_) => Self::Critical,
            ImportError::EmptyFile
            | ImportError::UnsupportedFormat { .. }
            | ImportError::StructuralParse { .. }
            | ImportError::MissingHeaders { .. } => Self::Error,
        }
    }
}

/// Context about an import attempt.
#[derive(Debug, Clone)]
pub struct ImportContext {
    /// Name of the selected file (or path for path-based ingestion).
    pub file_name: String,
}

/// Stats reported once a file has been parsed and validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportStats {
    /// Parsed data rows.
    pub rows: usize,
    /// Rows that passed validation.
    pub valid: usize,
    /// Rows with at least one validation message.
    pub invalid: usize,
    /// Whether the fallback delimiter was needed.
    pub used_fallback: bool,
}

/// Observer interface for file-level import outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait ImportObserver: Send + Sync {
    /// Called when a file was parsed and validated.
    fn on_success(&self, _ctx: &ImportContext, _stats: ImportStats) {}

    /// Called when a file was rejected.
    fn on_failure(&self, _ctx: &ImportContext, _severity: ImportSeverity, _error: &ImportError) {}

    /// Called when a rejection meets an alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &ImportContext, severity: ImportSeverity, error: &ImportError) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn ImportObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn ImportObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl ImportObserver for CompositeObserver {
    fn on_success(&self, ctx: &ImportContext, stats: ImportStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &ImportContext, severity: ImportSeverity, error: &ImportError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &ImportContext, severity: ImportSeverity, error: &ImportError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Forwards import events to `tracing`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl ImportObserver for TracingObserver {
    fn on_success(&self, ctx: &ImportContext, stats: ImportStats) {
        info!(
            file = %ctx.file_name,
            rows = stats.rows,
            valid = stats.valid,
            invalid = stats.invalid,
            used_fallback = stats.used_fallback,
            "import file reviewed"
        );
    }

    fn on_failure(&self, ctx: &ImportContext, severity: ImportSeverity, error: &ImportError) {
        warn!(file = %ctx.file_name, ?severity, err = %error, "import file rejected");
    }

    fn on_alert(&self, ctx: &ImportContext, severity: ImportSeverity, error: &ImportError) {
        error!(file = %ctx.file_name, ?severity, err = %error, "import alert");
    }
}
