//! Upload session: the state machine tying ingestion, validation and commit together.
//!
//! ```text
//! Idle --select_file--> Reviewed --commit--> Committing --> Committed
//!   ^                                                          |
//!   +------------------ zero failures (auto-reset) -----------+
//! ```
//!
//! Selecting a new file always discards the previous session data first. A file-level failure
//! (unsupported format, structural parse failure, missing headers) still lands in `Reviewed`,
//! with no entities and a session-level error instead of row errors. A commit whose future is
//! dropped mid-run goes back to `Reviewed`.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::{ImportError, SessionError};
use crate::execution::{
    BatchCommitExecutor, BatchSummary, CommitMetrics, CommitOptions, CreateOperation, SummaryReport,
};
use crate::ingestion::{ImportOptions, SelectedFile, review_file};
use crate::teacher::{TeacherRecord, teacher_schema};
use crate::types::{FieldSchema, ImportRecord, RowErrors, ValidatedEntity};
use crate::validation::ValidationReport;

/// Lifecycle state of an [`UploadSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No file selected.
    Idle,
    /// File parsed and validated (or rejected at file level).
    Reviewed,
    /// Batch submission underway.
    Committing,
    /// Batch finished with at least one failure; data retained for inspection.
    Committed,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Reviewed => "reviewed",
            Self::Committing => "committing",
            Self::Committed => "committed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for an [`UploadSession`].
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub import: ImportOptions,
    pub commit: CommitOptions,
}

/// Serializable view of a session for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub file_name: Option<String>,
    pub total_rows: usize,
    pub valid_count: usize,
    pub error_count: usize,
    pub progress: f64,
    /// File-level failure message, if the file was rejected.
    pub file_error: Option<String>,
    pub row_errors: RowErrors,
    pub summary: Option<BatchSummary>,
    pub report: Option<SummaryReport>,
}

impl SessionSnapshot {
    /// JSON encoding for the presentation layer.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Owns one file's ingested/validated state and drives its commit.
pub struct UploadSession<T> {
    schema: FieldSchema,
    import: ImportOptions,
    executor: BatchCommitExecutor,
    state: SessionState,
    file_name: Option<String>,
    report: ValidationReport<T>,
    file_error: Option<ImportError>,
    summary: Option<BatchSummary>,
}

/// Session importing teacher accounts.
pub type TeacherUploadSession = UploadSession<TeacherRecord>;

impl UploadSession<TeacherRecord> {
    /// Session using [`teacher_schema`].
    pub fn for_teachers(options: SessionOptions) -> Self {
        Self::new(teacher_schema(), options)
    }
}

impl<T: ImportRecord + Sync> UploadSession<T> {
    pub fn new(schema: FieldSchema, options: SessionOptions) -> Self {
        Self {
            schema,
            import: options.import,
            executor: BatchCommitExecutor::new(options.commit),
            state: SessionState::Idle,
            file_name: None,
            report: ValidationReport::default(),
            file_error: None,
            summary: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Valid records in input order.
    pub fn entities(&self) -> &[ValidatedEntity<T>] {
        &self.report.entities
    }

    pub fn row_errors(&self) -> &RowErrors {
        &self.report.row_errors
    }

    /// File-level failure of the current file, if any.
    pub fn file_error(&self) -> Option<&ImportError> {
        self.file_error.as_ref()
    }

    pub fn valid_count(&self) -> usize {
        self.report.valid_count()
    }

    pub fn error_count(&self) -> usize {
        self.report.error_count()
    }

    pub fn total_rows(&self) -> usize {
        self.report.total_rows()
    }

    /// Summary of the last commit, while the session is `Committed`.
    pub fn last_summary(&self) -> Option<&BatchSummary> {
        self.summary.as_ref()
    }

    pub fn progress(&self) -> f64 {
        self.executor.progress()
    }

    pub fn subscribe_progress(&self) -> watch::Receiver<f64> {
        self.executor.subscribe_progress()
    }

    pub fn metrics(&self) -> Arc<CommitMetrics> {
        self.executor.metrics()
    }

    pub fn can_commit(&self) -> bool {
        self.state == SessionState::Reviewed && !self.report.entities.is_empty()
    }

    /// Discard all session data and return to `Idle`.
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.file_name = None;
        self.report = ValidationReport::default();
        self.file_error = None;
        self.summary = None;
        self.executor.reset_progress();
    }

    /// Replace the session contents with a newly selected file.
    ///
    /// Always ends in `Reviewed`. A rejected file leaves zero entities and sets
    /// [`Self::file_error`].
    pub fn select_file(&mut self, file: SelectedFile) {
        self.reset();
        self.file_name = Some(file.name.clone());

        match review_file::<T>(&file, &self.schema, &self.import) {
            Ok(report) => {
                info!(
                    file = %file.name,
                    valid = report.valid_count(),
                    invalid = report.error_count(),
                    "file reviewed"
                );
                self.report = report;
            }
            Err(e) => {
                warn!(file = %file.name, err = %e, "file rejected");
                self.file_error = Some(e);
            }
        }
        self.state = SessionState::Reviewed;
    }

    /// Submit every valid record through `op`.
    ///
    /// Allowed only from `Reviewed` with at least one valid record. A fully successful batch
    /// resets the session to `Idle`; otherwise it stays `Committed` with its data and summary.
    ///
    /// Dropping the returned future before it completes puts the session back in `Reviewed`
    /// with progress at 0. Records already accepted by `op` stay accepted.
    pub async fn commit<C>(&mut self, op: &C) -> Result<BatchSummary, SessionError>
    where
        C: CreateOperation<T> + ?Sized,
    {
        if self.state != SessionState::Reviewed {
            return Err(SessionError::NotReviewed {
                state: self.state.as_str(),
            });
        }
        if self.report.entities.is_empty() {
            return Err(SessionError::NothingToCommit);
        }

        let guard = CommitGuard::enter(&mut self.state, &self.executor);
        info!(items = self.report.entities.len(), "commit started");
        let summary = self.executor.run(&self.report.entities, op).await;
        guard.finish();

        if summary.failed == 0 {
            info!(succeeded = summary.succeeded, "commit fully succeeded, resetting session");
            self.reset();
        } else {
            warn!(
                succeeded = summary.succeeded,
                failed = summary.failed,
                "commit finished with failures"
            );
            self.summary = Some(summary.clone());
        }
        Ok(summary)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let max_listed = self.executor.options().max_listed_failures;
        SessionSnapshot {
            state: self.state,
            file_name: self.file_name.clone(),
            total_rows: self.total_rows(),
            valid_count: self.valid_count(),
            error_count: self.error_count(),
            progress: self.progress(),
            file_error: self.file_error.as_ref().map(ToString::to_string),
            row_errors: self.report.row_errors.clone(),
            summary: self.summary.clone(),
            report: self.summary.as_ref().map(|s| s.report(max_listed)),
        }
    }
}

/// Holds a session in `Committing` for the duration of a run.
///
/// Dropped without [`CommitGuard::finish`] (the commit future was cancelled), it restores
/// `Reviewed` and clears the published progress.
struct CommitGuard<'a> {
    state: &'a mut SessionState,
    executor: &'a BatchCommitExecutor,
    armed: bool,
}

impl<'a> CommitGuard<'a> {
    fn enter(state: &'a mut SessionState, executor: &'a BatchCommitExecutor) -> Self {
        *state = SessionState::Committing;
        Self {
            state,
            executor,
            armed: true,
        }
    }

    fn finish(mut self) {
        *self.state = SessionState::Committed;
        self.armed = false;
    }
}

impl Drop for CommitGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("commit dropped before completion, session back to reviewed");
            *self.state = SessionState::Reviewed;
            self.executor.reset_progress();
        }
    }
}

impl<T> fmt::Debug for UploadSession<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadSession")
            .field("state", &self.state)
            .field("file_name", &self.file_name)
            .field("entities", &self.report.entities.len())
            .field("row_errors", &self.report.row_errors.len())
            .field("file_error", &self.file_error)
            .finish()
    }
}
