use std::time::Duration;

use thiserror::Error;

/// Convenience result type for file-level import operations.
pub type ImportResult<T> = Result<T, ImportError>;

/// File-level import failure.
///
/// Every variant is terminal for the current file: no partial row set is returned alongside it.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The input has no bytes at all.
    #[error("the selected file is empty")]
    EmptyFile,

    /// The input is not a delimited-text file we accept.
    #[error("unsupported file '{name}': expected a .csv file")]
    UnsupportedFormat { name: String },

    /// The bytes could not be read as delimited text under any supported delimiter.
    #[error("could not parse file as delimited text (delimiter '{delimiter}', {attempts} attempt(s)): {message}")]
    StructuralParse {
        /// Delimiter used by the last attempt.
        delimiter: char,
        /// Number of parse attempts made (1 or 2).
        attempts: usize,
        message: String,
    },

    /// The file parsed, but one or more required columns are absent under every accepted spelling.
    #[error("missing required headers: {}", .missing.join(", "))]
    MissingHeaders { missing: Vec<String> },
}

/// Failure of the remote create operation for a single record.
///
/// Never escapes the commit loop; it is folded into the batch summary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// The remote service refused the record (e.g. duplicate email).
    #[error("{reason}")]
    Rejected { reason: String },

    /// The request did not complete (connection reset, 5xx, ...).
    #[error("transport error: {message}")]
    Transport { message: String },

    /// The request exceeded the per-item timeout.
    #[error("timed out after {after:?}")]
    TimedOut { after: Duration },
}

impl SubmissionError {
    /// Shorthand for a [`SubmissionError::Rejected`] value.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }
}

/// Misuse of the upload session state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Commit was requested outside the `Reviewed` state.
    #[error("cannot commit while session is {state}")]
    NotReviewed { state: &'static str },

    /// Commit was requested but no row passed validation.
    #[error("there are no valid rows to import")]
    NothingToCommit,
}
