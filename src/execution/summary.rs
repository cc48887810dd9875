//! Post-commit tally and its human-readable report.

use std::fmt;

use serde::Serialize;

/// One item the create operation did not accept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionFailure {
    /// Original input row position of the entity.
    pub position: usize,
    /// Identifying label of the record (e.g. its email).
    pub label: String,
    pub reason: String,
}

impl fmt::Display for SubmissionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {} ({}): {}", self.position + 1, self.label, self.reason)
    }
}

/// Overall result of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// No item failed.
    Success,
    /// Some items succeeded, some failed.
    Partial,
    /// Every item failed.
    Failure,
}

/// Tally of a finished batch. `succeeded + failed` equals the number of submitted items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Failures in submission order.
    pub failures: Vec<SubmissionFailure>,
}

/// Presentation-ready description of a [`BatchSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryReport {
    pub status: BatchStatus,
    pub headline: String,
    /// Failure detail lines, capped in size.
    pub details: Vec<String>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn status(&self) -> BatchStatus {
        match (self.succeeded, self.failed) {
            (_, 0) => BatchStatus::Success,
            (0, _) => BatchStatus::Failure,
            _ => BatchStatus::Partial,
        }
    }

    /// Failure lines for a human reader.
    ///
    /// Up to `max_listed` failures are enumerated. Beyond that only the first one is shown,
    /// followed by a count of the rest.
    pub fn failure_details(&self, max_listed: usize) -> Vec<String> {
        if self.failures.len() <= max_listed.max(1) {
            return self.failures.iter().map(ToString::to_string).collect();
        }
        let rest = self.failures.len() - 1;
        vec![self.failures[0].to_string(), format!("and {rest} more")]
    }

    pub fn report(&self, max_listed: usize) -> SummaryReport {
        let status = self.status();
        let (headline, details) = match status {
            BatchStatus::Success => (
                format!("{} {} imported successfully", self.succeeded, plural(self.succeeded)),
                Vec::new(),
            ),
            BatchStatus::Partial => (
                format!(
                    "{} {} imported, {} failed",
                    self.succeeded,
                    plural(self.succeeded),
                    self.failed
                ),
                self.failure_details(max_listed),
            ),
            BatchStatus::Failure => (
                format!("no records imported: {} failed", self.failed),
                self.failure_details(max_listed),
            ),
        };
        SummaryReport {
            status,
            headline,
            details,
        }
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "record" } else { "records" }
}
