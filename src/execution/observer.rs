use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use tracing::debug;

/// Events emitted by the batch commit executor.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitEvent {
    RunStarted { total: usize },
    ItemStarted { index: usize, row: usize },
    ItemFinished {
        index: usize,
        row: usize,
        succeeded: bool,
        /// Percentage of items attempted so far (0-100).
        progress: f64,
    },
    RunFinished {
        elapsed: Duration,
        metrics: CommitMetricsSnapshot,
    },
}

/// Observer hook for commit events.
pub trait CommitObserver: Send + Sync {
    fn on_event(&self, event: &CommitEvent);
}

/// Logs commit events at debug level.
#[derive(Debug, Default)]
pub struct TracingCommitObserver;

impl CommitObserver for TracingCommitObserver {
    fn on_event(&self, event: &CommitEvent) {
        debug!(?event, "commit event");
    }
}

/// Real-time counters for a commit run.
///
/// The executor updates these while submitting; callers can snapshot them at any time.
pub struct CommitMetrics {
    run_id: AtomicU64,
    elapsed_ns: AtomicU64,

    attempted: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,

    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl CommitMetrics {
    pub fn new() -> Self {
        Self {
            run_id: AtomicU64::new(0),
            elapsed_ns: AtomicU64::new(0),
            attempted: AtomicU64::new(0),
            succeeded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn begin_run(&self) {
        let _ = self.run_id.fetch_add(1, Ordering::SeqCst);
        self.elapsed_ns.store(0, Ordering::SeqCst);
        self.attempted.store(0, Ordering::SeqCst);
        self.succeeded.store(0, Ordering::SeqCst);
        self.failed.store(0, Ordering::SeqCst);
        self.in_flight.store(0, Ordering::SeqCst);
        self.max_in_flight.store(0, Ordering::SeqCst);
    }

    pub fn end_run(&self, elapsed: Duration) {
        self.elapsed_ns
            .store(elapsed.as_nanos().min(u64::MAX as u128) as u64, Ordering::SeqCst);
    }

    pub fn on_item_start(&self) {
        let _ = self.attempted.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        update_max_usize(&self.max_in_flight, now);
    }

    pub fn on_item_end(&self, succeeded: bool) {
        let counter = if succeeded { &self.succeeded } else { &self.failed };
        let _ = counter.fetch_add(1, Ordering::SeqCst);
        let _ = self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> CommitMetricsSnapshot {
        let elapsed_ns = self.elapsed_ns.load(Ordering::SeqCst);
        let elapsed = if elapsed_ns > 0 {
            Some(Duration::from_nanos(elapsed_ns))
        } else {
            None
        };

        CommitMetricsSnapshot {
            run_id: self.run_id.load(Ordering::SeqCst),
            elapsed,
            attempted: self.attempted.load(Ordering::SeqCst),
            succeeded: self.succeeded.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            in_flight: self.in_flight.load(Ordering::SeqCst),
            max_in_flight: self.max_in_flight.load(Ordering::SeqCst),
        }
    }
}

impl Default for CommitMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn update_max_usize(dst: &AtomicUsize, now: usize) {
    let _ = dst.fetch_max(now, Ordering::SeqCst);
}

/// Immutable snapshot of [`CommitMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMetricsSnapshot {
    pub run_id: u64,
    pub elapsed: Option<Duration>,
    pub attempted: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub in_flight: usize,
    pub max_in_flight: usize,
}

impl fmt::Display for CommitMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run_id={}, attempted={}, succeeded={}, failed={}, max_in_flight={}, elapsed={:?}",
            self.run_id, self.attempted, self.succeeded, self.failed, self.max_in_flight, self.elapsed
        )
    }
}
