//! Sequential batch commit of validated records to a remote create operation.
//!
//! This module sits "above" [`crate::validation`] and provides:
//!
//! - One-at-a-time submission through a [`CreateOperation`] (never more than one request in flight)
//! - Per-item failure accounting; a failed item never stops the batch
//! - Progress publication after every attempt, plus observer hooks and metrics for monitoring
//!
//! There is no cancellation: once started, a batch runs to completion.

mod observer;
pub mod summary;

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::error::SubmissionError;
use crate::types::{ImportRecord, ValidatedEntity};

pub use observer::{CommitEvent, CommitMetrics, CommitMetricsSnapshot, CommitObserver, TracingCommitObserver};
pub use summary::{BatchStatus, BatchSummary, SubmissionFailure, SummaryReport};

/// The remote "create one record" operation.
#[async_trait]
pub trait CreateOperation<T: Sync>: Send + Sync {
    async fn create(&self, record: &T) -> Result<(), SubmissionError>;
}

/// Configuration for the [`BatchCommitExecutor`].
#[derive(Clone)]
pub struct CommitOptions {
    /// Upper bound on a single create call. Exceeding it fails that item only.
    pub item_timeout: Option<Duration>,
    /// Failures enumerated in a report before collapsing to "first + N more".
    pub max_listed_failures: usize,
    /// Optional observer for commit events.
    pub observer: Option<Arc<dyn CommitObserver>>,
}

impl Default for CommitOptions {
    fn default() -> Self {
        Self {
            item_timeout: None,
            max_listed_failures: 3,
            observer: None,
        }
    }
}

impl fmt::Debug for CommitOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommitOptions")
            .field("item_timeout", &self.item_timeout)
            .field("max_listed_failures", &self.max_listed_failures)
            .field("observer_set", &self.observer.is_some())
            .finish()
    }
}

/// Submits validated records one at a time and tallies the outcome.
pub struct BatchCommitExecutor {
    opts: CommitOptions,
    metrics: Arc<CommitMetrics>,
    progress: watch::Sender<f64>,
    // Serializes runs on a shared executor.
    gate: Mutex<()>,
}

impl BatchCommitExecutor {
    pub fn new(opts: CommitOptions) -> Self {
        let (progress, _) = watch::channel(0.0);
        Self {
            opts,
            metrics: Arc::new(CommitMetrics::new()),
            progress,
            gate: Mutex::new(()),
        }
    }

    pub fn options(&self) -> &CommitOptions {
        &self.opts
    }

    /// Get a handle to real-time commit metrics.
    pub fn metrics(&self) -> Arc<CommitMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Subscribe to progress updates (percentage, 0-100).
    pub fn subscribe_progress(&self) -> watch::Receiver<f64> {
        self.progress.subscribe()
    }

    /// Latest published progress.
    pub fn progress(&self) -> f64 {
        *self.progress.borrow()
    }

    /// Reset progress to zero.
    pub fn reset_progress(&self) {
        self.progress.send_replace(0.0);
    }

    /// Submit every entity in order and return the tally.
    ///
    /// Each call awaits the previous item's outcome before starting the next. Progress is
    /// `(attempted / total) * 100`, published after every attempt regardless of outcome.
    pub async fn run<T, C>(&self, entities: &[ValidatedEntity<T>], op: &C) -> BatchSummary
    where
        T: ImportRecord + Sync,
        C: CreateOperation<T> + ?Sized,
    {
        let _guard = self.gate.lock().await;
        let start = Instant::now();
        let total = entities.len();

        self.metrics.begin_run();
        self.progress.send_replace(0.0);
        self.emit(CommitEvent::RunStarted { total });

        let mut summary = BatchSummary::default();
        for (index, entity) in entities.iter().enumerate() {
            self.emit(CommitEvent::ItemStarted {
                index,
                row: entity.position,
            });
            self.metrics.on_item_start();

            let outcome = self.submit(op, &entity.record).await;
            let succeeded = outcome.is_ok();
            self.metrics.on_item_end(succeeded);

            match outcome {
                Ok(()) => {
                    debug!(row = entity.position, "record created");
                    summary.succeeded += 1;
                }
                Err(e) => {
                    let label = entity.record.label();
                    warn!(row = entity.position, %label, err = %e, "record rejected");
                    summary.failed += 1;
                    summary.failures.push(SubmissionFailure {
                        position: entity.position,
                        label,
                        reason: e.to_string(),
                    });
                }
            }

            let progress = progress_percent(index + 1, total);
            self.progress.send_replace(progress);
            self.emit(CommitEvent::ItemFinished {
                index,
                row: entity.position,
                succeeded,
                progress,
            });
        }

        let elapsed = start.elapsed();
        self.metrics.end_run(elapsed);
        self.emit(CommitEvent::RunFinished {
            elapsed,
            metrics: self.metrics.snapshot(),
        });
        info!(
            total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            ?elapsed,
            "batch commit finished"
        );

        summary
    }

    async fn submit<T, C>(&self, op: &C, record: &T) -> Result<(), SubmissionError>
    where
        T: Sync,
        C: CreateOperation<T> + ?Sized,
    {
        match self.opts.item_timeout {
            Some(after) => tokio::time::timeout(after, op.create(record))
                .await
                .unwrap_or(Err(SubmissionError::TimedOut { after })),
            None => op.create(record).await,
        }
    }

    fn emit(&self, event: CommitEvent) {
        if let Some(obs) = &self.opts.observer {
            obs.on_event(&event);
        }
    }
}

impl Default for BatchCommitExecutor {
    fn default() -> Self {
        Self::new(CommitOptions::default())
    }
}

fn progress_percent(done: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    done as f64 / total as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::types::ResolvedFields;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Item(String);

    impl ImportRecord for Item {
        fn from_fields(mut fields: ResolvedFields) -> Self {
            Item(fields.take("id"))
        }

        fn label(&self) -> String {
            self.0.clone()
        }
    }

    fn entities(n: usize) -> Vec<ValidatedEntity<Item>> {
        (0..n)
            .map(|i| ValidatedEntity {
                position: i * 2,
                record: Item(format!("item-{i}")),
            })
            .collect()
    }

    /// Fails the listed labels; records the order of calls and in-flight concurrency.
    #[derive(Default)]
    struct ScriptedCreate {
        fail: Vec<String>,
        calls: StdMutex<Vec<String>>,
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    #[async_trait]
    impl CreateOperation<Item> for ScriptedCreate {
        async fn create(&self, record: &Item) -> Result<(), SubmissionError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.calls.lock().unwrap().push(record.0.clone());
            self.active.fetch_sub(1, Ordering::SeqCst);

            if self.fail.contains(&record.0) {
                Err(SubmissionError::rejected("duplicate email"))
            } else {
                Ok(())
            }
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        events: StdMutex<Vec<CommitEvent>>,
    }

    impl CommitObserver for RecordingObserver {
        fn on_event(&self, event: &CommitEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    #[tokio::test]
    async fn submits_in_order_one_at_a_time() {
        let op = ScriptedCreate::default();
        let executor = BatchCommitExecutor::default();
        let summary = executor.run(&entities(5), &op).await;

        assert_eq!(summary.succeeded, 5);
        assert_eq!(summary.failed, 0);
        assert_eq!(
            *op.calls.lock().unwrap(),
            (0..5).map(|i| format!("item-{i}")).collect::<Vec<_>>()
        );
        assert_eq!(op.max_active.load(Ordering::SeqCst), 1);

        let snap = executor.metrics().snapshot();
        assert_eq!(snap.attempted, 5);
        assert_eq!(snap.max_in_flight, 1);
        assert_eq!(snap.in_flight, 0);
    }

    #[tokio::test]
    async fn failures_do_not_stop_the_batch() {
        let op = ScriptedCreate {
            fail: vec!["item-1".to_string(), "item-3".to_string()],
            ..Default::default()
        };
        let executor = BatchCommitExecutor::default();
        let summary = executor.run(&entities(5), &op).await;

        assert_eq!(summary.succeeded, 3);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.total(), 5);
        assert_eq!(
            summary.failures[0],
            SubmissionFailure {
                position: 2,
                label: "item-1".to_string(),
                reason: "duplicate email".to_string(),
            }
        );
        assert_eq!(summary.failures[1].position, 6);
        assert_eq!(op.calls.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn progress_is_monotonic_and_reaches_100() {
        let observer = Arc::new(RecordingObserver::default());
        let obs_trait: Arc<dyn CommitObserver> = observer.clone();
        let executor = BatchCommitExecutor::new(CommitOptions {
            observer: Some(obs_trait),
            ..Default::default()
        });
        let op = ScriptedCreate {
            fail: vec!["item-0".to_string(), "item-2".to_string()],
            ..Default::default()
        };
        let rx = executor.subscribe_progress();

        executor.run(&entities(3), &op).await;

        let progress: Vec<f64> = observer
            .events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                CommitEvent::ItemFinished { progress, .. } => Some(*progress),
                _ => None,
            })
            .collect();
        assert_eq!(progress.len(), 3);
        assert!(progress.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(progress.last().copied(), Some(100.0));
        assert_eq!(*rx.borrow(), 100.0);
        assert_eq!(executor.progress(), 100.0);
    }

    #[tokio::test]
    async fn observer_sees_run_boundaries() {
        let observer = Arc::new(RecordingObserver::default());
        let obs_trait: Arc<dyn CommitObserver> = observer.clone();
        let executor = BatchCommitExecutor::new(CommitOptions {
            observer: Some(obs_trait),
            ..Default::default()
        });
        executor.run(&entities(2), &ScriptedCreate::default()).await;

        let events = observer.events.lock().unwrap();
        assert_eq!(events.first(), Some(&CommitEvent::RunStarted { total: 2 }));
        assert!(matches!(events.last(), Some(CommitEvent::RunFinished { metrics, .. }) if metrics.succeeded == 2));
        assert_eq!(events.len(), 2 + 2 * 2);
    }

    struct Stalls;

    #[async_trait]
    impl CreateOperation<Item> for Stalls {
        async fn create(&self, record: &Item) -> Result<(), SubmissionError> {
            if record.0 == "item-1" {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_fails_only_the_slow_item() {
        let executor = BatchCommitExecutor::new(CommitOptions {
            item_timeout: Some(Duration::from_secs(5)),
            ..Default::default()
        });
        let summary = executor.run(&entities(3), &Stalls).await;

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failures[0].label, "item-1");
        assert_eq!(summary.failures[0].reason, "timed out after 5s");
    }

    #[tokio::test]
    async fn empty_batch_is_a_trivial_success() {
        let executor = BatchCommitExecutor::default();
        let summary = executor.run::<Item, _>(&[], &ScriptedCreate::default()).await;
        assert_eq!(summary, BatchSummary::default());
        assert_eq!(summary.status(), BatchStatus::Success);
    }
}
