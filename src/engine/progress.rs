//! Run counters, throughput, and progress notifications.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::notifier::Notifier;

/// Process-local totals for the current run; never persisted
#[derive(Debug, Clone)]
pub struct RunCounters {
    started: Instant,
    /// Non-empty batches processed
    pub cycles: u64,
    /// Items handed to the worker pool
    pub processed: u64,
    /// Items newly marked complete in the ledger
    pub completed: u64,
    /// Items whose transfer failed
    pub failed: u64,
}

impl RunCounters {
    /// Start counting from now
    pub fn start() -> Self {
        Self::started_at(Instant::now())
    }

    /// Start counting from `started`
    pub fn started_at(started: Instant) -> Self {
        Self {
            started,
            cycles: 0,
            processed: 0,
            completed: 0,
            failed: 0,
        }
    }

    /// Fold one committed batch into the totals
    pub fn record_cycle(&mut self, processed: u64, completed: u64, failed: u64) {
        self.cycles += 1;
        self.processed += processed;
        self.completed += completed;
        self.failed += failed;
    }

    /// Time since the run started
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Items per second, truncated to an integer; zero before any time has passed
pub fn throughput(items: u64, elapsed: Duration) -> u64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0;
    }
    (items as f64 / secs) as u64
}

/// Builds and dispatches the per-batch progress message
pub struct ProgressReporter {
    notifier: Arc<dyn Notifier>,
    baseline: u64,
}

impl ProgressReporter {
    /// `completed_before_run` is the ledger's completed count at startup; `correction` is
    /// subtracted from it for display only.
    pub fn new(notifier: Arc<dyn Notifier>, completed_before_run: u64, correction: u64) -> Self {
        Self {
            notifier,
            baseline: completed_before_run.saturating_sub(correction),
        }
    }

    /// Completed count shown before any item of this run is counted
    pub fn baseline(&self) -> u64 {
        self.baseline
    }

    /// Format the progress line for `cumulative` items done this run after `elapsed`
    pub fn message(&self, cumulative: u64, elapsed: Duration) -> String {
        format!(
            "downloaded {} files @ {} files/sec",
            self.baseline + cumulative,
            throughput(cumulative, elapsed)
        )
    }

    /// Log the progress line and send it to the notifier.
    ///
    /// Delivery is best-effort; the notifier's result is discarded.
    pub async fn report(&self, cycle_count: u64, cumulative: u64, elapsed: Duration) -> String {
        let message = self.message(cumulative, elapsed);
        tracing::info!(
            cycle = cycle_count,
            total = self.baseline + cumulative,
            rate = throughput(cumulative, elapsed),
            "{}",
            message
        );

        let _ = self.notifier.send(&message).await;

        message
    }
}
