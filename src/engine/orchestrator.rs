//! The cycle loop.
//!
//! ```text
//!             load ≥ 1 item
//!            ┌──────────────┐
//!            ▼              │
//!  start ─▶ Running ────────┘
//!            │   │
//!   load = 0 │   │ ledger error
//!            ▼   ▼
//!          Done  Failed
//! ```

use crate::Result;
use crate::types::{RunState, RunSummary};

use super::TransferEngine;
use super::progress::{ProgressReporter, RunCounters};

impl TransferEngine {
    /// Run cycles until the ledger has no pending items.
    ///
    /// Returns the run totals on reaching [`RunState::Done`]. Any ledger error (the
    /// baseline count, a load, or a commit) moves the engine to [`RunState::Failed`] and is
    /// returned; batches committed before the error stay committed. Item transfer failures
    /// never end the run.
    pub async fn run(&mut self) -> Result<RunSummary> {
        self.state = RunState::Running;
        let result = self.run_cycles().await;

        match &result {
            Ok(summary) => {
                self.state = RunState::Done;
                tracing::info!(
                    cycles = summary.cycles,
                    processed = summary.processed,
                    completed = summary.completed,
                    failed = summary.failed,
                    elapsed_secs = summary.elapsed.as_secs(),
                    "No more files to download. Exiting."
                );
            }
            Err(e) => {
                self.state = RunState::Failed;
                tracing::error!(error = %e, "transfer run failed");
            }
        }

        result
    }

    async fn run_cycles(&mut self) -> Result<RunSummary> {
        tracing::info!("counting files downloaded");
        let completed_before_run = self.ledger.count_completed().await?;
        let reporter = ProgressReporter::new(
            self.notifier.clone(),
            completed_before_run,
            self.baseline_correction,
        );
        tracing::info!(
            completed = completed_before_run,
            baseline = reporter.baseline(),
            "starting transfer run"
        );

        let mut counters = RunCounters::start();

        loop {
            let batch = self.loader.load(self.batch_size).await?;
            if batch.is_empty() {
                break;
            }

            let batch_len = batch.len() as u64;
            let outcomes = self.pool.execute(batch).await;
            let failed = outcomes.iter().filter(|outcome| !outcome.success).count() as u64;

            let completed = self.committer.commit(&outcomes).await?;

            counters.record_cycle(batch_len, completed, failed);
            reporter
                .report(counters.cycles, counters.completed, counters.elapsed())
                .await;
        }

        Ok(RunSummary {
            state: RunState::Done,
            cycles: counters.cycles,
            processed: counters.processed,
            completed: counters.completed,
            failed: counters.failed,
            elapsed: counters.elapsed(),
        })
    }
}
