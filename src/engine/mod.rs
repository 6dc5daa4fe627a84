//! Resumable batch-transfer engine
//!
//! One cycle pulls a batch of pending items from the ledger, transfers them concurrently,
//! commits the successes, and reports progress. Cycles repeat until the ledger has nothing
//! pending. The phases never overlap: the pool drains the whole batch before anything is
//! committed, and progress is reported only after the commit.
//!
//! ## Submodules
//!
//! - [`loader`]: pulls the next batch of pending items
//! - [`pool`]: bounded-concurrency transfer of one batch
//! - [`committer`]: writes successful outcomes back to the ledger
//! - [`progress`]: run counters, throughput, and progress notifications
//! - [`orchestrator`]: the cycle loop and its state machine

use std::sync::Arc;

use crate::config::Config;
use crate::fetcher::RemoteFetcher;
use crate::ledger::Ledger;
use crate::notifier::Notifier;
use crate::types::RunState;

pub mod committer;
pub mod loader;
pub mod orchestrator;
pub mod pool;
pub mod progress;

pub use committer::StatusCommitter;
pub use loader::BatchLoader;
pub use pool::WorkerPool;
pub use progress::{ProgressReporter, RunCounters, throughput};

/// Drives load → transfer → commit → report cycles until the ledger is exhausted
pub struct TransferEngine {
    loader: BatchLoader,
    pool: WorkerPool,
    committer: StatusCommitter,
    ledger: Arc<dyn Ledger>,
    notifier: Arc<dyn Notifier>,
    batch_size: usize,
    baseline_correction: u64,
    state: RunState,
}

impl TransferEngine {
    /// Wire the engine to its collaborators
    pub fn new(
        config: &Config,
        ledger: Arc<dyn Ledger>,
        fetcher: Arc<dyn RemoteFetcher>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            loader: BatchLoader::new(Arc::clone(&ledger)),
            pool: WorkerPool::new(fetcher, config.transfer.concurrency, config.retry.clone()),
            committer: StatusCommitter::new(Arc::clone(&ledger)),
            ledger,
            notifier,
            batch_size: config.transfer.batch_size.max(1),
            baseline_correction: config.report.baseline_correction,
            state: RunState::Running,
        }
    }

    /// Current state of the engine
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Items requested from the ledger per cycle
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
