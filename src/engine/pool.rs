//! Bounded-concurrency transfer of one batch.

use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::config::RetryConfig;
use crate::fetcher::RemoteFetcher;
use crate::retry::with_retry;
use crate::types::{TransferOutcome, WorkItem};

/// Runs fetches for a batch with at most `concurrency` in flight
///
/// Each item is transferred on its own task, so an error or even a panic in one transfer
/// only turns that item's outcome into a failure.
pub struct WorkerPool {
    fetcher: Arc<dyn RemoteFetcher>,
    concurrency: usize,
    retry: RetryConfig,
}

impl WorkerPool {
    /// Create a pool over `fetcher`
    pub fn new(fetcher: Arc<dyn RemoteFetcher>, concurrency: usize, retry: RetryConfig) -> Self {
        Self {
            fetcher,
            concurrency: concurrency.max(1),
            retry,
        }
    }

    /// Maximum transfers in flight
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Transfer every item in `batch` and return one outcome per item.
    ///
    /// Returns only once every transfer has finished. Outcomes come back in completion
    /// order, not batch order.
    pub async fn execute(&self, batch: Vec<WorkItem>) -> Vec<TransferOutcome> {
        tracing::info!(
            items = batch.len(),
            concurrency = self.concurrency,
            "running transfer pool"
        );

        stream::iter(batch)
            .map(|item| {
                let fetcher = Arc::clone(&self.fetcher);
                let retry = self.retry.clone();

                async move {
                    let handle = tokio::spawn(transfer_one(fetcher, retry, item.clone()));

                    match handle.await {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            tracing::error!(
                                item_id = item.id.0,
                                name = %item.name,
                                error = %e,
                                "transfer task aborted"
                            );
                            TransferOutcome::failed(&item, format!("transfer task aborted: {e}"))
                        }
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await
    }
}

async fn transfer_one(
    fetcher: Arc<dyn RemoteFetcher>,
    retry: RetryConfig,
    item: WorkItem,
) -> TransferOutcome {
    tracing::info!(item_id = item.id.0, name = %item.name, "downloading");

    match with_retry(&retry, || fetcher.fetch(&item.name)).await {
        Ok(path) => {
            tracing::info!(
                item_id = item.id.0,
                name = %item.name,
                path = %path.display(),
                "downloaded"
            );
            TransferOutcome::succeeded(&item)
        }
        Err(e) => {
            tracing::error!(
                item_id = item.id.0,
                name = %item.name,
                error = %e,
                "failed to download"
            );
            TransferOutcome::failed(&item, e.to_string())
        }
    }
}
