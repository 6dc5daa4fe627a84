//! Batch loading from the ledger.

use std::collections::HashSet;
use std::sync::Arc;

use crate::Result;
use crate::ledger::Ledger;
use crate::types::WorkItem;

/// Pulls the next bounded batch of pending items
pub struct BatchLoader {
    ledger: Arc<dyn Ledger>,
}

impl BatchLoader {
    /// Create a loader reading from `ledger`
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self { ledger }
    }

    /// Load up to `batch_size` pending items.
    ///
    /// An empty batch means the ledger has nothing left and is the only way this returns
    /// "no work"; a ledger failure is returned as an error. Items the ledger repeats within
    /// one answer are dropped so each id appears once per batch.
    pub async fn load(&self, batch_size: usize) -> Result<Vec<WorkItem>> {
        tracing::info!(batch_size, "fetching pending items");

        let items = self.ledger.query_pending(batch_size).await?;

        let mut seen = HashSet::with_capacity(items.len());
        let total = items.len();
        let mut batch: Vec<WorkItem> = items
            .into_iter()
            .filter(|item| !item.downloaded && seen.insert(item.id))
            .collect();
        batch.truncate(batch_size);

        if batch.len() != total {
            tracing::warn!(
                returned = total,
                kept = batch.len(),
                "dropped items from the ledger's answer"
            );
        }

        Ok(batch)
    }
}
