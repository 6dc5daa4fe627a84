//! Writing batch outcomes back to the ledger.

use std::sync::Arc;

use crate::Result;
use crate::ledger::Ledger;
use crate::types::{ItemId, TransferOutcome};

/// Marks successful transfers complete; failures are left pending for a later batch
pub struct StatusCommitter {
    ledger: Arc<dyn Ledger>,
}

impl StatusCommitter {
    /// Create a committer writing to `ledger`
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self { ledger }
    }

    /// Commit `outcomes` and return how many items became complete.
    ///
    /// Failed outcomes cause no ledger write; the item stays pending and the loader will
    /// offer it again. The successful ids go to the ledger in one call, which applies them
    /// as a unit. An error here means none of this batch's updates can be assumed to have
    /// persisted.
    pub async fn commit(&self, outcomes: &[TransferOutcome]) -> Result<u64> {
        let succeeded: Vec<ItemId> = outcomes
            .iter()
            .filter(|outcome| outcome.success)
            .map(|outcome| outcome.id)
            .collect();
        let failed = outcomes.len() - succeeded.len();

        tracing::info!(
            succeeded = succeeded.len(),
            failed,
            "updating status"
        );

        if succeeded.is_empty() {
            return Ok(0);
        }

        let marked = self.ledger.mark_complete(&succeeded).await?;

        if marked < succeeded.len() as u64 {
            tracing::debug!(
                succeeded = succeeded.len(),
                marked,
                "some items were already complete"
            );
        }

        Ok(marked)
    }
}
