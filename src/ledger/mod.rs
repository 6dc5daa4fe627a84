//! Persistent completion ledger
//!
//! The engine talks to the ledger only through the [`Ledger`] trait. [`SqliteLedger`] is the
//! bundled implementation, backed by a single `files` table.
//!
//! ## Submodules
//!
//! Methods on [`SqliteLedger`] are organized by concern:
//! - `migrations`: database lifecycle, schema migrations
//! - `items`: work item queries and completion updates

use crate::Result;
use crate::types::{ItemId, WorkItem};
use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;

mod items;
mod migrations;

/// Durable record of which work items are complete.
///
/// Implementations must give read-your-writes consistency within a process: an item
/// passed to [`mark_complete`](Ledger::mark_complete) must not be returned by a later
/// [`query_pending`](Ledger::query_pending).
///
/// Two engines running against the same ledger at once is unsupported; nothing claims
/// items, so both would transfer the same pending rows.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Up to `limit` items whose completion flag is still false, without duplicates.
    async fn query_pending(&self, limit: usize) -> Result<Vec<WorkItem>>;

    /// Flip the completion flag of every listed item to true, as one unit.
    ///
    /// Returns how many items changed from pending to complete. Already-complete ids are
    /// left as they are.
    async fn mark_complete(&self, ids: &[ItemId]) -> Result<u64>;

    /// Number of items whose completion flag is true.
    async fn count_completed(&self) -> Result<u64>;
}

/// New work item to be inserted into the ledger
#[derive(Debug, Clone)]
pub struct NewItem {
    /// Remote path relative to the remote root
    pub name: String,
}

impl NewItem {
    /// Create a new item from its remote name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// SQLite-backed ledger
pub struct SqliteLedger {
    pool: SqlitePool,
}

#[async_trait]
impl Ledger for SqliteLedger {
    async fn query_pending(&self, limit: usize) -> Result<Vec<WorkItem>> {
        self.get_pending_items(limit).await
    }

    async fn mark_complete(&self, ids: &[ItemId]) -> Result<u64> {
        self.mark_items_downloaded(ids).await
    }

    async fn count_completed(&self) -> Result<u64> {
        self.count_downloaded().await
    }
}
