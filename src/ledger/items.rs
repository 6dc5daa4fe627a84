//! Work item queries and completion updates.

use crate::error::LedgerError;
use crate::types::{ItemId, WorkItem};
use crate::{Error, Result};

use super::{NewItem, SqliteLedger};

/// SQLite default SQLITE_MAX_VARIABLE_NUMBER is 999; one bind per id plus the timestamp.
const MAX_IDS_PER_UPDATE: usize = 900;

impl SqliteLedger {
    /// Insert items that are not yet in the ledger, skipping names already present.
    ///
    /// Populating the ledger from the remote listing happens outside this crate; this is
    /// the entry point such tooling (and the tests) use. Returns the number of rows added.
    pub async fn insert_items(&self, items: &[NewItem]) -> Result<u64> {
        if items.is_empty() {
            return Ok(0);
        }

        const MAX_ITEMS_PER_BATCH: usize = 900;

        let mut tx = self.pool.begin().await.map_err(|e| {
            Error::Ledger(LedgerError::ConnectionFailed(format!(
                "Failed to begin transaction: {}",
                e
            )))
        })?;

        let mut inserted = 0;
        for chunk in items.chunks(MAX_ITEMS_PER_BATCH) {
            let mut query_builder = sqlx::QueryBuilder::new("INSERT OR IGNORE INTO files (name) ");
            query_builder.push_values(chunk, |mut b, item| {
                b.push_bind(&item.name);
            });

            let result = query_builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    Error::Ledger(LedgerError::QueryFailed(format!(
                        "Failed to insert items: {}",
                        e
                    )))
                })?;
            inserted += result.rows_affected();
        }

        tx.commit().await.map_err(|e| {
            Error::Ledger(LedgerError::QueryFailed(format!(
                "Failed to commit item insert: {}",
                e
            )))
        })?;

        Ok(inserted)
    }

    /// Get up to `limit` pending items, lowest id first
    pub async fn get_pending_items(&self, limit: usize) -> Result<Vec<WorkItem>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = sqlx::query_as::<_, WorkItem>(
            r#"
            SELECT id, name, downloaded
            FROM files
            WHERE downloaded = 0
            ORDER BY id ASC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Ledger(LedgerError::QueryFailed(format!(
                "Failed to get pending items: {}",
                e
            )))
        })?;

        Ok(rows)
    }

    /// Get a single item by id
    pub async fn get_item(&self, id: ItemId) -> Result<Option<WorkItem>> {
        let row = sqlx::query_as::<_, WorkItem>(
            "SELECT id, name, downloaded FROM files WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Ledger(LedgerError::QueryFailed(format!(
                "Failed to get item: {}",
                e
            )))
        })?;

        Ok(row)
    }

    /// Mark items as downloaded in a single transaction
    ///
    /// Only rows still pending are touched, so the flag never moves backwards and
    /// `downloaded_at` keeps the time of the first successful transfer. Either every
    /// chunk is applied or none is.
    pub async fn mark_items_downloaded(&self, ids: &[ItemId]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let now = chrono::Utc::now().timestamp();

        let mut tx = self.pool.begin().await.map_err(|e| {
            Error::Ledger(LedgerError::ConnectionFailed(format!(
                "Failed to begin transaction: {}",
                e
            )))
        })?;

        let mut updated = 0;
        for chunk in ids.chunks(MAX_IDS_PER_UPDATE) {
            let mut query_builder =
                sqlx::QueryBuilder::new("UPDATE files SET downloaded = 1, downloaded_at = ");
            query_builder.push_bind(now);
            query_builder.push(" WHERE downloaded = 0 AND id IN (");
            let mut separated = query_builder.separated(", ");
            for id in chunk {
                separated.push_bind(*id);
            }
            separated.push_unseparated(")");

            let result = query_builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    Error::Ledger(LedgerError::QueryFailed(format!(
                        "Failed to mark items downloaded: {}",
                        e
                    )))
                })?;
            updated += result.rows_affected();
        }

        // Dropping `tx` on an error path above rolls the whole batch back
        tx.commit().await.map_err(|e| {
            Error::Ledger(LedgerError::QueryFailed(format!(
                "Failed to commit completion update: {}",
                e
            )))
        })?;

        Ok(updated)
    }

    /// Count items already downloaded
    pub async fn count_downloaded(&self) -> Result<u64> {
        self.count_by_flag(true).await
    }

    /// Count items still pending
    pub async fn count_pending(&self) -> Result<u64> {
        self.count_by_flag(false).await
    }

    async fn count_by_flag(&self, downloaded: bool) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files WHERE downloaded = ?")
            .bind(downloaded)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                Error::Ledger(LedgerError::QueryFailed(format!(
                    "Failed to count items: {}",
                    e
                )))
            })?;

        Ok(count.max(0) as u64)
    }
}
