//! Core types for ledger-dl

use sqlx::FromRow;
use std::time::Duration;

/// Unique identifier for a work item, assigned by the ledger
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(pub i64);

impl ItemId {
    /// Create a new ItemId
    pub fn new(id: i64) -> Self {
        Self(id)
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<ItemId> for i64 {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Implement sqlx Type, Encode, and Decode for database operations
impl sqlx::Type<sqlx::Sqlite> for ItemId {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <i64 as sqlx::Type<sqlx::Sqlite>>::type_info()
    }

    fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
        <i64 as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for ItemId {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        sqlx::Encode::<sqlx::Sqlite>::encode_by_ref(&self.0, buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for ItemId {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let id = <i64 as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        Ok(Self(id))
    }
}

/// One remote file to transfer
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct WorkItem {
    /// Ledger-assigned identifier, stable for the item's lifetime
    pub id: ItemId,
    /// Remote path relative to the remote root; also the local file name
    pub name: String,
    /// Whether the item has been transferred successfully
    pub downloaded: bool,
}

impl WorkItem {
    /// A pending item
    pub fn pending(id: impl Into<ItemId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            downloaded: false,
        }
    }
}

/// Result of one transfer attempt
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    /// Item the attempt was for
    pub id: ItemId,
    /// Item name, kept for logging
    pub name: String,
    /// Whether the content was retrieved and written locally
    pub success: bool,
    /// Error message if the attempt failed
    pub error: Option<String>,
}

impl TransferOutcome {
    /// Successful outcome for `item`
    pub fn succeeded(item: &WorkItem) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            success: true,
            error: None,
        }
    }

    /// Failed outcome for `item`
    pub fn failed(item: &WorkItem, error: impl Into<String>) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Orchestrator state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    /// Cycling through batches
    Running,
    /// The ledger has no pending items left
    Done,
    /// A ledger error ended the run
    Failed,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunState::Running => "running",
            RunState::Done => "done",
            RunState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Totals for one completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Terminal state reached
    pub state: RunState,
    /// Number of non-empty batches processed
    pub cycles: u64,
    /// Items dispatched to the worker pool
    pub processed: u64,
    /// Items newly marked complete in the ledger
    pub completed: u64,
    /// Items whose transfer failed (left pending)
    pub failed: u64,
    /// Wall time of the run
    pub elapsed: Duration,
}
