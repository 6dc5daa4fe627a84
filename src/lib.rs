//! # ledger-dl
//!
//! Resumable batch transfer of remote files driven by a persistent ledger.
//!
//! The ledger records every item to transfer and whether it has completed. The engine pulls
//! pending items in bounded batches, fetches each batch with bounded concurrency, marks the
//! successes complete in one atomic write, and reports progress. A killed run loses at most
//! the batch in flight; restarting resumes from whatever the ledger still shows as pending.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use ledger_dl::{Config, GraphFetcher, SqliteLedger, TransferEngine, notifier};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!
//!     let ledger = SqliteLedger::new(&config.ledger.database_path).await?;
//!     let fetcher = GraphFetcher::new(&config.remote, &config.transfer.destination)?;
//!     let notifier = notifier::from_config(&config.notifications)?;
//!
//!     let mut engine = TransferEngine::new(
//!         &config,
//!         Arc::new(ledger),
//!         Arc::new(fetcher),
//!         Arc::from(notifier),
//!     );
//!     let summary = engine.run().await?;
//!     println!("{} files downloaded", summary.completed);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Batch cycle engine
pub mod engine;
/// Error types
pub mod error;
/// Remote file access
pub mod fetcher;
/// Persistent ledger of items
pub mod ledger;
/// Console and log-file output
pub mod logging;
/// Progress notification sinks
pub mod notifier;
/// Retry logic with exponential backoff
pub mod retry;
/// Core types
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use engine::TransferEngine;
pub use error::{Error, FetchError, LedgerError, NotifyError, Result};
pub use fetcher::{GraphFetcher, RemoteFetcher};
pub use ledger::{Ledger, NewItem, SqliteLedger};
pub use notifier::{NoopNotifier, Notifier, WebhookNotifier};
pub use types::{ItemId, RunState, RunSummary, TransferOutcome, WorkItem};
