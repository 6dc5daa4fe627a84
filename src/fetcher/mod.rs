//! Remote file retrieval
//!
//! [`RemoteFetcher`] is the seam between the engine and whatever storage provider holds the
//! files. [`GraphFetcher`] talks to a drive API that serves content by path.

use crate::error::FetchError;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

mod graph;

pub use graph::{GraphFetcher, STAGING_PREFIX};

/// Retrieves one remote item into the local destination root.
///
/// Implementations are assumed to be authenticated already. A successful return means the
/// content is fully written under its final name; writing the same item twice must simply
/// replace the earlier copy.
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    /// Fetch `remote_path` and return where it was written.
    async fn fetch(&self, remote_path: &str) -> Result<PathBuf, FetchError>;
}

/// Map an item name to its path under `root`, refusing names that would leave it.
pub fn local_path(root: &Path, name: &str) -> Result<PathBuf, FetchError> {
    let relative = Path::new(name.trim_start_matches('/'));

    let mut has_file = false;
    for component in relative.components() {
        match component {
            Component::Normal(_) => has_file = true,
            Component::CurDir => {}
            _ => return Err(FetchError::InvalidName(name.to_string())),
        }
    }
    if !has_file || name.ends_with('/') {
        return Err(FetchError::InvalidName(name.to_string()));
    }

    Ok(root.join(relative))
}
