//! Path-addressed drive API client (Microsoft Graph style).

use async_trait::async_trait;
use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

use super::{RemoteFetcher, local_path};
use crate::Result;
use crate::config::RemoteConfig;
use crate::error::FetchError;

/// Prefix of the staging files bodies are streamed into
pub const STAGING_PREFIX: &str = ".ledger-dl-";

/// Downloads items with `GET {api_base}/me/drive/root:{remote_root}/{name}:/content`.
///
/// The response body is streamed to a uniquely named staging file in the target's directory
/// and renamed into place once complete. Staging files are created exclusively, so they
/// never replace another item's file, and an interrupted transfer never leaves a truncated
/// file under the final name. A repeated transfer replaces the earlier copy.
///
/// `request_timeout` bounds each wait (connecting, the response head, every body chunk)
/// rather than the whole transfer, so large files are only cut off when they stall.
pub struct GraphFetcher {
    client: reqwest::Client,
    api_base: String,
    access_token: String,
    remote_root: String,
    destination: PathBuf,
    stall_timeout: Duration,
}

impl GraphFetcher {
    /// Build a fetcher writing into `destination`
    pub fn new(remote: &RemoteConfig, destination: impl Into<PathBuf>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(remote.request_timeout)
            .build()?;

        Ok(Self {
            client,
            api_base: remote.api_base.as_str().trim_end_matches('/').to_string(),
            access_token: remote.access_token.clone(),
            remote_root: remote.remote_root.clone(),
            destination: destination.into(),
            stall_timeout: remote.request_timeout,
        })
    }

    /// Local root items are written into
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Content URL for an item name
    pub fn content_url(&self, name: &str) -> String {
        let encoded: Vec<String> = self
            .remote_root
            .split('/')
            .chain(name.split('/'))
            .filter(|segment| !segment.is_empty())
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();

        format!(
            "{}/me/drive/root:/{}:/content",
            self.api_base,
            encoded.join("/")
        )
    }

    fn stalled(&self, remote_path: &str) -> FetchError {
        FetchError::Stalled {
            path: remote_path.to_string(),
            after: self.stall_timeout,
        }
    }

    /// Stream the body into a staging file next to `target`, then move it into place
    async fn write_body(
        &self,
        mut response: reqwest::Response,
        remote_path: &str,
        target: &Path,
    ) -> std::result::Result<(), FetchError> {
        let parent = target.parent().unwrap_or(&self.destination);
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .suffix(".tmp")
            .tempfile_in(parent)
            .map_err(|source| FetchError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        // Dropping `staging_path` on any early return removes the staging file
        let (file, staging_path) = staging.into_parts();

        let io_err = |source| FetchError::Io {
            path: staging_path.to_path_buf(),
            source,
        };

        let mut file = tokio::fs::File::from_std(file);
        loop {
            let chunk = tokio::time::timeout(self.stall_timeout, response.chunk())
                .await
                .map_err(|_| self.stalled(remote_path))??;
            let Some(chunk) = chunk else {
                break;
            };
            file.write_all(&chunk).await.map_err(io_err)?;
        }
        file.flush().await.map_err(io_err)?;
        file.sync_all().await.map_err(io_err)?;
        drop(file);

        staging_path
            .persist(target)
            .map_err(|e| FetchError::Io {
                path: target.to_path_buf(),
                source: e.into(),
            })?;

        Ok(())
    }
}

#[async_trait]
impl RemoteFetcher for GraphFetcher {
    async fn fetch(&self, remote_path: &str) -> std::result::Result<PathBuf, FetchError> {
        let target = local_path(&self.destination, remote_path)?;

        let request = self
            .client
            .get(self.content_url(remote_path))
            .bearer_auth(&self.access_token)
            .send();
        let response = tokio::time::timeout(self.stall_timeout, request)
            .await
            .map_err(|_| self.stalled(remote_path))??;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => return Err(FetchError::NotFound(remote_path.to_string())),
            status => {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    path: remote_path.to_string(),
                });
            }
        }

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| FetchError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        self.write_body(response, remote_path, &target).await?;

        tracing::debug!(name = remote_path, path = %target.display(), "item written");
        Ok(target)
    }
}
