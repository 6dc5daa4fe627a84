//! Shared fixtures for the end-to-end transfer tests

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use ledger_dl::config::RemoteConfig;
use ledger_dl::{
    Config, GraphFetcher, NewItem, Notifier, SqliteLedger, TransferEngine, WebhookNotifier,
};
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Body served for every item the mock drive knows about
pub const ITEM_BODY: &str = "{\"payload\":\"ok\"}";

/// Remote root the fixtures read from
pub const REMOTE_ROOT: &str = "/exports";

/// Temporary database and destination directory for one test
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn database(&self) -> std::path::PathBuf {
        self.dir.path().join("ledger.db")
    }

    pub fn destination(&self) -> std::path::PathBuf {
        self.dir.path().join("downloads")
    }

    /// Open the ledger, inserting `names` as pending items
    pub async fn seed(&self, names: &[String]) -> SqliteLedger {
        let ledger = SqliteLedger::new(&self.database()).await.unwrap();
        let items: Vec<NewItem> = names.iter().map(NewItem::new).collect();
        ledger.insert_items(&items).await.unwrap();
        ledger
    }

    /// Reopen the existing ledger file
    pub async fn reopen(&self) -> SqliteLedger {
        SqliteLedger::new(&self.database()).await.unwrap()
    }

    pub fn config(&self, server: &MockServer, batch_size: usize, concurrency: usize) -> Config {
        let mut config = Config::default();
        config.remote = RemoteConfig {
            api_base: server.uri().parse().unwrap(),
            access_token: "test-token".to_string(),
            remote_root: REMOTE_ROOT.to_string(),
            request_timeout: Duration::from_secs(5),
        };
        config.ledger.database_path = self.database();
        config.transfer.destination = self.destination();
        config.transfer.batch_size = batch_size;
        config.transfer.concurrency = concurrency;
        config
    }
}

/// `count` item names spread over two sub-folders
pub fn item_names(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("batch-{}/item-{i:04}.json", i % 2))
        .collect()
}

/// Drive API that serves [`ITEM_BODY`] for every content request
pub async fn mock_drive() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/me/drive/root:/.+:/content$"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ITEM_BODY))
        .mount(&server)
        .await;
    server
}

/// Make `name` under [`REMOTE_ROOT`] answer 404 for the next `times` requests, taking
/// precedence over [`mock_drive`]
pub async fn mount_missing(server: &MockServer, name: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path(content_path(name)))
        .respond_with(ResponseTemplate::new(404))
        .with_priority(1)
        .up_to_n_times(times)
        .mount(server)
        .await;
}

/// Request path the fetcher uses for `name`
pub fn content_path(name: &str) -> String {
    format!("/me/drive/root:{REMOTE_ROOT}/{name}:/content")
}

/// Number of content requests the drive has seen
pub async fn content_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| request.url.path().ends_with(":/content"))
        .count()
}

/// Build an engine over the SQLite ledger and the mock drive
pub fn engine(
    config: &Config,
    ledger: Arc<SqliteLedger>,
    notifier: Arc<dyn Notifier>,
) -> TransferEngine {
    let fetcher = GraphFetcher::new(&config.remote, &config.transfer.destination).unwrap();
    TransferEngine::new(config, ledger, Arc::new(fetcher), notifier)
}

/// Webhook notifier posting to `/notify` on `server`
pub fn webhook(server: &MockServer) -> Arc<dyn Notifier> {
    let url = format!("{}/notify", server.uri()).parse().unwrap();
    Arc::new(WebhookNotifier::new(url, None, Duration::from_secs(2)).unwrap())
}

pub fn assert_written(destination: &Path, name: &str) {
    let path = destination.join(name);
    let body = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("{} not written: {e}", path.display()));
    assert_eq!(body, ITEM_BODY);
}
