//! In-memory collaborators shared by the engine tests

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::*;
use crate::config::Config;
use crate::error::{FetchError, LedgerError, NotifyError};
use crate::types::{ItemId, WorkItem};
use crate::{Error, Result};


/// Ledger held in memory, with switches for simulating an unreachable store
#[derive(Default)]
pub(super) struct MemoryLedger {
    items: Mutex<BTreeMap<i64, (String, bool)>>,
    /// Size of every batch returned by `query_pending`
    pub loads: Mutex<Vec<usize>>,
    /// Completed count observed after every `mark_complete`
    pub completed_history: Mutex<Vec<u64>>,
    fail_count: Mutex<bool>,
    /// Fail the query with this zero-based index
    fail_query_at: Mutex<Option<usize>>,
    /// Fail the mark_complete call with this zero-based index
    fail_mark_at: Mutex<Option<usize>>,
    marks: AtomicUsize,
    /// Return every pending item twice (a misbehaving store)
    duplicate_rows: Mutex<bool>,
}

impl MemoryLedger {
    pub fn with_pending(count: usize) -> Self {
        let ledger = Self::default();
        {
            let mut items = ledger.items.lock().unwrap();
            for i in 1..=count as i64 {
                items.insert(i, (format!("file-{i:05}.json"), false));
            }
        }
        ledger
    }

    pub fn mark_preexisting_complete(&self, count: usize) {
        let mut items = self.items.lock().unwrap();
        for (_, (_, done)) in items.iter_mut().take(count) {
            *done = true;
        }
    }

    pub fn pending(&self) -> usize {
        self.items.lock().unwrap().values().filter(|(_, d)| !d).count()
    }

    pub fn completed(&self) -> u64 {
        self.items.lock().unwrap().values().filter(|(_, d)| *d).count() as u64
    }

    pub fn is_complete(&self, id: i64) -> bool {
        self.items.lock().unwrap().get(&id).map(|(_, d)| *d).unwrap_or(false)
    }

    pub fn fail_count(&self) {
        *self.fail_count.lock().unwrap() = true;
    }

    pub fn fail_query_at(&self, index: usize) {
        *self.fail_query_at.lock().unwrap() = Some(index);
    }

    pub fn fail_mark_at(&self, index: usize) {
        *self.fail_mark_at.lock().unwrap() = Some(index);
    }

    pub fn duplicate_rows(&self) {
        *self.duplicate_rows.lock().unwrap() = true;
    }

    pub fn load_sizes(&self) -> Vec<usize> {
        self.loads.lock().unwrap().clone()
    }

    fn unreachable() -> Error {
        Error::Ledger(LedgerError::ConnectionFailed("ledger unreachable".to_string()))
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn query_pending(&self, limit: usize) -> Result<Vec<WorkItem>> {
        let index = self.loads.lock().unwrap().len();
        if *self.fail_query_at.lock().unwrap() == Some(index) {
            return Err(Self::unreachable());
        }

        let items = self.items.lock().unwrap();
        let mut batch: Vec<WorkItem> = items
            .iter()
            .filter(|(_, (_, done))| !done)
            .take(limit)
            .map(|(id, (name, _))| WorkItem::pending(*id, name.clone()))
            .collect();
        if *self.duplicate_rows.lock().unwrap() {
            batch = batch.into_iter().flat_map(|i| [i.clone(), i]).collect();
        }

        self.loads.lock().unwrap().push(batch.len().min(limit));
        Ok(batch)
    }

    async fn mark_complete(&self, ids: &[ItemId]) -> Result<u64> {
        let index = self.marks.fetch_add(1, Ordering::SeqCst);
        if *self.fail_mark_at.lock().unwrap() == Some(index) {
            return Err(Self::unreachable());
        }

        let mut items = self.items.lock().unwrap();
        let mut changed = 0;
        for id in ids {
            if let Some((_, done)) = items.get_mut(&id.0)
                && !*done
            {
                *done = true;
                changed += 1;
            }
        }
        let completed = items.values().filter(|(_, d)| *d).count() as u64;
        self.completed_history.lock().unwrap().push(completed);
        Ok(changed)
    }

    async fn count_completed(&self) -> Result<u64> {
        if *self.fail_count.lock().unwrap() {
            return Err(Self::unreachable());
        }
        Ok(self.completed())
    }
}

/// Fetcher that succeeds unless told otherwise, recording every call
#[derive(Default)]
pub(super) struct ScriptedFetcher {
    failing: Mutex<HashSet<String>>,
    panicking: Mutex<HashSet<String>>,
    /// Fail this many calls per name before succeeding
    flaky: Mutex<BTreeMap<String, usize>>,
    pub calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    delay: Mutex<Option<Duration>>,
}

impl ScriptedFetcher {
    pub fn fail(&self, name: &str) {
        self.failing.lock().unwrap().insert(name.to_string());
    }

    pub fn heal(&self, name: &str) {
        self.failing.lock().unwrap().remove(name);
    }

    pub fn panic_on(&self, name: &str) {
        self.panicking.lock().unwrap().insert(name.to_string());
    }

    pub fn flaky(&self, name: &str, failures: usize) {
        self.flaky.lock().unwrap().insert(name.to_string(), failures);
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|n| *n == name).count()
    }
}

#[async_trait]
impl RemoteFetcher for ScriptedFetcher {
    async fn fetch(&self, remote_path: &str) -> std::result::Result<PathBuf, FetchError> {
        self.calls.lock().unwrap().push(remote_path.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.panicking.lock().unwrap().contains(remote_path) {
            panic!("simulated fetcher panic for {remote_path}");
        }
        if self.failing.lock().unwrap().contains(remote_path) {
            return Err(FetchError::NotFound(remote_path.to_string()));
        }
        {
            let mut flaky = self.flaky.lock().unwrap();
            if let Some(left) = flaky.get_mut(remote_path)
                && *left > 0
            {
                *left -= 1;
                return Err(FetchError::Status {
                    status: 503,
                    path: remote_path.to_string(),
                });
            }
        }

        Ok(PathBuf::from("/dest").join(remote_path))
    }
}

/// Notifier that keeps every message, optionally failing each send
#[derive(Default)]
pub(super) struct RecordingNotifier {
    pub messages: Mutex<Vec<String>>,
    failing: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            messages: Mutex::default(),
            failing: true,
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &str) -> std::result::Result<(), NotifyError> {
        self.messages.lock().unwrap().push(message.to_string());
        if self.failing {
            Err(NotifyError::Status(503))
        } else {
            Ok(())
        }
    }
}

pub(super) fn test_config(batch_size: usize, concurrency: usize) -> Config {
    let mut config = Config::default();
    config.remote.access_token = "token".to_string();
    config.transfer.batch_size = batch_size;
    config.transfer.concurrency = concurrency;
    config
}

pub(super) fn engine_with(
    config: &Config,
    ledger: &Arc<MemoryLedger>,
    fetcher: &Arc<ScriptedFetcher>,
    notifier: &Arc<RecordingNotifier>,
) -> TransferEngine {
    TransferEngine::new(
        config,
        ledger.clone(),
        fetcher.clone(),
        notifier.clone(),
    )
}
