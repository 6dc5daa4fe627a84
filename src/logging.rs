//! Console and log-file output for the binary.

use std::fs::{File, OpenOptions};
use std::path::Path;

use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;
use crate::{Error, Result};

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "info";

/// Build the subscriber described by `config`.
///
/// Events go to stdout and, when a log file is configured, are also appended to it through
/// a background writer. The returned guard flushes that writer when dropped and must be
/// held for as long as logging is needed.
pub fn subscriber(
    config: &LoggingConfig,
) -> Result<(Box<dyn Subscriber + Send + Sync>, Option<WorkerGuard>)> {
    let (file_layer, guard) = match &config.log_file {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(open_log_file(path)?);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer);

    Ok((Box::new(subscriber), guard))
}

/// Install the subscriber described by `config` as the global default
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let (subscriber, guard) = subscriber(config)?;
    subscriber.init();
    Ok(guard)
}

/// Open `path` for appending, creating it and its parent directory if needed
fn open_log_file(path: &Path) -> Result<File> {
    let io_err = |source| Error::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_err)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_events_are_appended_to_log_file() {
        let dir = tempdir().unwrap();
        let log_file = dir.path().join("logs").join("ledger-dl.log");
        std::fs::create_dir_all(log_file.parent().unwrap()).unwrap();
        std::fs::write(&log_file, "earlier run\n").unwrap();
        let config = LoggingConfig {
            log_file: Some(log_file.clone()),
        };

        let (subscriber, guard) = subscriber(&config).unwrap();
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(batch = 3, "downloaded 3000 files @ 20 files/sec");
        });
        // Flushes the background writer
        drop(guard);

        let contents = std::fs::read_to_string(&log_file).unwrap();
        assert!(contents.starts_with("earlier run\n"), "{contents}");
        assert!(
            contents.contains("downloaded 3000 files @ 20 files/sec"),
            "{contents}"
        );
        assert!(contents.contains("WARN"), "{contents}");
        assert!(!contents.contains('\u{1b}'), "log file must not contain ANSI escapes");
    }

    #[test]
    fn test_missing_parent_directory_is_created() {
        let dir = tempdir().unwrap();
        let log_file = dir.path().join("nested").join("deeper").join("run.log");

        open_log_file(&log_file).unwrap();

        assert!(log_file.exists());
    }

    #[test]
    fn test_unwritable_log_file_reports_path() {
        let dir = tempdir().unwrap();
        // A directory cannot be opened as a log file
        let config = LoggingConfig {
            log_file: Some(dir.path().to_path_buf()),
        };

        match subscriber(&config) {
            Err(Error::Io { path, .. }) => assert_eq!(path, dir.path()),
            Err(other) => panic!("expected I/O error, got {other:?}"),
            Ok(_) => panic!("expected I/O error"),
        }
    }

    #[test]
    fn test_console_only_without_log_file() {
        let (_subscriber, guard) = subscriber(&LoggingConfig::default()).unwrap();
        assert!(guard.is_none());
    }
}
