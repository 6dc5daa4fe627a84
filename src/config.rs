//! Configuration types for ledger-dl
//!
//! A [`Config`] is built once at startup (usually with [`Config::from_env`]) and handed to
//! each component constructor. Nothing reads the environment after that point.

use crate::error::Error;
use crate::Result;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Environment variable names
pub mod env_keys {
    /// Bearer token for the drive API
    pub const ACCESS_TOKEN: &str = "LEDGER_DL_ACCESS_TOKEN";
    /// Drive API base URL
    pub const API_BASE: &str = "LEDGER_DL_API_BASE";
    /// Remote folder holding the items
    pub const REMOTE_ROOT: &str = "LEDGER_DL_REMOTE_ROOT";
    /// Ledger database path
    pub const DATABASE: &str = "LEDGER_DL_DATABASE";
    /// Local destination root
    pub const DESTINATION: &str = "LEDGER_DL_DESTINATION";
    /// Items per batch
    pub const BATCH_SIZE: &str = "LEDGER_DL_BATCH_SIZE";
    /// Parallel transfers
    pub const CONCURRENCY: &str = "LEDGER_DL_CONCURRENCY";
    /// Per-item request timeout in seconds
    pub const REQUEST_TIMEOUT_SECS: &str = "LEDGER_DL_REQUEST_TIMEOUT_SECS";
    /// Progress webhook URL
    pub const NOTIFY_URL: &str = "LEDGER_DL_NOTIFY_URL";
    /// Authorization header sent with progress webhooks
    pub const NOTIFY_AUTH: &str = "LEDGER_DL_NOTIFY_AUTH";
    /// Progress webhook timeout in seconds
    pub const NOTIFY_TIMEOUT_SECS: &str = "LEDGER_DL_NOTIFY_TIMEOUT_SECS";
    /// Subtracted from the initial completed count in progress messages
    pub const BASELINE_CORRECTION: &str = "LEDGER_DL_BASELINE_CORRECTION";
    /// Bounded per-item retries
    pub const RETRY_ATTEMPTS: &str = "LEDGER_DL_RETRY_ATTEMPTS";
    /// File receiving a copy of the log
    pub const LOG_FILE: &str = "LEDGER_DL_LOG_FILE";
}

/// Remote drive settings
#[derive(Clone, Debug)]
pub struct RemoteConfig {
    /// Drive API base URL (default: Microsoft Graph v1.0)
    pub api_base: Url,
    /// Bearer token; acquiring and refreshing it is the caller's job
    pub access_token: String,
    /// Folder on the drive that item names are relative to (default: "/")
    pub remote_root: String,
    /// Longest wait for a connection, a response, or the next body chunk of one transfer
    /// (default: 300 seconds). The whole transfer has no deadline while data keeps arriving.
    pub request_timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            access_token: String::new(),
            remote_root: "/".to_string(),
            request_timeout: Duration::from_secs(300),
        }
    }
}

/// Ledger storage settings
#[derive(Clone, Debug)]
pub struct LedgerConfig {
    /// SQLite database holding the `files` table
    pub database_path: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("ledger.db"),
        }
    }
}

/// Batch and worker pool settings
#[derive(Clone, Debug)]
pub struct TransferConfig {
    /// Local directory items are written into (default: "./downloads")
    pub destination: PathBuf,
    /// Maximum items pulled from the ledger per cycle (default: 1000)
    pub batch_size: usize,
    /// Maximum transfers in flight at once (default: 10)
    pub concurrency: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            destination: PathBuf::from("downloads"),
            batch_size: 1000,
            concurrency: 10,
        }
    }
}

/// Progress notification settings
#[derive(Clone, Debug)]
pub struct NotificationConfig {
    /// Webhook receiving one plain-text message per batch (None = disabled)
    pub url: Option<Url>,
    /// Optional Authorization header value
    pub auth_header: Option<String>,
    /// Request timeout (default: 10 seconds)
    pub timeout: Duration,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            url: None,
            auth_header: None,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Progress message settings
#[derive(Clone, Debug, Default)]
pub struct ReportConfig {
    /// Subtracted from the completed count found at startup before it is displayed.
    ///
    /// Only affects progress messages; some ledgers carry completed rows that do not
    /// correspond to real files and should not be counted.
    pub baseline_correction: u64,
}

/// Log output settings
#[derive(Clone, Debug, Default)]
pub struct LoggingConfig {
    /// Append timestamped log lines here in addition to the console (None = console only)
    pub log_file: Option<PathBuf>,
}

/// Bounded per-item retry for transient transfer failures
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Retries after the first attempt (default: 0, failures go straight to the ledger)
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 30 seconds)
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 0,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

/// Main configuration for a transfer run
#[derive(Clone, Debug, Default)]
pub struct Config {
    /// Remote drive access
    pub remote: RemoteConfig,
    /// Ledger location
    pub ledger: LedgerConfig,
    /// Batch size, concurrency, destination
    pub transfer: TransferConfig,
    /// Progress webhook
    pub notifications: NotificationConfig,
    /// Progress message tuning
    pub report: ReportConfig,
    /// Per-item retry policy
    pub retry: RetryConfig,
    /// Log destinations
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// A `.env` file in the working directory is read first if present; variables
    /// already set in the environment take precedence.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        use env_keys::*;

        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| Error::config(key, format!("{key} is not set")))
        };

        let remote_defaults = RemoteConfig::default();
        let transfer_defaults = TransferConfig::default();
        let notify_defaults = NotificationConfig::default();

        let api_base = match get(API_BASE) {
            Some(raw) => parse_url(API_BASE, &raw)?,
            None => remote_defaults.api_base,
        };

        let config = Config {
            remote: RemoteConfig {
                api_base,
                access_token: require(ACCESS_TOKEN)?,
                remote_root: get(REMOTE_ROOT).unwrap_or(remote_defaults.remote_root),
                request_timeout: parse_opt(&get, REQUEST_TIMEOUT_SECS)?
                    .map(Duration::from_secs)
                    .unwrap_or(remote_defaults.request_timeout),
            },
            ledger: LedgerConfig {
                database_path: PathBuf::from(require(DATABASE)?),
            },
            transfer: TransferConfig {
                destination: PathBuf::from(require(DESTINATION)?),
                batch_size: parse_opt(&get, BATCH_SIZE)?
                    .unwrap_or(transfer_defaults.batch_size),
                concurrency: parse_opt(&get, CONCURRENCY)?
                    .unwrap_or(transfer_defaults.concurrency),
            },
            notifications: NotificationConfig {
                url: get(NOTIFY_URL)
                    .map(|raw| parse_url(NOTIFY_URL, &raw))
                    .transpose()?,
                auth_header: get(NOTIFY_AUTH),
                timeout: parse_opt(&get, NOTIFY_TIMEOUT_SECS)?
                    .map(Duration::from_secs)
                    .unwrap_or(notify_defaults.timeout),
            },
            report: ReportConfig {
                baseline_correction: parse_opt(&get, BASELINE_CORRECTION)?.unwrap_or(0),
            },
            retry: RetryConfig {
                max_attempts: parse_opt(&get, RETRY_ATTEMPTS)?.unwrap_or(0),
                ..Default::default()
            },
            logging: LoggingConfig {
                log_file: get(LOG_FILE).map(PathBuf::from),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Check invariants that parsing alone cannot express
    pub fn validate(&self) -> Result<()> {
        use env_keys::*;

        if self.remote.access_token.trim().is_empty() {
            return Err(Error::config(ACCESS_TOKEN, "access token must not be empty"));
        }
        if self.transfer.batch_size == 0 {
            return Err(Error::config(BATCH_SIZE, "batch size must be at least 1"));
        }
        if self.transfer.concurrency == 0 {
            return Err(Error::config(CONCURRENCY, "concurrency must be at least 1"));
        }
        if self.remote.request_timeout.is_zero() {
            return Err(Error::config(
                REQUEST_TIMEOUT_SECS,
                "request timeout must be at least 1 second",
            ));
        }
        if self.notifications.timeout.is_zero() {
            return Err(Error::config(
                NOTIFY_TIMEOUT_SECS,
                "notification timeout must be at least 1 second",
            ));
        }
        Ok(())
    }
}

fn default_api_base() -> Url {
    // Literal is known-good; parsing cannot fail
    #[allow(clippy::expect_used)]
    Url::parse("https://graph.microsoft.com/v1.0").expect("default API base is a valid URL")
}

fn parse_url(key: &str, raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| Error::config(key, format!("{key} is not a valid URL: {e}")))
}

fn parse_opt<G, T>(get: &G, key: &str) -> Result<Option<T>>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| Error::config(key, format!("{key}={raw:?} is invalid: {e}"))),
        None => Ok(None),
    }
}
