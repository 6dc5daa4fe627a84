//! `ledger-dl` entry point.

use std::process::ExitCode;
use std::sync::Arc;

use ledger_dl::config::LoggingConfig;
use ledger_dl::{Config, GraphFetcher, SqliteLedger, TransferEngine, logging, notifier};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::from_env();

    // Console logging still works when the configured log file cannot be opened
    let log_settings = config
        .as_ref()
        .map(|config| config.logging.clone())
        .unwrap_or_default();
    let (_guard, log_error) = match logging::init(&log_settings) {
        Ok(guard) => (guard, None),
        Err(e) => match logging::init(&LoggingConfig::default()) {
            Ok(guard) => (guard, Some(e)),
            Err(_) => (None, Some(e)),
        },
    };

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting ledger-dl");

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::from(2);
        }
    };
    if let Some(e) = log_error {
        tracing::error!(error = %e, "cannot open log file");
        return ExitCode::from(2);
    }

    match run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "ledger-dl failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &Config) -> ledger_dl::Result<()> {
    let ledger = SqliteLedger::new(&config.ledger.database_path).await?;
    let fetcher = GraphFetcher::new(&config.remote, &config.transfer.destination)?;
    let notifier = notifier::from_config(&config.notifications)?;

    tracing::info!(
        database = %config.ledger.database_path.display(),
        destination = %config.transfer.destination.display(),
        batch_size = config.transfer.batch_size,
        concurrency = config.transfer.concurrency,
        "configuration loaded"
    );

    let ledger = Arc::new(ledger);
    let mut engine = TransferEngine::new(
        config,
        ledger.clone(),
        Arc::new(fetcher),
        Arc::from(notifier),
    );
    let result = engine.run().await;
    drop(engine);

    if let Ok(ledger) = Arc::try_unwrap(ledger) {
        ledger.close().await;
    }

    let summary = result?;
    tracing::info!(
        state = %summary.state,
        cycles = summary.cycles,
        completed = summary.completed,
        failed = summary.failed,
        elapsed_secs = summary.elapsed.as_secs(),
        "run finished"
    );
    Ok(())
}
