//! Handler for a harness run.

use tracing::info;

use crate::app::{App, RunRequest, RunStatus};
use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;

/// Load configuration, apply CLI overrides, and run.
pub async fn execute(cli: &Cli) -> Result<RunStatus> {
    let mut config = Config::load_or_default(&cli.config)?;

    if let Some(keys) = &cli.keys {
        config.harness.keys_file = keys.clone();
        config.harness.keys_local_file = keys.clone();
    }
    config.logging.apply_flags(cli.verbose, cli.debug, cli.json_logs);
    config.init_logging();

    let request = RunRequest {
        exchange_id: cli.exchange.clone(),
        symbol: cli.symbol.clone(),
        verbose: cli.verbose,
    };
    let status = App::run(&config, &request).await?;
    info!(exchange = %cli.exchange, ?status, "Run finished");
    Ok(status)
}
