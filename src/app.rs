//! Application orchestration.
//!
//! Wires configuration, the keys file, the exchange factory and the
//! conformance engine into one run for one exchange id.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{Config, ExchangeSettings, KeysFile};
use crate::error::Result;
use crate::exchange::{Exchange, ExchangeFactory};
use crate::harness::{ConformanceScript, FailoverController, RunOutcome};
use crate::probe::ProbeRegistry;

/// What to run.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub exchange_id: String,
    /// Test only this symbol: bootstrap plus public probes, no failover.
    pub symbol: Option<String>,
    pub verbose: bool,
}

/// How a run ended without raising.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// The exchange is marked `skip` in the keys file.
    Skipped,
    /// Single-symbol mode finished.
    SymbolTested,
    /// The failover loop finished.
    Completed(RunOutcome),
}

/// Main application struct.
pub struct App;

impl App {
    /// Run the harness for one exchange with the built-in probes.
    pub async fn run(config: &Config, request: &RunRequest) -> Result<RunStatus> {
        let symbol_label = request.symbol.as_deref().unwrap_or("all");
        info!(exchange = %request.exchange_id, symbol = symbol_label, "TESTING");

        let keys = KeysFile::load(&config.harness.keys_file, &config.harness.keys_local_file)?;
        let settings = keys.get(&request.exchange_id);

        if settings.is_some_and(|settings| settings.skip) {
            info!(exchange = %request.exchange_id, symbol = symbol_label, "[Skipped]");
            return Ok(RunStatus::Skipped);
        }

        let mut exchange = ExchangeFactory::new(&config.harness)
            .verbose(request.verbose)
            .create(&request.exchange_id, settings, |name| std::env::var(name).ok())?;

        let probes = Arc::new(ProbeRegistry::builtin());
        Self::run_exchange(config, exchange.as_mut(), settings, request.symbol.as_deref(), probes)
            .await
    }

    /// Run against an already constructed client.
    pub async fn run_exchange(
        config: &Config,
        exchange: &mut dyn Exchange,
        settings: Option<&ExchangeSettings>,
        symbol: Option<&str>,
        probes: Arc<ProbeRegistry>,
    ) -> Result<RunStatus> {
        let script = ConformanceScript::new(probes);

        if let Some(symbol) = symbol {
            script.load_exchange(exchange).await?;
            script.test_symbol(exchange, symbol).await?;
            return Ok(RunStatus::SymbolTested);
        }

        let controller = FailoverController::new(config.harness.routes.clone())
            .with_preferred_route(settings.and_then(|settings| settings.proxy.clone()));
        let outcome = controller.run(&script, exchange).await?;

        match &outcome {
            RunOutcome::Success { attempts, route } => {
                info!(exchange = %exchange.id(), attempts, route = %route, "Conformance passed");
            }
            RunOutcome::RetriesExhausted { attempts, last_error } => {
                warn!(exchange = %exchange.id(), attempts, last_error = %last_error, "Retries exhausted");
            }
            RunOutcome::AuthAbort { error, .. } => {
                warn!(exchange = %exchange.id(), error = %error, "Authentication failed, stopping");
            }
            RunOutcome::NonceAbort { error, .. } => {
                warn!(exchange = %exchange.id(), error = %error, "Invalid nonce, stopping");
            }
        }
        Ok(RunStatus::Completed(outcome))
    }
}
