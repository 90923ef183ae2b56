//! Exchange client factory.
//!
//! Builds the client for an exchange id from its keys-file settings. The
//! client receives one [`ExchangeConfig`] at construction; nothing is
//! merged onto it afterwards.

use std::time::Duration;

use serde_json::{Map, Value};
use tracing::info;

use super::{Credentials, Exchange, RequiredCredentials};
use crate::adapter::sandbox::{SandboxExchange, SandboxFixture};
use crate::config::{resolve_credentials, AdapterSettings, ExchangeSettings, HarnessConfig};
use crate::error::{ConfigError, Result};

/// Construction-time client configuration.
#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub id: String,
    pub credentials: Credentials,
    pub timeout: Duration,
    pub enable_rate_limit: bool,
    pub verbose: bool,
    pub extended_test: bool,
    /// Adapter-specific passthrough options.
    pub options: Map<String, Value>,
}

impl ExchangeConfig {
    /// Defaults for `id` with no credentials.
    pub fn new(id: impl Into<String>) -> Self {
        let harness = HarnessConfig::default();
        Self {
            id: id.into(),
            credentials: Credentials::default(),
            timeout: harness.timeout(),
            enable_rate_limit: harness.enable_rate_limit,
            verbose: false,
            extended_test: false,
            options: Map::new(),
        }
    }
}

/// Factory for configured exchange clients.
pub struct ExchangeFactory {
    harness: HarnessConfig,
    verbose: bool,
}

impl ExchangeFactory {
    #[must_use]
    pub fn new(harness: &HarnessConfig) -> Self {
        Self {
            harness: harness.clone(),
            verbose: false,
        }
    }

    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Build the client for `id`.
    ///
    /// `env` looks up credential environment variables; see
    /// [`resolve_credentials`].
    pub fn create<F>(
        &self,
        id: &str,
        settings: Option<&ExchangeSettings>,
        env: F,
    ) -> Result<Box<dyn Exchange>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let adapter = settings
            .and_then(|settings| settings.adapter.as_ref())
            .ok_or_else(|| ConfigError::UnknownExchange(id.to_string()))?;

        match adapter {
            AdapterSettings::Sandbox { fixture } => {
                let fixture = SandboxFixture::load(fixture)?;
                let config = self.config(id, settings, &fixture.required_credentials, env);
                info!(exchange = %id, adapter = "sandbox", "Created exchange client");
                Ok(Box::new(SandboxExchange::from_fixture(config, fixture)))
            }
            #[cfg(feature = "http")]
            AdapterSettings::Http {
                url,
                has,
                required_credentials,
            } => {
                let config = self.config(id, settings, required_credentials, env);
                info!(exchange = %id, adapter = "http", url = %url, "Created exchange client");
                Ok(Box::new(crate::adapter::http::HttpExchange::new(
                    config,
                    url.clone(),
                    has.clone(),
                    required_credentials.clone(),
                )))
            }
            #[cfg(not(feature = "http"))]
            AdapterSettings::Http { .. } => Err(ConfigError::InvalidValue {
                field: "adapter",
                reason: "the http adapter requires the `http` feature".to_string(),
            }
            .into()),
        }
    }

    fn config<F>(
        &self,
        id: &str,
        settings: Option<&ExchangeSettings>,
        required: &RequiredCredentials,
        env: F,
    ) -> ExchangeConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        ExchangeConfig {
            id: id.to_string(),
            credentials: resolve_credentials(id, settings, required, env),
            timeout: self.harness.timeout(),
            enable_rate_limit: self.harness.enable_rate_limit,
            verbose: self.verbose,
            extended_test: settings.is_some_and(|settings| settings.extended_test),
            options: settings.map(|settings| settings.options.clone()).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn unconfigured_exchange_is_unknown() {
        let factory = ExchangeFactory::new(&HarnessConfig::default());
        let result = factory.create("nowhere", None, |_| None);
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::UnknownExchange(id))) if id == "nowhere"
        ));
    }

    #[test]
    fn sandbox_fixture_is_loaded_with_resolved_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = dir.path().join("paper.json");
        std::fs::write(
            &fixture,
            r#"{"has": {"loadMarkets": true}, "requiredCredentials": {"apiKey": true},
                "markets": [{"symbol": "BTC/USD", "base": "BTC", "quote": "USD"}]}"#,
        )
        .unwrap();
        let settings: ExchangeSettings = serde_json::from_value(serde_json::json!({
            "extendedTest": true,
            "adapter": {"type": "sandbox", "fixture": fixture},
        }))
        .unwrap();

        let factory = ExchangeFactory::new(&HarnessConfig::default());
        let exchange = factory
            .create("paper", Some(&settings), |name| {
                (name == "PAPER_APIKEY").then(|| "env-key".to_string())
            })
            .unwrap();

        assert_eq!(exchange.id(), "paper");
        assert!(exchange.extended_test());
        assert_eq!(exchange.credentials().api_key.as_deref(), Some("env-key"));
    }
}
