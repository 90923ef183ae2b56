//! Per-exchange settings and credential resolution.
//!
//! Settings live in a JSON keys file keyed by exchange id:
//!
//! ```json
//! {
//!   "paper": {
//!     "adapter": { "type": "sandbox", "fixture": "fixtures/paper.json" },
//!     "apiKey": "...",
//!     "secret": "...",
//!     "extendedTest": false
//!   },
//!   "legacy": { "skip": true }
//! }
//! ```
//!
//! Credentials missing from the file fall back to `<ID>_<CREDENTIAL>`
//! environment variables for the credentials the client requires.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::exchange::{Capabilities, Credential, Credentials, RequiredCredentials};

/// Which adapter backs an exchange id.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AdapterSettings {
    /// Fixture-driven in-process client.
    Sandbox { fixture: PathBuf },
    /// JSON gateway client.
    Http {
        url: String,
        #[serde(default)]
        has: Capabilities,
        #[serde(default, rename = "requiredCredentials")]
        required_credentials: RequiredCredentials,
    },
}

/// Settings for one exchange.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeSettings {
    /// Skip this exchange entirely.
    #[serde(default)]
    pub skip: bool,

    /// Preferred access route.
    #[serde(default)]
    pub proxy: Option<String>,

    /// Enable destructive error-injection probes.
    #[serde(default)]
    pub extended_test: bool,

    #[serde(default)]
    pub adapter: Option<AdapterSettings>,

    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub twofa: Option<String>,
    #[serde(default)]
    pub private_key: Option<String>,
    #[serde(default)]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub token: Option<String>,

    /// Adapter-specific options passed through untouched.
    #[serde(default)]
    pub options: Map<String, Value>,
}

impl ExchangeSettings {
    #[must_use]
    pub fn credential(&self, credential: Credential) -> Option<&str> {
        let value = match credential {
            Credential::ApiKey => &self.api_key,
            Credential::Secret => &self.secret,
            Credential::Uid => &self.uid,
            Credential::Login => &self.login,
            Credential::Password => &self.password,
            Credential::Twofa => &self.twofa,
            Credential::PrivateKey => &self.private_key,
            Credential::WalletAddress => &self.wallet_address,
            Credential::Token => &self.token,
        };
        value.as_deref().filter(|value| !value.is_empty())
    }
}

/// All exchange settings from the keys file.
#[derive(Debug, Clone, Default)]
pub struct KeysFile {
    exchanges: HashMap<String, ExchangeSettings>,
}

impl KeysFile {
    /// Parse keys from JSON content.
    pub fn parse_json(content: &str, origin: &Path) -> Result<Self> {
        let exchanges: HashMap<String, ExchangeSettings> =
            serde_json::from_str(content).map_err(|source| ConfigError::ParseJson {
                path: origin.display().to_string(),
                source,
            })?;
        Ok(Self { exchanges })
    }

    /// Load the local file when present, otherwise the global one.
    ///
    /// Neither file existing is not an error: every exchange then runs
    /// unauthenticated with no adapter settings.
    pub fn load(global: &Path, local: &Path) -> Result<Self> {
        let path = if local.exists() { local } else { global };
        if !path.exists() {
            debug!(path = %path.display(), "No keys file found");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded keys file");
        Self::parse_json(&content, path)
    }

    #[must_use]
    pub fn get(&self, exchange_id: &str) -> Option<&ExchangeSettings> {
        self.exchanges.get(exchange_id)
    }
}

/// Resolve the credentials an exchange will be constructed with.
///
/// Every credential set in `settings` is taken as-is. Required credentials
/// still missing are looked up through `env` under
/// [`Credential::env_var`]. Empty values count as missing.
pub fn resolve_credentials<F>(
    exchange_id: &str,
    settings: Option<&ExchangeSettings>,
    required: &RequiredCredentials,
    env: F,
) -> Credentials
where
    F: Fn(&str) -> Option<String>,
{
    let mut credentials = Credentials::default();

    if let Some(settings) = settings {
        for credential in Credential::ALL {
            if let Some(value) = settings.credential(credential) {
                credentials.set(credential, value.to_string());
            }
        }
    }

    for credential in required.iter() {
        if credentials.get(credential).is_some() {
            continue;
        }
        let name = credential.env_var(exchange_id);
        if let Some(value) = env(&name).filter(|value| !value.is_empty()) {
            debug!(credential = credential.key(), env = %name, "Credential loaded from environment");
            credentials.set(credential, value);
        }
    }

    credentials
}
