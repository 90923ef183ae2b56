//! Harness configuration loading and validation.
//!
//! The harness reads an optional TOML file. Every field has a default, so a
//! missing file simply yields [`Config::default`].
//!
//! ```toml
//! [harness]
//! routes = ["", "https://cors-anywhere.herokuapp.com/"]
//! timeout_ms = 20000
//! enable_rate_limit = true
//! keys_file = "keys.json"
//! keys_local_file = "keys.local.json"
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use super::logging::LoggingConfig;
use crate::error::{ConfigError, Result};

/// Forwarding route used when the direct route is unavailable.
pub const CORS_FORWARDING_ROUTE: &str = "https://cors-anywhere.herokuapp.com/";

/// Run-wide harness settings.
#[derive(Debug, Clone, Deserialize)]
pub struct HarnessConfig {
    /// Access routes in rotation order. `""` is the direct route.
    #[serde(default = "default_routes")]
    pub routes: Vec<String>,

    /// Transport timeout for every client request.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Ask clients to pace their requests.
    #[serde(default = "default_true")]
    pub enable_rate_limit: bool,

    /// Shared credentials file.
    #[serde(default = "default_keys_file")]
    pub keys_file: PathBuf,

    /// Developer-local credentials file; wins over `keys_file` when present.
    #[serde(default = "default_keys_local_file")]
    pub keys_local_file: PathBuf,
}

fn default_routes() -> Vec<String> {
    vec![String::new(), CORS_FORWARDING_ROUTE.to_string()]
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_true() -> bool {
    true
}

fn default_keys_file() -> PathBuf {
    PathBuf::from("keys.json")
}

fn default_keys_local_file() -> PathBuf {
    PathBuf::from("keys.local.json")
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            routes: default_routes(),
            timeout_ms: default_timeout_ms(),
            enable_rate_limit: true,
            keys_file: default_keys_file(),
            keys_local_file: default_keys_local_file(),
        }
    }
}

impl HarnessConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Main harness configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub harness: HarnessConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse configuration from TOML content.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse_toml(&content)
    }

    /// Load the file if it exists, defaults otherwise.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        if self.harness.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.harness.routes.is_empty() {
            return Err(ConfigError::MissingField { field: "routes" }.into());
        }
        let mut seen = HashSet::new();
        for route in &self.harness.routes {
            if !seen.insert(route.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "routes",
                    reason: format!("duplicate route '{route}'"),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
