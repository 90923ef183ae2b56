//! Configuration: harness settings, per-exchange keys, logging.

mod keys;
mod logging;
mod settings;

pub use keys::{resolve_credentials, AdapterSettings, ExchangeSettings, KeysFile};
pub use logging::LoggingConfig;
pub use settings::{Config, HarnessConfig, CORS_FORWARDING_ROUTE};
