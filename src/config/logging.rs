//! Logging configuration and initialization.

use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_level() -> String {
    "info".into()
}

fn default_format() -> String {
    "pretty".into()
}

impl LoggingConfig {
    /// Raise the level for `--verbose` (debug) and `--debug` (trace).
    pub fn apply_flags(&mut self, verbose: bool, debug: bool, json: bool) {
        if debug {
            self.level = "trace".into();
        } else if verbose {
            self.level = "debug".into();
        }
        if json {
            self.format = "json".into();
        }
    }

    /// Initialize the tracing subscriber with this logging configuration.
    ///
    /// A second initialization in the same process is ignored.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        let _ = match self.format.as_str() {
            "json" => fmt().json().with_env_filter(filter).try_init(),
            _ => fmt().with_env_filter(filter).try_init(),
        };
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_flag_wins_over_verbose() {
        let mut logging = LoggingConfig::default();
        logging.apply_flags(true, true, false);
        assert_eq!(logging.level, "trace");

        let mut logging = LoggingConfig::default();
        logging.apply_flags(true, false, true);
        assert_eq!(logging.level, "debug");
        assert_eq!(logging.format, "json");
    }
}
