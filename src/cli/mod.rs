//! Command-line interface definitions.

pub mod run;

use clap::Parser;
use std::path::PathBuf;

/// Conformance harness for unified exchange clients.
#[derive(Parser, Debug)]
#[command(name = "conformance")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Exchange id to test
    pub exchange: String,

    /// Only load markets and run public probes for this symbol
    pub symbol: Option<String>,

    /// Path to configuration file
    #[arg(short, long, default_value = "conformance.toml")]
    pub config: PathBuf,

    /// Read exchange settings from this file only
    #[arg(long)]
    pub keys: Option<PathBuf>,

    /// Log requests and responses
    #[arg(long)]
    pub verbose: bool,

    /// Trace-level logging
    #[arg(long)]
    pub debug: bool,

    /// Use JSON log format instead of pretty
    #[arg(long)]
    pub json_logs: bool,
}
