#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use conformance::adapter::sandbox::{SandboxBuilder, SandboxExchange};
use conformance::config::Config;
use conformance::exchange::{Market, Method};
use conformance::harness::ConformanceScript;
use conformance::probe::ProbeRegistry;
use conformance::testkit::domain::market_with;

/// Absolute path of a checked-in fixture.
pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// A sandbox listing BTC/USD (active) and ETH/BTC, with the given
/// capabilities.
pub fn sandbox(id: &str, methods: &[Method]) -> SandboxBuilder {
    SandboxExchange::builder(id)
        .capabilities(methods.iter().copied())
        .market(market_with("BTC/USD", Some(true)))
        .market(Market::new("ETH/BTC", "ETH", "BTC"))
        .currency("BTC")
        .currency("USD")
        .currency("ETH")
}

/// A script over the built-in probes.
pub fn builtin_script() -> ConformanceScript {
    ConformanceScript::new(Arc::new(ProbeRegistry::builtin()))
}

/// Defaults with the given routes.
pub fn config_with_routes(routes: &[&str]) -> Config {
    let mut config = Config::default();
    config.harness.routes = routes.iter().map(|route| route.to_string()).collect();
    config
}
