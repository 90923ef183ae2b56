//! Conformance harness for unified market-data/trading clients.
//!
//! Runs one fixed conformance script against a client, adapting to the
//! capabilities it declares and rotating access routes on transient
//! failures.
//!
//! # Architecture
//!
//! - **`exchange`** - The client port: typed capabilities, markets,
//!   credentials, and the factory that builds configured clients
//! - **`adapter`** - Client implementations: fixture-driven `sandbox` and
//!   the `http` gateway client
//! - **`probe`** - Statically registered per-step checks
//! - **`harness`** - Capability gate, symbol selection, step dispatch, the
//!   conformance script, and route failover
//!
//! # Modules
//!
//! - [`config`] - Harness TOML, per-exchange JSON keys, logging
//! - [`error`] - Error types for the crate
//! - [`app`] - Run orchestration for one exchange id
//! - [`cli`] - Command-line definitions
//!
//! # Features
//!
//! - `http` - JSON gateway client (default)
//! - `testkit` - Test utilities for integration tests
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use conformance::adapter::sandbox::SandboxExchange;
//! use conformance::exchange::{Market, Method};
//! use conformance::harness::ConformanceScript;
//! use conformance::probe::ProbeRegistry;
//!
//! # async fn example() -> conformance::error::Result<()> {
//! let mut exchange = SandboxExchange::builder("paper")
//!     .capability(Method::FetchTicker)
//!     .market(Market::new("BTC/USD", "BTC", "USD"))
//!     .build();
//! let script = ConformanceScript::new(Arc::new(ProbeRegistry::builtin()));
//! script.run(&mut exchange).await?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod exchange;
pub mod harness;
pub mod probe;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
