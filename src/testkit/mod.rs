//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! - [`domain`]: builders for markets, market sets and credentials.
//! - [`probe`]: probes that record their calls or fail on demand.
//! - [`attempt`]: a scripted [`Attempt`](crate::harness::Attempt) for
//!   failover tests.

pub mod attempt;
pub mod domain;
pub mod probe;
