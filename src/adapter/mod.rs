//! Exchange client implementations.
//!
//! `sandbox` answers from a JSON fixture and backs the offline test suite.
//! `http` drives a JSON gateway and is behind the `http` feature.

#[cfg(feature = "http")]
pub mod http;
pub mod sandbox;
