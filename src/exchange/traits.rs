//! The client-under-test port.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::{CallArgs, Capabilities, Credentials, Currency, MarketSet, Method, RequiredCredentials};
use crate::error::{CredentialError, ExchangeError};

/// A connected market-data/trading client.
///
/// The harness owns the client exclusively for a run. It reads the declared
/// capabilities and loaded data, switches the access route between
/// attempts, and drives every call through [`Exchange::request`].
#[async_trait]
pub trait Exchange: Send {
    /// Client identifier, e.g. `kraken`.
    fn id(&self) -> &str;

    /// Declared capabilities.
    fn capabilities(&self) -> &Capabilities;

    /// Loaded markets, `None` until [`Exchange::load_markets`] succeeded.
    fn markets(&self) -> Option<&MarketSet>;

    /// Loaded currencies, empty until markets are loaded.
    fn currencies(&self) -> &BTreeMap<String, Currency>;

    fn required_credentials(&self) -> &RequiredCredentials;

    fn credentials(&self) -> &Credentials;

    /// Fail if any required credential is absent.
    fn check_required_credentials(&self) -> Result<(), CredentialError> {
        self.credentials()
            .check_required(self.id(), self.required_credentials())
    }

    /// Current access route; empty means direct.
    fn route(&self) -> &str;

    fn set_route(&mut self, route: &str);

    /// Correlation origin sent with requests over a forwarding route.
    fn set_origin(&mut self, origin: String);

    /// Generate a fresh correlation token.
    fn new_origin(&self) -> String {
        Uuid::new_v4().to_string()
    }

    /// Whether destructive error-injection probes may run.
    fn extended_test(&self) -> bool;

    /// Load markets and currencies. Idempotent once loaded.
    async fn load_markets(&mut self) -> Result<(), ExchangeError>;

    /// Invoke a unified method.
    async fn request(&mut self, method: Method, args: &CallArgs) -> Result<Value, ExchangeError>;
}
