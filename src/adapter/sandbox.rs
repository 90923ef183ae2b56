//! Fixture-driven in-process exchange.
//!
//! A sandbox answers every declared method from a JSON fixture: canned
//! responses where given, method-shaped defaults otherwise. Failure rules
//! inject client errors per method, per route, for a bounded number of
//! calls, which makes the whole harness exercisable offline.
//!
//! ```json
//! {
//!   "has": { "loadMarkets": true, "fetchTicker": true },
//!   "requiredCredentials": { "apiKey": true, "secret": true },
//!   "markets": [{ "symbol": "BTC/USD", "base": "BTC", "quote": "USD", "active": true }],
//!   "currencies": [{ "code": "BTC" }],
//!   "responses": { "fetchTicker": { "symbol": "BTC/USD", "last": 42000 } },
//!   "failures": [{ "method": "loadMarkets", "routes": [""], "kind": "RequestTimeout", "times": 1 }]
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, trace};

use crate::error::{ConfigError, ExchangeError, ExchangeErrorKind, Result};
use crate::exchange::{
    CallArgs, Capabilities, Credentials, Currency, Exchange, ExchangeConfig, Market, MarketSet,
    Method, RequiredCredentials,
};

/// An injected failure.
#[derive(Debug, Clone, Deserialize)]
pub struct FailureRule {
    pub method: Method,
    pub kind: ExchangeErrorKind,
    #[serde(default)]
    pub message: Option<String>,
    /// Routes the rule applies to; all routes when absent.
    #[serde(default)]
    pub routes: Option<Vec<String>>,
    /// Params that must all match the call's params.
    #[serde(default)]
    pub when: Map<String, Value>,
    /// Number of calls to fail; every call when absent.
    #[serde(default)]
    pub times: Option<u32>,
}

impl FailureRule {
    pub fn new(method: Method, kind: ExchangeErrorKind) -> Self {
        Self {
            method,
            kind,
            message: None,
            routes: None,
            when: Map::new(),
            times: None,
        }
    }

    #[must_use]
    pub fn on_route(mut self, route: &str) -> Self {
        self.routes.get_or_insert_with(Vec::new).push(route.to_string());
        self
    }

    #[must_use]
    pub fn when(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.when.insert(key.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn times(mut self, times: u32) -> Self {
        self.times = Some(times);
        self
    }

    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn matches(&self, method: Method, route: &str, args: &CallArgs) -> bool {
        self.method == method
            && self.times != Some(0)
            && self
                .routes
                .as_ref()
                .map_or(true, |routes| routes.iter().any(|r| r == route))
            && self
                .when
                .iter()
                .all(|(key, value)| args.params.get(key) == Some(value))
    }

    fn error(&self, exchange: &str) -> ExchangeError {
        let message = self
            .message
            .clone()
            .unwrap_or_else(|| format!("{exchange} {} {}", self.method, self.kind));
        ExchangeError::new(self.kind, message)
    }
}

/// Sandbox fixture file contents.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxFixture {
    #[serde(default)]
    pub has: Capabilities,
    #[serde(default)]
    pub required_credentials: RequiredCredentials,
    #[serde(default)]
    pub markets: Vec<Market>,
    /// Reported symbol list; derived from `markets` when absent.
    #[serde(default)]
    pub symbols: Option<Vec<String>>,
    #[serde(default)]
    pub currencies: Vec<Currency>,
    #[serde(default)]
    pub responses: HashMap<Method, Value>,
    #[serde(default)]
    pub failures: Vec<FailureRule>,
}

impl SandboxFixture {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| {
            ConfigError::ParseJson {
                path: path.display().to_string(),
                source,
            }
            .into()
        })
    }
}

/// One call the sandbox received.
#[derive(Debug, Clone, PartialEq)]
pub struct SandboxCall {
    pub route: String,
    pub method: Method,
    pub args: CallArgs,
}

/// Everything a sandbox observed. Shared so tests can inspect it after the
/// client is boxed.
#[derive(Debug, Default)]
pub struct SandboxJournal {
    pub calls: Vec<SandboxCall>,
    pub routes: Vec<String>,
    pub origins: Vec<String>,
}

impl SandboxJournal {
    /// Methods called, in order.
    #[must_use]
    pub fn methods(&self) -> Vec<Method> {
        self.calls.iter().map(|call| call.method).collect()
    }
}

pub struct SandboxExchange {
    config: ExchangeConfig,
    capabilities: Capabilities,
    required: RequiredCredentials,
    fixture_markets: MarketSet,
    fixture_currencies: BTreeMap<String, Currency>,
    markets: Option<MarketSet>,
    currencies: BTreeMap<String, Currency>,
    responses: HashMap<Method, Value>,
    failures: Vec<FailureRule>,
    route: String,
    journal: Arc<Mutex<SandboxJournal>>,
}

impl SandboxExchange {
    pub fn from_fixture(config: ExchangeConfig, fixture: SandboxFixture) -> Self {
        let fixture_markets = match fixture.symbols {
            Some(symbols) => MarketSet::from_parts(fixture.markets, symbols),
            None => MarketSet::new(fixture.markets),
        };
        let fixture_currencies = fixture
            .currencies
            .into_iter()
            .map(|currency| (currency.code.clone(), currency))
            .collect();

        Self {
            config,
            capabilities: fixture.has,
            required: fixture.required_credentials,
            fixture_markets,
            fixture_currencies,
            markets: None,
            currencies: BTreeMap::new(),
            responses: fixture.responses,
            failures: fixture.failures,
            route: String::new(),
            journal: Arc::new(Mutex::new(SandboxJournal::default())),
        }
    }

    /// Start building a sandbox in code.
    pub fn builder(id: impl Into<String>) -> SandboxBuilder {
        SandboxBuilder {
            config: ExchangeConfig::new(id),
            fixture: SandboxFixture::default(),
        }
    }

    /// Handle onto the call journal.
    #[must_use]
    pub fn journal(&self) -> Arc<Mutex<SandboxJournal>> {
        Arc::clone(&self.journal)
    }

    fn record(&self, method: Method, args: &CallArgs) {
        self.journal.lock().calls.push(SandboxCall {
            route: self.route.clone(),
            method,
            args: args.clone(),
        });
    }

    fn check_failures(
        &mut self,
        method: Method,
        args: &CallArgs,
    ) -> std::result::Result<(), ExchangeError> {
        let route = self.route.as_str();
        let Some(rule) = self
            .failures
            .iter_mut()
            .find(|rule| rule.matches(method, route, args))
        else {
            return Ok(());
        };
        if let Some(times) = rule.times.as_mut() {
            *times -= 1;
        }
        let err = rule.error(&self.config.id);
        debug!(exchange = %self.config.id, %method, kind = %err.kind, "Injected failure");
        Err(err)
    }

    fn default_response(&self, method: Method, args: &CallArgs) -> Value {
        let symbol = args.symbol.clone().map_or(Value::Null, Value::String);
        match method {
            Method::LoadMarkets => json!({}),
            Method::FetchCurrencies => {
                let map: Map<String, Value> = self
                    .currencies
                    .keys()
                    .map(|code| (code.clone(), json!({ "code": code })))
                    .collect();
                Value::Object(map)
            }
            Method::FetchTicker => json!({ "symbol": symbol }),
            Method::FetchOrderBook | Method::FetchL2OrderBook => {
                json!({ "symbol": symbol, "bids": [], "asks": [] })
            }
            Method::FetchBalance => json!({ "info": {}, "free": {}, "used": {}, "total": {} }),
            Method::FetchStatus => json!({ "status": "ok" }),
            Method::FetchBorrowRate => json!({ "currency": args.code }),
            Method::SignIn => json!({}),
            Method::CreateOrder | Method::CancelOrder => json!({ "id": "sandbox" }),
            Method::FetchTickers
            | Method::FetchOrderBooks
            | Method::FetchTransactionFees
            | Method::FetchTradingFees
            | Method::FetchLeverageTiers
            | Method::FetchBorrowRates => json!({}),
            Method::FetchOhlcv
            | Method::FetchTrades
            | Method::FetchAccounts
            | Method::FetchOpenInterestHistory
            | Method::FetchOrders
            | Method::FetchOpenOrders
            | Method::FetchClosedOrders
            | Method::FetchMyTrades
            | Method::FetchPositions
            | Method::FetchLedger
            | Method::FetchTransactions
            | Method::FetchDeposits
            | Method::FetchWithdrawals
            | Method::FetchBorrowInterest => json!([]),
        }
    }
}

#[async_trait]
impl Exchange for SandboxExchange {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn markets(&self) -> Option<&MarketSet> {
        self.markets.as_ref()
    }

    fn currencies(&self) -> &BTreeMap<String, Currency> {
        &self.currencies
    }

    fn required_credentials(&self) -> &RequiredCredentials {
        &self.required
    }

    fn credentials(&self) -> &Credentials {
        &self.config.credentials
    }

    fn route(&self) -> &str {
        &self.route
    }

    fn set_route(&mut self, route: &str) {
        self.route = route.to_string();
        self.journal.lock().routes.push(self.route.clone());
    }

    fn set_origin(&mut self, origin: String) {
        self.journal.lock().origins.push(origin);
    }

    fn extended_test(&self) -> bool {
        self.config.extended_test
    }

    async fn load_markets(&mut self) -> std::result::Result<(), ExchangeError> {
        let args = CallArgs::none();
        self.record(Method::LoadMarkets, &args);
        self.check_failures(Method::LoadMarkets, &args)?;

        if self.markets.is_none() {
            self.markets = Some(self.fixture_markets.clone());
            self.currencies = self.fixture_currencies.clone();
            debug!(
                exchange = %self.config.id,
                markets = self.fixture_markets.market_count(),
                "Sandbox markets loaded"
            );
        }
        Ok(())
    }

    async fn request(
        &mut self,
        method: Method,
        args: &CallArgs,
    ) -> std::result::Result<Value, ExchangeError> {
        self.record(method, args);
        if !self.capabilities.supports(method) {
            return Err(ExchangeError::not_supported(format!(
                "{} {method}() is not supported",
                self.config.id
            )));
        }
        self.check_failures(method, args)?;

        let response = self
            .responses
            .get(&method)
            .cloned()
            .unwrap_or_else(|| self.default_response(method, args));
        if self.config.verbose {
            debug!(exchange = %self.config.id, %method, %response, "Sandbox response");
        } else {
            trace!(exchange = %self.config.id, %method, "Sandbox response");
        }
        Ok(response)
    }
}

/// Code-first sandbox construction.
pub struct SandboxBuilder {
    config: ExchangeConfig,
    fixture: SandboxFixture,
}

impl SandboxBuilder {
    #[must_use]
    pub fn capability(mut self, method: Method) -> Self {
        self.fixture.has.insert(method);
        self
    }

    #[must_use]
    pub fn capabilities(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        for method in methods {
            self.fixture.has.insert(method);
        }
        self
    }

    #[must_use]
    pub fn market(mut self, market: Market) -> Self {
        self.fixture.markets.push(market);
        self
    }

    /// Override the reported symbol list.
    #[must_use]
    pub fn symbols(mut self, symbols: Vec<String>) -> Self {
        self.fixture.symbols = Some(symbols);
        self
    }

    #[must_use]
    pub fn currency(mut self, code: &str) -> Self {
        self.fixture.currencies.push(Currency::new(code));
        self
    }

    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.config.credentials = credentials;
        self
    }

    #[must_use]
    pub fn required(mut self, required: RequiredCredentials) -> Self {
        self.fixture.required_credentials = required;
        self
    }

    #[must_use]
    pub fn respond(mut self, method: Method, response: Value) -> Self {
        self.fixture.responses.insert(method, response);
        self
    }

    #[must_use]
    pub fn fail(mut self, rule: FailureRule) -> Self {
        self.fixture.failures.push(rule);
        self
    }

    #[must_use]
    pub fn extended_test(mut self, enabled: bool) -> Self {
        self.config.extended_test = enabled;
        self
    }

    #[must_use]
    pub fn build(self) -> SandboxExchange {
        SandboxExchange::from_fixture(self.config, self.fixture)
    }
}
