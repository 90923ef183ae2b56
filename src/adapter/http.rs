//! JSON gateway client.
//!
//! Talks to a gateway that exposes the unified methods over HTTP:
//!
//! - `GET {route}{url}/markets` returns an array (or symbol-keyed map) of
//!   markets
//! - `GET {route}{url}/currencies` returns an array (or code-keyed map) of
//!   currencies
//! - `GET {route}{url}/{method}?symbol=..&code=..&..` returns the method's
//!   unified response
//!
//! Gateway failures are reported as `{"error": "<Kind>", "message": ".."}`
//! bodies; status codes map to kinds when the body names none.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::ORIGIN;
use reqwest::{Client as HttpClient, StatusCode};
use serde::de::{Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::{ExchangeError, ExchangeErrorKind};
use crate::exchange::{
    CallArgs, Capabilities, Credentials, Currency, Exchange, ExchangeConfig, Market, MarketSet,
    Method, RequiredCredentials,
};

/// Minimum spacing between requests when rate limiting is on and the
/// options carry no `rateLimit`.
const DEFAULT_RATE_LIMIT_MS: u64 = 200;

const API_KEY_HEADER: &str = "X-Api-Key";
const API_SECRET_HEADER: &str = "X-Api-Secret";

/// A list of records, or a map of records keyed by symbol/code.
///
/// Map entries keep the order the gateway sent them in.
struct Listing<T>(Vec<T>);

impl<T> Listing<T> {
    fn into_vec(self) -> Vec<T> {
        self.0
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Listing<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ListingVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for ListingVisitor<T> {
            type Value = Listing<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a list or a keyed map of records")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(Listing(items))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut items = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((_, item)) = map.next_entry::<String, T>()? {
                    items.push(item);
                }
                Ok(Listing(items))
            }
        }

        deserializer.deserialize_any(ListingVisitor(PhantomData))
    }
}

pub struct HttpExchange {
    config: ExchangeConfig,
    http: HttpClient,
    base_url: String,
    capabilities: Capabilities,
    required: RequiredCredentials,
    markets: Option<MarketSet>,
    currencies: BTreeMap<String, Currency>,
    route: String,
    origin: Option<String>,
    min_interval: Duration,
    last_request: Option<Instant>,
}

impl HttpExchange {
    #[must_use]
    pub fn new(
        config: ExchangeConfig,
        base_url: String,
        capabilities: Capabilities,
        required: RequiredCredentials,
    ) -> Self {
        let http = HttpClient::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });

        let min_interval = if config.enable_rate_limit {
            let ms = config
                .options
                .get("rateLimit")
                .and_then(Value::as_u64)
                .unwrap_or(DEFAULT_RATE_LIMIT_MS);
            Duration::from_millis(ms)
        } else {
            Duration::ZERO
        };

        Self {
            config,
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            capabilities,
            required,
            markets: None,
            currencies: BTreeMap::new(),
            route: String::new(),
            origin: None,
            min_interval,
            last_request: None,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ExchangeError> {
        let raw = format!("{}{}/{}", self.route, self.base_url, path);
        Url::parse(&raw).map_err(|err| {
            ExchangeError::new(ExchangeErrorKind::BadRequest, format!("invalid url {raw}: {err}"))
        })
    }

    async fn throttle(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }

    async fn get(&mut self, path: &str, query: &[(String, String)]) -> Result<Value, ExchangeError> {
        let text = self.get_text(path, query).await?;
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }

    /// GET returning the raw body of a successful response.
    async fn get_text(
        &mut self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<String, ExchangeError> {
        self.throttle().await;
        let url = self.endpoint(path)?;
        debug!(exchange = %self.config.id, url = %url, "GET");

        let mut request = self.http.get(url).query(query);
        if let Some(origin) = &self.origin {
            request = request.header(ORIGIN, origin);
        }
        let credentials = &self.config.credentials;
        if let Some(key) = credentials.api_key.as_deref().filter(|key| !key.is_empty()) {
            request = request.header(API_KEY_HEADER, key);
        }
        if let Some(secret) = credentials.secret.as_deref().filter(|secret| !secret.is_empty()) {
            request = request.header(API_SECRET_HEADER, secret);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;
        let body: Value = serde_json::from_str(&text).unwrap_or_else(|_| Value::String(text.clone()));

        if self.config.verbose {
            debug!(exchange = %self.config.id, %status, %body, "Response");
        } else {
            trace!(exchange = %self.config.id, %status, "Response");
        }

        if let Some(err) = gateway_error(&body) {
            return Err(err);
        }
        if !status.is_success() {
            return Err(status_error(status, &body));
        }
        Ok(text)
    }
}

/// Error named by a gateway body, if any.
fn gateway_error(body: &Value) -> Option<ExchangeError> {
    let kind = body
        .get("error")
        .and_then(Value::as_str)
        .and_then(ExchangeErrorKind::from_name)?;
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or(kind.name())
        .to_string();
    Some(ExchangeError::new(kind, message))
}

/// Map a non-success status to an error kind.
pub fn status_error(status: StatusCode, body: &Value) -> ExchangeError {
    let kind = match status {
        StatusCode::TOO_MANY_REQUESTS => ExchangeErrorKind::RateLimitExceeded,
        StatusCode::UNAUTHORIZED => ExchangeErrorKind::AuthenticationError,
        StatusCode::FORBIDDEN => ExchangeErrorKind::PermissionDenied,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            ExchangeErrorKind::RequestTimeout
        }
        StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => ExchangeErrorKind::BadRequest,
        status if status.is_server_error() => ExchangeErrorKind::ExchangeNotAvailable,
        _ => ExchangeErrorKind::ExchangeError,
    };
    let detail = match body {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    ExchangeError::new(kind, format!("{status} {detail}"))
}

fn transport_error(err: reqwest::Error) -> ExchangeError {
    let kind = if err.is_timeout() {
        ExchangeErrorKind::RequestTimeout
    } else if err.is_connect() {
        ExchangeErrorKind::ExchangeNotAvailable
    } else {
        ExchangeErrorKind::NetworkError
    };
    ExchangeError::new(kind, err.to_string())
}

/// Parse from the raw body so keyed listings keep their order.
fn parse<T: for<'de> Deserialize<'de>>(what: &str, body: &str) -> Result<T, ExchangeError> {
    serde_json::from_str(body).map_err(|err| {
        ExchangeError::new(
            ExchangeErrorKind::ExchangeError,
            format!("malformed {what} response: {err}"),
        )
    })
}

#[async_trait]
impl Exchange for HttpExchange {
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
    }

    fn set_origin(&mut self, origin: String) {
        self.origin = Some(origin);
    }

    fn extended_test(&self) -> bool {
        self.config.extended_test
    }

    async fn load_markets(&mut self) -> Result<(), ExchangeError> {
        if self.markets.is_some() {
            return Ok(());
        }

        let body = self.get_text("markets", &[]).await?;
        let markets: Listing<Market> = parse("markets", &body)?;
        let markets = MarketSet::new(markets.into_vec());

        let body = self.get_text("currencies", &[]).await?;
        let currencies: Listing<Currency> = parse("currencies", &body)?;
        self.currencies = currencies
            .into_vec()
            .into_iter()
            .map(|currency| (currency.code.clone(), currency))
            .collect();

        debug!(
            exchange = %self.config.id,
            markets = markets.market_count(),
            currencies = self.currencies.len(),
            "Markets loaded"
        );
        self.markets = Some(markets);
        Ok(())
    }

    async fn request(&mut self, method: Method, args: &CallArgs) -> Result<Value, ExchangeError> {
        if !self.capabilities.supports(method) {
            return Err(ExchangeError::not_supported(format!(
                "{} {method}() is not supported",
                self.config.id
            )));
        }
        self.get(method.as_str(), &args.to_query()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_codes_map_to_kinds() {
        let body = json!({});
        assert_eq!(
            status_error(StatusCode::TOO_MANY_REQUESTS, &body).kind,
            ExchangeErrorKind::RateLimitExceeded
        );
        assert_eq!(
            status_error(StatusCode::UNAUTHORIZED, &body).kind,
            ExchangeErrorKind::AuthenticationError
        );
        assert_eq!(
            status_error(StatusCode::BAD_GATEWAY, &body).kind,
            ExchangeErrorKind::ExchangeNotAvailable
        );
        assert_eq!(
            status_error(StatusCode::GATEWAY_TIMEOUT, &body).kind,
            ExchangeErrorKind::RequestTimeout
        );
        assert_eq!(
            status_error(StatusCode::IM_A_TEAPOT, &body).kind,
            ExchangeErrorKind::ExchangeError
        );
    }

    #[test]
    fn gateway_body_names_the_kind() {
        let err = gateway_error(&json!({"error": "InvalidNonce", "message": "nonce too small"}))
            .unwrap();
        assert_eq!(err.kind, ExchangeErrorKind::InvalidNonce);
        assert_eq!(err.message, "nonce too small");
        assert!(gateway_error(&json!({"error": "SomethingElse"})).is_none());
        assert!(gateway_error(&json!([1, 2])).is_none());
    }

    #[test]
    fn route_prefixes_the_endpoint() {
        let mut exchange = HttpExchange::new(
            ExchangeConfig::new("gw"),
            "http://127.0.0.1:9/api/".to_string(),
            Capabilities::new(),
            RequiredCredentials::new(),
        );
        assert_eq!(
            exchange.endpoint("markets").unwrap().as_str(),
            "http://127.0.0.1:9/api/markets"
        );

        exchange.set_route("http://proxy.local/");
        assert_eq!(
            exchange.endpoint("fetchTicker").unwrap().as_str(),
            "http://proxy.local/http://127.0.0.1:9/api/fetchTicker"
        );
    }

    #[test]
    fn listings_accept_lists_and_maps() {
        let list: Listing<Currency> = serde_json::from_value(json!([{"code": "BTC"}])).unwrap();
        let map: Listing<Currency> =
            serde_json::from_value(json!({"ETH": {"code": "ETH"}})).unwrap();
        assert_eq!(list.into_vec()[0].code, "BTC");
        assert_eq!(map.into_vec()[0].code, "ETH");
    }

    #[test]
    fn keyed_listings_keep_gateway_order() {
        let markets: Listing<Market> = serde_json::from_str(
            r#"{"BTC/KRW": {"symbol": "BTC/KRW", "base": "BTC", "quote": "KRW"},
                "BTC/BRL": {"symbol": "BTC/BRL", "base": "BTC", "quote": "BRL"}}"#,
        )
        .unwrap();
        let symbols: Vec<String> = markets.into_vec().into_iter().map(|m| m.symbol).collect();
        assert_eq!(symbols, ["BTC/KRW", "BTC/BRL"]);
    }
}
