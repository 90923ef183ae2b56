//! Default probes: call the method, then check the response shape.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::{Probe, ProbeRegistry, Scenario, ScenarioProbe};
use crate::error::{AssertionError, Result};
use crate::exchange::{CallArgs, Exchange, Method};

/// Structural expectation on a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Anything, including null.
    Any,
    Object,
    Array,
    /// An object that carries `key`.
    ObjectWith(&'static str),
    /// A ticker object whose `symbol` matches the requested one.
    Ticker,
    /// An object with `bids` and `asks` arrays.
    OrderBook,
    /// An array of `[timestamp, open, high, low, close, volume]` rows.
    Candles,
}

impl Shape {
    pub fn check(
        self,
        step: &'static str,
        value: &Value,
        args: &CallArgs,
    ) -> std::result::Result<(), AssertionError> {
        let fail = |reason: String| AssertionError::Shape { step, reason };

        match self {
            Self::Any => Ok(()),
            Self::Object => value
                .is_object()
                .then_some(())
                .ok_or_else(|| fail(format!("expected an object, got {}", kind_of(value)))),
            Self::Array => value
                .is_array()
                .then_some(())
                .ok_or_else(|| fail(format!("expected an array, got {}", kind_of(value)))),
            Self::ObjectWith(key) => {
                Self::Object.check(step, value, args)?;
                if value.get(key).is_none() {
                    return Err(fail(format!("missing '{key}'")));
                }
                Ok(())
            }
            Self::Ticker => {
                Self::Object.check(step, value, args)?;
                let (Some(expected), Some(actual)) =
                    (args.symbol.as_deref(), value.get("symbol").and_then(Value::as_str))
                else {
                    return Ok(());
                };
                if expected != actual {
                    return Err(fail(format!("ticker for '{actual}', requested '{expected}'")));
                }
                Ok(())
            }
            Self::OrderBook => {
                Self::Object.check(step, value, args)?;
                for side in ["bids", "asks"] {
                    if !value.get(side).is_some_and(Value::is_array) {
                        return Err(fail(format!("'{side}' is not an array")));
                    }
                }
                Ok(())
            }
            Self::Candles => {
                let rows = value
                    .as_array()
                    .ok_or_else(|| fail(format!("expected an array, got {}", kind_of(value))))?;
                for (i, row) in rows.iter().enumerate() {
                    let len = row.as_array().map(Vec::len);
                    if len != Some(6) {
                        return Err(fail(format!("candle {i} is not a 6-element row")));
                    }
                }
                Ok(())
            }
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Call one method and check the response shape.
#[derive(Debug, Clone, Copy)]
pub struct ShapeProbe {
    method: Method,
    shape: Shape,
}

impl ShapeProbe {
    #[must_use]
    pub const fn new(method: Method, shape: Shape) -> Self {
        Self { method, shape }
    }
}

#[async_trait]
impl Probe for ShapeProbe {
    async fn run(&self, exchange: &mut dyn Exchange, args: &CallArgs) -> Result<Value> {
        let value = exchange.request(self.method, args).await?;
        self.shape.check(self.method.as_str(), &value, args)?;
        Ok(value)
    }
}

/// Load markets through the client and report how many arrived.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadMarketsProbe;

#[async_trait]
impl Probe for LoadMarketsProbe {
    async fn run(&self, exchange: &mut dyn Exchange, _args: &CallArgs) -> Result<Value> {
        exchange.load_markets().await?;
        let count = exchange.markets().map_or(0, |markets| markets.market_count());
        debug!(exchange = %exchange.id(), markets = count, "loadMarkets returned");
        Ok(json!({ "markets": count }))
    }
}

const SHAPES: &[(Method, Shape)] = &[
    (Method::FetchCurrencies, Shape::Object),
    (Method::FetchTicker, Shape::Ticker),
    (Method::FetchTickers, Shape::Object),
    (Method::FetchOhlcv, Shape::Candles),
    (Method::FetchTrades, Shape::Array),
    (Method::FetchOrderBook, Shape::OrderBook),
    (Method::FetchL2OrderBook, Shape::OrderBook),
    (Method::FetchOrderBooks, Shape::Object),
    (Method::SignIn, Shape::Any),
    (Method::FetchBalance, Shape::Object),
    (Method::FetchAccounts, Shape::Array),
    (Method::FetchTransactionFees, Shape::Object),
    (Method::FetchTradingFees, Shape::Object),
    (Method::FetchStatus, Shape::ObjectWith("status")),
    (Method::FetchOpenInterestHistory, Shape::Array),
    (Method::FetchOrders, Shape::Array),
    (Method::FetchOpenOrders, Shape::Array),
    (Method::FetchClosedOrders, Shape::Array),
    (Method::FetchMyTrades, Shape::Array),
    (Method::FetchLeverageTiers, Shape::Object),
    (Method::FetchPositions, Shape::Array),
    (Method::FetchTransactions, Shape::Array),
    (Method::FetchDeposits, Shape::Array),
    (Method::FetchWithdrawals, Shape::Array),
    (Method::FetchBorrowRate, Shape::ObjectWith("currency")),
    (Method::FetchBorrowRates, Shape::Object),
    (Method::FetchBorrowInterest, Shape::Array),
];

pub(super) fn register_all(mut registry: ProbeRegistry) -> ProbeRegistry {
    registry.register(Method::LoadMarkets, LoadMarketsProbe);
    for &(method, shape) in SHAPES {
        registry.register(method, ShapeProbe::new(method, shape));
    }
    for scenario in [
        Scenario::InvalidNonce,
        Scenario::OrderNotFound,
        Scenario::InvalidOrder,
        Scenario::InsufficientFunds,
    ] {
        registry.register(scenario, ScenarioProbe::new(scenario));
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(shape: Shape, value: Value) -> std::result::Result<(), AssertionError> {
        shape.check("fetchTest", &value, &CallArgs::symbol("BTC/USD"))
    }

    #[test]
    fn ticker_symbol_must_match() {
        assert!(check(Shape::Ticker, json!({"symbol": "BTC/USD", "last": 1})).is_ok());
        assert!(check(Shape::Ticker, json!({"last": 1})).is_ok());
        assert!(matches!(
            check(Shape::Ticker, json!({"symbol": "ETH/BTC"})),
            Err(AssertionError::Shape { step: "fetchTest", .. })
        ));
    }

    #[test]
    fn order_book_needs_both_sides() {
        assert!(check(Shape::OrderBook, json!({"bids": [], "asks": []})).is_ok());
        assert!(check(Shape::OrderBook, json!({"bids": []})).is_err());
    }

    #[test]
    fn candles_are_six_wide() {
        assert!(check(Shape::Candles, json!([[1, 2, 3, 4, 5, 6]])).is_ok());
        assert!(check(Shape::Candles, json!([[1, 2, 3]])).is_err());
        assert!(check(Shape::Candles, json!({})).is_err());
    }

    #[test]
    fn status_needs_status_key() {
        assert!(check(Shape::ObjectWith("status"), json!({"status": "ok"})).is_ok());
        assert!(check(Shape::ObjectWith("status"), json!({"updated": 1})).is_err());
        assert!(check(Shape::ObjectWith("status"), json!([])).is_err());
    }
}
