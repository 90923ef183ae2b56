//! Error-injection probes.
//!
//! Each scenario sends a request the exchange must reject with one specific
//! error kind. The expected rejection is a pass; success is an assertion
//! failure; any other error propagates to the failover controller.

use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::{Probe, Scenario};
use crate::error::{AssertionError, ExchangeErrorKind, Result};
use crate::exchange::{CallArgs, Exchange, Method};

/// Order id no exchange will know.
const UNKNOWN_ORDER_ID: &str = "1";

/// Amount large enough that an empty account cannot cover it.
const OVERSIZED_AMOUNT: u64 = 1_000_000_000;

#[derive(Debug, Clone, Copy)]
pub struct ScenarioProbe {
    scenario: Scenario,
}

impl ScenarioProbe {
    #[must_use]
    pub const fn new(scenario: Scenario) -> Self {
        Self { scenario }
    }

    fn expected(&self) -> ExchangeErrorKind {
        match self.scenario {
            Scenario::InvalidNonce => ExchangeErrorKind::InvalidNonce,
            Scenario::OrderNotFound => ExchangeErrorKind::OrderNotFound,
            Scenario::InvalidOrder => ExchangeErrorKind::InvalidOrder,
            Scenario::InsufficientFunds => ExchangeErrorKind::InsufficientFunds,
        }
    }

    fn request_args(&self, args: &CallArgs) -> CallArgs {
        let base = CallArgs {
            symbol: args.symbol.clone(),
            ..CallArgs::none()
        };
        match self.scenario {
            Scenario::InvalidNonce => base.with_param("nonce", 1),
            Scenario::OrderNotFound => base.with_param("id", UNKNOWN_ORDER_ID),
            Scenario::InvalidOrder => base
                .with_param("type", "limit")
                .with_param("side", "buy")
                .with_param("amount", 0)
                .with_param("price", 0),
            Scenario::InsufficientFunds => base
                .with_param("type", "limit")
                .with_param("side", "buy")
                .with_param("amount", OVERSIZED_AMOUNT)
                .with_param("price", 1),
        }
    }
}

#[async_trait]
impl Probe for ScenarioProbe {
    async fn run(&self, exchange: &mut dyn Exchange, args: &CallArgs) -> Result<Value> {
        let step = self.scenario.as_str();

        if self.scenario == Scenario::InsufficientFunds {
            let empty = args.balance.as_ref().is_some_and(balance_is_empty);
            if !empty {
                warn!(
                    exchange = %exchange.id(),
                    "Balance is non-empty or unknown, not placing an oversized order"
                );
                return Ok(json!({ "skipped": step }));
            }
        }

        let method: Method = self.scenario.method();
        let expected = self.expected();
        match exchange.request(method, &self.request_args(args)).await {
            Ok(_) => Err(AssertionError::ExpectedFailure { step, expected }.into()),
            Err(err) if err.kind == expected => {
                info!(exchange = %exchange.id(), scenario = step, "Rejected as expected");
                Ok(json!({ "rejected": expected.name(), "message": err.message }))
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Whether a unified balance holds nothing.
///
/// Reads the `total` map when present, otherwise per-currency entries with a
/// `total` field. Unparseable amounts count as holdings.
#[must_use]
pub fn balance_is_empty(balance: &Value) -> bool {
    let Some(object) = balance.as_object() else {
        return false;
    };

    if let Some(total) = object.get("total").and_then(Value::as_object) {
        return total.values().all(is_zero);
    }

    object
        .iter()
        .filter(|(key, _)| !BALANCE_METADATA.contains(&key.as_str()))
        .filter_map(|(_, entry)| entry.get("total"))
        .all(is_zero)
}

const BALANCE_METADATA: &[&str] = &["info", "free", "used", "timestamp", "datetime"];

fn is_zero(amount: &Value) -> bool {
    match amount {
        Value::Null => true,
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .is_ok_and(|d| d.is_zero()),
        Value::String(s) => Decimal::from_str(s).is_ok_and(|d| d.is_zero()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_total_map_is_empty() {
        assert!(balance_is_empty(&json!({"info": {}, "total": {}})));
        assert!(balance_is_empty(&json!({"total": {"BTC": 0, "USD": "0.00"}})));
        assert!(balance_is_empty(&json!({"total": {"BTC": null}})));
    }

    #[test]
    fn any_holding_is_not_empty() {
        assert!(!balance_is_empty(&json!({"total": {"BTC": 0, "ETH": 0.5}})));
        assert!(!balance_is_empty(&json!({"total": {"DOGE": 1e-8}})));
        assert!(!balance_is_empty(&json!({"BTC": {"free": 1, "total": 1}})));
    }

    #[test]
    fn per_currency_entries_are_read_without_total_map() {
        assert!(balance_is_empty(&json!({"info": {"raw": 5}, "BTC": {"total": 0}})));
    }

    #[test]
    fn non_object_balance_is_not_empty() {
        assert!(!balance_is_empty(&json!([])));
    }

    #[test]
    fn invalid_order_sends_zero_amount() {
        let probe = ScenarioProbe::new(Scenario::InvalidOrder);
        let args = probe.request_args(&CallArgs::symbol("BTC/USD"));
        assert_eq!(args.symbol.as_deref(), Some("BTC/USD"));
        assert_eq!(args.params.get("amount"), Some(&json!(0)));
    }
}
