//! Typed capability descriptor.
//!
//! Every unified operation a client may declare is a [`Method`]. A client's
//! declaration is a [`Capabilities`] set; anything absent is unsupported.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

macro_rules! methods {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// A unified client operation.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum Method {
            $($variant),+
        }

        impl Method {
            /// Every known method, in declaration order.
            pub const ALL: &'static [Method] = &[$(Method::$variant),+];

            /// Wire name of the method (`fetchTicker`, `loadMarkets`, ...).
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Method::$variant => $name),+
                }
            }
        }

        impl FromStr for Method {
            type Err = UnknownMethod;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Method::$variant),)+
                    _ => Err(UnknownMethod(s.to_string())),
                }
            }
        }
    };
}

methods! {
    LoadMarkets => "loadMarkets",
    FetchCurrencies => "fetchCurrencies",
    FetchTicker => "fetchTicker",
    FetchTickers => "fetchTickers",
    FetchOhlcv => "fetchOHLCV",
    FetchTrades => "fetchTrades",
    FetchOrderBook => "fetchOrderBook",
    FetchL2OrderBook => "fetchL2OrderBook",
    FetchOrderBooks => "fetchOrderBooks",
    SignIn => "signIn",
    FetchBalance => "fetchBalance",
    FetchAccounts => "fetchAccounts",
    FetchTransactionFees => "fetchTransactionFees",
    FetchTradingFees => "fetchTradingFees",
    FetchStatus => "fetchStatus",
    FetchOpenInterestHistory => "fetchOpenInterestHistory",
    FetchOrders => "fetchOrders",
    FetchOpenOrders => "fetchOpenOrders",
    FetchClosedOrders => "fetchClosedOrders",
    FetchMyTrades => "fetchMyTrades",
    FetchLeverageTiers => "fetchLeverageTiers",
    FetchPositions => "fetchPositions",
    FetchLedger => "fetchLedger",
    FetchTransactions => "fetchTransactions",
    FetchDeposits => "fetchDeposits",
    FetchWithdrawals => "fetchWithdrawals",
    FetchBorrowRate => "fetchBorrowRate",
    FetchBorrowRates => "fetchBorrowRates",
    FetchBorrowInterest => "fetchBorrowInterest",
    CreateOrder => "createOrder",
    CancelOrder => "cancelOrder",
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Method {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown method: {0}")]
pub struct UnknownMethod(pub String);

/// The set of methods a client declares support for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    supported: BTreeSet<Method>,
}

impl Capabilities {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare support for a method.
    #[must_use]
    pub fn with(mut self, method: Method) -> Self {
        self.supported.insert(method);
        self
    }

    pub fn insert(&mut self, method: Method) {
        self.supported.insert(method);
    }

    #[must_use]
    pub fn supports(&self, method: Method) -> bool {
        self.supported.contains(&method)
    }

    pub fn iter(&self) -> impl Iterator<Item = Method> + '_ {
        self.supported.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.supported.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.supported.is_empty()
    }

    /// Build from a raw `has` map.
    ///
    /// Truthy values (`true`, `"emulated"`, any non-empty string, non-zero
    /// numbers) declare support. Unknown method names are ignored.
    #[must_use]
    pub fn from_has_map(has: &HashMap<String, Value>) -> Self {
        let mut capabilities = Self::new();
        for (name, value) in has {
            let declared = match value {
                Value::Bool(flag) => *flag,
                Value::String(s) => !s.is_empty(),
                Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
                Value::Null => false,
                _ => true,
            };
            if !declared {
                continue;
            }
            match name.parse::<Method>() {
                Ok(method) => capabilities.insert(method),
                Err(err) => debug!(error = %err, "Ignoring undeclared capability"),
            }
        }
        capabilities
    }
}

impl FromIterator<Method> for Capabilities {
    fn from_iter<I: IntoIterator<Item = Method>>(iter: I) -> Self {
        Self {
            supported: iter.into_iter().collect(),
        }
    }
}

impl<'de> Deserialize<'de> for Capabilities {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = HashMap::<String, Value>::deserialize(deserializer).map_err(de::Error::custom)?;
        Ok(Self::from_has_map(&raw))
    }
}
