//! Market and currency records as loaded by a client.

use std::collections::HashMap;

use serde::Deserialize;

/// A tradable market.
///
/// `active` is tri-state: `None` means the client does not know, and the
/// harness treats such markets as active.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Market {
    pub symbol: String,
    pub base: String,
    #[serde(default)]
    pub quote: String,
    #[serde(default)]
    pub active: Option<bool>,
}

impl Market {
    pub fn new(symbol: impl Into<String>, base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            base: base.into(),
            quote: quote.into(),
            active: None,
        }
    }

    #[must_use]
    pub fn with_active(mut self, active: Option<bool>) -> Self {
        self.active = active;
        self
    }

    /// Active or unknown.
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        self.active.unwrap_or(true)
    }
}

/// A currency record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Currency {
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

impl Currency {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: None,
            active: None,
        }
    }
}

/// Markets in the client's listing order plus its ordered symbol list.
///
/// The two are kept separately because a misbehaving client can report a
/// symbol list that disagrees with its markets; the bootstrap phase checks
/// that they agree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarketSet {
    markets: Vec<Market>,
    index: HashMap<String, usize>,
    symbols: Vec<String>,
}

impl MarketSet {
    /// Build a consistent set; symbols are the sorted market symbols.
    #[must_use]
    pub fn new(markets: impl IntoIterator<Item = Market>) -> Self {
        let mut set = Self::from_parts(markets, Vec::new());
        let mut symbols: Vec<String> = set.index.keys().cloned().collect();
        symbols.sort();
        set.symbols = symbols;
        set
    }

    /// Build from raw parts without reconciling them.
    ///
    /// A repeated symbol replaces the earlier market in place.
    #[must_use]
    pub fn from_parts(markets: impl IntoIterator<Item = Market>, symbols: Vec<String>) -> Self {
        let mut ordered: Vec<Market> = Vec::new();
        let mut index = HashMap::new();
        for market in markets {
            match index.get(&market.symbol).copied() {
                Some(position) => ordered[position] = market,
                None => {
                    index.insert(market.symbol.clone(), ordered.len());
                    ordered.push(market);
                }
            }
        }
        Self {
            markets: ordered,
            index,
            symbols,
        }
    }

    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<&Market> {
        self.index.get(symbol).map(|&position| &self.markets[position])
    }

    /// Markets in the order the client listed them.
    pub fn markets(&self) -> impl Iterator<Item = &Market> {
        self.markets.iter()
    }

    #[must_use]
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    #[must_use]
    pub fn market_count(&self) -> usize {
        self.markets.len()
    }
}
