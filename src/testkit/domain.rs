//! Builders for exchange data.

use crate::exchange::{Credentials, Market, MarketSet};

/// A market whose base and quote are split from `symbol`.
pub fn market(symbol: &str) -> Market {
    let (base, quote) = symbol.split_once('/').unwrap_or((symbol, ""));
    Market::new(symbol, base, quote)
}

/// Like [`market`] with an explicit `active` flag.
pub fn market_with(symbol: &str, active: Option<bool>) -> Market {
    market(symbol).with_active(active)
}

/// A consistent market set of active-unknown markets.
pub fn market_set(symbols: &[&str]) -> MarketSet {
    MarketSet::new(symbols.iter().map(|symbol| market(symbol)))
}

/// Credentials holding only an API key.
pub fn api_key(key: &str) -> Credentials {
    Credentials {
        api_key: Some(key.to_string()),
        ..Credentials::default()
    }
}
