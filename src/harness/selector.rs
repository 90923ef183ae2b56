//! Representative symbol and currency selection.
//!
//! Market data may be sparse or flag markets inactive, so selection walks an
//! ordered fallback chain and only the last link picks without checking
//! eligibility.

use std::collections::BTreeMap;

use tracing::debug;

use crate::exchange::{Currency, MarketSet};

/// Symbols tried first, in preference order.
pub const PREFERRED_SYMBOLS: &[&str] = &[
    "BTC/USD", "BTC/USDT", "BTC/CNY", "BTC/EUR", "BTC/ETH", "ETH/BTC", "ETH/USD", "ETH/USDT",
    "BTC/JPY", "LTC/BTC", "ZRX/WETH", "EUR/USD",
];

/// Currency codes in preference order. Used both for base-currency symbol
/// fallback and for code selection.
pub const PREFERRED_CODES: &[&str] = &[
    "BTC", "ETH", "XRP", "LTC", "BCH", "EOS", "BNB", "BSV", "USDT", "ATOM", "BAT", "BTG", "DASH",
    "DOGE", "ETC", "IOTA", "LSK", "MKR", "NEO", "PAX", "QTUM", "TRX", "TUSD", "USD", "USDC",
    "WAVES", "XEM", "XMR", "ZEC", "ZRX",
];

/// Symbols highlighted in the bootstrap summary line.
pub const WELL_KNOWN_SYMBOLS: &[&str] = &[
    "BTC/CNY", "BTC/USD", "BTC/USDT", "BTC/EUR", "BTC/ETH", "ETH/BTC", "BTC/JPY", "ETH/EUR",
    "ETH/JPY", "ETH/CNY", "ETH/USD", "LTC/CNY", "DASH/BTC", "DOGE/BTC", "BTC/AUD", "BTC/PLN",
    "USD/SLL", "BTC/RUB", "BTC/UAH", "LTC/BTC", "EUR/USD",
];

/// Marker for delivery/dated contract symbols.
const DATED_CONTRACT_MARKER: &str = ".d";

/// First candidate present in `markets` whose market is eligible.
pub fn first_eligible<'a, I>(markets: &MarketSet, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    candidates
        .into_iter()
        .find(|symbol| markets.get(symbol).is_some_and(|market| market.is_eligible()))
        .map(str::to_string)
}

/// Pick one symbol to run public probes against.
///
/// `None` only when the client reports no symbols at all.
#[must_use]
pub fn select_symbol(markets: &MarketSet) -> Option<String> {
    if let Some(symbol) = first_eligible(markets, PREFERRED_SYMBOLS.iter().copied()) {
        debug!(%symbol, "Selected preferred symbol");
        return Some(symbol);
    }

    // The first code with any markets ends this stage, found or not.
    for code in PREFERRED_CODES {
        let symbols: Vec<&str> = markets
            .markets()
            .filter(|market| market.base == *code)
            .map(|market| market.symbol.as_str())
            .collect();
        if symbols.is_empty() {
            continue;
        }
        if let Some(symbol) = first_eligible(markets, symbols) {
            debug!(%symbol, code, "Selected symbol by base currency");
            return Some(symbol);
        }
        break;
    }

    let not_active: Vec<&str> = markets
        .markets()
        .filter(|market| !market.active.unwrap_or(false))
        .map(|market| market.symbol.as_str())
        .collect();
    if let Some(symbol) = first_eligible(markets, not_active) {
        debug!(%symbol, "Selected symbol among markets not flagged active");
        return Some(symbol);
    }

    if let Some(symbol) = first_eligible(markets, markets.symbols().iter().map(String::as_str)) {
        debug!(%symbol, "Selected first eligible symbol");
        return Some(symbol);
    }

    let fallback = markets.symbols().first().cloned();
    if let Some(symbol) = &fallback {
        debug!(%symbol, "No eligible market, using first symbol");
    }
    fallback
}

/// Pick a currency code: the last preferred code the client lists.
#[must_use]
pub fn select_code(currencies: &BTreeMap<String, Currency>) -> Option<&'static str> {
    PREFERRED_CODES
        .iter()
        .rev()
        .find(|code| currencies.contains_key(**code))
        .copied()
}

/// Whether a symbol names a delivery/dated contract.
#[must_use]
pub fn is_dated_contract(symbol: &str) -> bool {
    symbol.contains(DATED_CONTRACT_MARKER)
}

/// Well-known symbols the client lists, with a `+ more...` suffix when it
/// lists others too.
#[must_use]
pub fn summarize_symbols(markets: &MarketSet) -> String {
    let known: Vec<&str> = markets
        .symbols()
        .iter()
        .map(String::as_str)
        .filter(|symbol| WELL_KNOWN_SYMBOLS.contains(symbol))
        .collect();

    if known.is_empty() {
        return String::new();
    }
    let joined = known.join(", ");
    if markets.symbols().len() > known.len() {
        format!("{joined} + more...")
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::Market;

    fn market(symbol: &str, active: Option<bool>) -> Market {
        let (base, quote) = symbol.split_once('/').unwrap_or((symbol, ""));
        Market::new(symbol, base, quote).with_active(active)
    }

    fn set(markets: Vec<Market>) -> MarketSet {
        MarketSet::new(markets)
    }

    #[test]
    fn unknown_activity_counts_as_active() {
        let markets = set(vec![market("BTC/USD", None), market("FOO/BAR", Some(true))]);
        assert_eq!(select_symbol(&markets).as_deref(), Some("BTC/USD"));
    }

    #[test]
    fn preference_order_beats_listing_order() {
        let markets = set(vec![
            market("ETH/BTC", Some(true)),
            market("BTC/USD", Some(false)),
            market("BTC/USDT", Some(true)),
        ]);
        assert_eq!(select_symbol(&markets).as_deref(), Some("BTC/USDT"));
    }

    #[test]
    fn earlier_code_markets_are_tried_first() {
        let markets = set(vec![market("XRP/JPY", Some(true)), market("ETH/KRW", Some(true))]);
        assert_eq!(select_symbol(&markets).as_deref(), Some("ETH/KRW"));
    }

    #[test]
    fn base_stage_follows_listing_order() {
        let markets = set(vec![market("BTC/KRW", None), market("BTC/BRL", None)]);
        assert_eq!(select_symbol(&markets).as_deref(), Some("BTC/KRW"));
    }

    #[test]
    fn first_code_with_markets_ends_base_stage() {
        // ETH markets exist but are all inactive; XRP is never consulted
        // and the not-active stage finds nothing eligible either.
        let markets = set(vec![market("ETH/KRW", Some(false)), market("XRP/JPY", Some(true))]);
        assert_eq!(select_symbol(&markets).as_deref(), Some("XRP/JPY"));
    }

    #[test]
    fn not_active_stage_picks_unknown_activity() {
        let markets = set(vec![market("AAA/BBB", Some(false)), market("CCC/DDD", None)]);
        assert_eq!(select_symbol(&markets).as_deref(), Some("CCC/DDD"));
    }

    #[test]
    fn all_inactive_falls_back_to_first_symbol() {
        let markets = set(vec![market("ZZZ/YYY", Some(false)), market("AAA/BBB", Some(false))]);
        assert_eq!(select_symbol(&markets).as_deref(), Some("AAA/BBB"));
    }

    #[test]
    fn empty_market_set_selects_nothing() {
        assert_eq!(select_symbol(&MarketSet::default()), None);
    }

    #[test]
    fn code_selection_is_last_match() {
        let currencies: BTreeMap<String, Currency> = ["BTC", "USDT", "ETH"]
            .into_iter()
            .map(|code| (code.to_string(), Currency::new(code)))
            .collect();
        assert_eq!(select_code(&currencies), Some("USDT"));
        assert_eq!(select_code(&BTreeMap::new()), None);
    }

    #[test]
    fn dated_contracts_are_detected() {
        assert!(is_dated_contract("BTC/USD.d"));
        assert!(is_dated_contract("ETH.d/USD"));
        assert!(!is_dated_contract("BTC/USD"));
    }

    #[test]
    fn summary_marks_additional_symbols() {
        let markets = set(vec![market("BTC/USD", None), market("FOO/BAR", None)]);
        assert_eq!(summarize_symbols(&markets), "BTC/USD + more...");

        let only_known = set(vec![market("BTC/USD", None), market("ETH/BTC", None)]);
        assert_eq!(summarize_symbols(&only_known), "BTC/USD, ETH/BTC");

        let unknown = set(vec![market("FOO/BAR", None)]);
        assert_eq!(summarize_symbols(&unknown), "");
    }
}
