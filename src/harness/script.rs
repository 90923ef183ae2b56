//! The fixed conformance sequence.
//!
//! Phase A loads markets and checks their invariants. Phase B runs public
//! probes against the selected symbol. Phase C runs authenticated probes
//! when the client holds credentials, and Phase D runs the error-injection
//! scenarios when extended testing is enabled.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use super::dispatcher::Dispatcher;
use super::failover::Attempt;
use super::selector::{is_dated_contract, select_code, select_symbol, summarize_symbols};
use crate::error::{AssertionError, Result};
use crate::exchange::{CallArgs, Exchange, MarketSet, Method};
use crate::probe::{ProbeRegistry, Scenario, Step};

/// Clients whose order-book endpoints are skipped.
pub const UNRELIABLE_ORDER_BOOK: &[&str] = &["coinbase"];

/// Check the loaded market invariants.
pub fn verify_markets(
    markets: Option<&MarketSet>,
) -> std::result::Result<&MarketSet, AssertionError> {
    let markets = markets.ok_or(AssertionError::MarketsNotLoaded)?;
    if markets.symbols().is_empty() {
        return Err(AssertionError::EmptySymbols);
    }
    if markets.market_count() == 0 {
        return Err(AssertionError::EmptyMarkets);
    }
    if markets.symbols().len() != markets.market_count() {
        return Err(AssertionError::SymbolCountMismatch {
            symbols: markets.symbols().len(),
            markets: markets.market_count(),
        });
    }
    Ok(markets)
}

pub struct ConformanceScript {
    dispatcher: Dispatcher,
}

impl ConformanceScript {
    #[must_use]
    pub fn new(probes: Arc<ProbeRegistry>) -> Self {
        Self {
            dispatcher: Dispatcher::new(probes),
        }
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Phase A: load markets and assert their invariants.
    pub async fn load_exchange(&self, exchange: &mut dyn Exchange) -> Result<()> {
        let dispatched = self
            .dispatcher
            .run_step(Method::LoadMarkets, exchange, CallArgs::none())
            .await?;
        if dispatched.is_none() {
            debug!(exchange = %exchange.id(), "Loading markets directly");
            exchange.load_markets().await?;
        }

        let markets = verify_markets(exchange.markets())?;
        info!(
            exchange = %exchange.id(),
            symbols = markets.symbols().len(),
            "{} symbols {}",
            markets.symbols().len(),
            summarize_symbols(markets)
        );
        Ok(())
    }

    /// Phase B: public data probes for one symbol.
    pub async fn test_symbol(&self, exchange: &mut dyn Exchange, symbol: &str) -> Result<()> {
        let d = &self.dispatcher;
        d.run_step(Method::FetchCurrencies, exchange, CallArgs::none()).await?;
        d.run_step(Method::FetchTicker, exchange, CallArgs::symbol(symbol)).await?;
        d.run_step(Method::FetchTickers, exchange, CallArgs::symbol(symbol)).await?;
        d.run_step(Method::FetchOhlcv, exchange, CallArgs::symbol(symbol)).await?;
        d.run_step(Method::FetchTrades, exchange, CallArgs::symbol(symbol)).await?;

        if UNRELIABLE_ORDER_BOOK.iter().any(|id| *id == exchange.id()) {
            info!(exchange = %exchange.id(), "Order book probes disabled for this client");
            return Ok(());
        }

        d.run_step(Method::FetchOrderBook, exchange, CallArgs::symbol(symbol)).await?;
        d.run_step(Method::FetchL2OrderBook, exchange, CallArgs::symbol(symbol)).await?;
        d.run_step(Method::FetchOrderBooks, exchange, CallArgs::none()).await?;
        Ok(())
    }

    /// Phase C: authenticated probes. Returns the fetched balance, if any.
    async fn test_private(
        &self,
        exchange: &mut dyn Exchange,
        symbol: &str,
        code: Option<&str>,
    ) -> Result<Option<Value>> {
        exchange.check_required_credentials()?;

        let d = &self.dispatcher;
        let by_symbol = || CallArgs::symbol(symbol);
        let by_code = || CallArgs::code(code);

        d.run_step(Method::SignIn, exchange, CallArgs::none()).await?;
        let balance = d.run_step(Method::FetchBalance, exchange, CallArgs::none()).await?;
        d.run_step(Method::FetchAccounts, exchange, CallArgs::none()).await?;
        d.run_step(Method::FetchTransactionFees, exchange, CallArgs::none()).await?;
        d.run_step(Method::FetchTradingFees, exchange, CallArgs::none()).await?;
        d.run_step(Method::FetchStatus, exchange, CallArgs::none()).await?;
        d.run_step(Method::FetchOpenInterestHistory, exchange, by_symbol()).await?;
        d.run_step(Method::FetchOrders, exchange, by_symbol()).await?;
        d.run_step(Method::FetchOpenOrders, exchange, by_symbol()).await?;
        d.run_step(Method::FetchClosedOrders, exchange, by_symbol()).await?;
        d.run_step(Method::FetchMyTrades, exchange, by_symbol()).await?;
        d.run_step(Method::FetchLeverageTiers, exchange, by_symbol()).await?;
        d.run_step(Method::FetchOpenInterestHistory, exchange, by_symbol()).await?;
        d.run_step(Method::FetchPositions, exchange, by_symbol()).await?;

        if d.probes().contains(Step::Call(Method::FetchLedger)) {
            d.run_step(Method::FetchLedger, exchange, by_code()).await?;
        }

        d.run_step(Method::FetchTransactions, exchange, by_code()).await?;
        d.run_step(Method::FetchDeposits, exchange, by_code()).await?;
        d.run_step(Method::FetchWithdrawals, exchange, by_code()).await?;
        d.run_step(Method::FetchBorrowRate, exchange, by_code()).await?;
        d.run_step(Method::FetchBorrowRates, exchange, CallArgs::none()).await?;
        d.run_step(Method::FetchBorrowInterest, exchange, by_code()).await?;
        d.run_step(Method::FetchBorrowInterest, exchange, by_code().with_symbol(symbol))
            .await?;

        Ok(balance)
    }

    /// Phase D: error-injection scenarios.
    async fn test_extended(
        &self,
        exchange: &mut dyn Exchange,
        symbol: &str,
        balance: Option<Value>,
    ) -> Result<()> {
        let d = &self.dispatcher;
        d.run_step(Scenario::InvalidNonce, exchange, CallArgs::symbol(symbol)).await?;
        d.run_step(Scenario::OrderNotFound, exchange, CallArgs::symbol(symbol)).await?;
        d.run_step(Scenario::InvalidOrder, exchange, CallArgs::symbol(symbol)).await?;
        d.run_step(
            Scenario::InsufficientFunds,
            exchange,
            CallArgs::symbol(symbol).with_balance(balance),
        )
        .await?;
        Ok(())
    }

    /// One full conformance pass.
    pub async fn run(&self, exchange: &mut dyn Exchange) -> Result<()> {
        self.load_exchange(exchange).await?;

        let code = select_code(exchange.currencies());
        let symbol = exchange
            .markets()
            .and_then(select_symbol)
            .ok_or(AssertionError::EmptySymbols)?;
        info!(exchange = %exchange.id(), code = code.unwrap_or("-"), "SYMBOL: {symbol}");

        if is_dated_contract(&symbol) {
            info!(%symbol, "Dated contract, skipping public probes");
        } else {
            self.test_symbol(exchange, &symbol).await?;
        }

        if !exchange.credentials().is_authenticated() {
            debug!(exchange = %exchange.id(), "No credentials, skipping private probes");
            return Ok(());
        }

        let balance = self.test_private(exchange, &symbol, code).await?;

        if exchange.extended_test() {
            self.test_extended(exchange, &symbol, balance).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Attempt for ConformanceScript {
    async fn attempt(&self, exchange: &mut dyn Exchange) -> Result<()> {
        self.dispatcher.clear_journal();
        self.run(exchange).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::Market;

    #[test]
    fn unloaded_markets_fail() {
        assert_eq!(verify_markets(None).err(), Some(AssertionError::MarketsNotLoaded));
    }

    #[test]
    fn empty_symbols_fail() {
        let empty = MarketSet::default();
        assert_eq!(verify_markets(Some(&empty)).err(), Some(AssertionError::EmptySymbols));
    }

    #[test]
    fn symbol_count_must_match_market_count() {
        let markets = MarketSet::from_parts(
            [Market::new("BTC/USD", "BTC", "USD")],
            vec!["BTC/USD".into(), "ETH/BTC".into()],
        );

        assert_eq!(
            verify_markets(Some(&markets)).err(),
            Some(AssertionError::SymbolCountMismatch {
                symbols: 2,
                markets: 1
            })
        );
    }

    #[test]
    fn consistent_markets_pass() {
        let markets = MarketSet::new([Market::new("BTC/USD", "BTC", "USD")]);
        assert!(verify_markets(Some(&markets)).is_ok());
    }
}
