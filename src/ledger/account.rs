//! Per-investor balance state and the transaction replay rules.

use crate::ledger::lots::LotStack;
use crate::types::{LedgerEntry, TradeKind, Transaction};
use crate::{Error, Result};
use std::collections::HashMap;

/// Mutable balance state for one investor.
///
/// Balances are updated only by [`InvestorLedger::apply`], which runs
/// exactly one of the four replay rules per transaction kind. Short sales
/// move no cash at open time; `short_pnl` accumulates only the realized
/// basis-minus-cover difference.
#[derive(Debug, Clone)]
pub struct InvestorLedger {
    /// Cash balance, seeded with the configured starting amount
    pub cash: f64,
    /// Mark-to-market value of currently held long positions
    pub holdings_value: f64,
    /// Cumulative realized short P&L
    pub short_pnl: f64,
    long_lots: HashMap<String, LotStack>,
    short_lots: HashMap<String, LotStack>,
    held_quantity: HashMap<String, f64>,
    last_price: HashMap<String, f64>,
}

impl InvestorLedger {
    /// Create a fresh ledger with the given starting cash.
    pub fn new(starting_cash: f64) -> Self {
        Self {
            cash: starting_cash,
            holdings_value: 0.0,
            short_pnl: 0.0,
            long_lots: HashMap::new(),
            short_lots: HashMap::new(),
            held_quantity: HashMap::new(),
            last_price: HashMap::new(),
        }
    }

    /// cash + holdings value + realized short P&L.
    pub fn net_worth(&self) -> f64 {
        self.cash + self.holdings_value + self.short_pnl
    }

    /// Net long units currently held for a symbol.
    pub fn held_quantity(&self, symbol: &str) -> f64 {
        self.held_quantity.get(symbol).copied().unwrap_or_default()
    }

    /// Price of the most recent transaction touching a symbol.
    pub fn last_price(&self, symbol: &str) -> f64 {
        self.last_price.get(symbol).copied().unwrap_or_default()
    }

    /// Units available across open long lots for a symbol.
    pub fn long_available(&self, symbol: &str) -> f64 {
        self.long_lots.get(symbol).map_or(0.0, LotStack::available)
    }

    /// Units available across open short lots for a symbol.
    pub fn short_available(&self, symbol: &str) -> f64 {
        self.short_lots.get(symbol).map_or(0.0, LotStack::available)
    }

    /// Apply one non-excluded transaction and return the annotated entry.
    ///
    /// On `InsufficientLots` the ledger is left exactly as it was before the
    /// call; lot reduction runs before any balance is touched.
    pub fn apply(&mut self, t: &Transaction) -> Result<LedgerEntry> {
        let cash_before = self.cash;
        let holdings_before = self.holdings_value;

        match t.kind {
            TradeKind::Buy => {
                self.cash -= t.notional();
                self.long_lots
                    .entry(t.symbol.clone())
                    .or_default()
                    .push(t.quantity, t.price);
                *self.held_quantity.entry(t.symbol.clone()).or_default() += t.quantity;
                self.holdings_value += t.notional();
                self.last_price.insert(t.symbol.clone(), t.price);
            }
            TradeKind::Sell => {
                let basis = reduce_or_fail(&mut self.long_lots, t)?;
                self.cash += t.notional();
                // Mark the still-held remainder to the new price, then take
                // out the basis of what was sold.
                let held = self.held_quantity(&t.symbol);
                let last = self.last_price(&t.symbol);
                self.holdings_value += (t.price - last) * (held - t.quantity);
                self.holdings_value -= basis;
                *self.held_quantity.entry(t.symbol.clone()).or_default() -= t.quantity;
                self.last_price.insert(t.symbol.clone(), t.price);
            }
            TradeKind::Short => {
                // Proceeds are recognized only on cover.
                self.short_lots
                    .entry(t.symbol.clone())
                    .or_default()
                    .push(t.quantity, t.price);
            }
            TradeKind::Cover => {
                let basis = reduce_or_fail(&mut self.short_lots, t)?;
                self.short_pnl += basis - t.notional();
            }
        }

        Ok(LedgerEntry {
            transaction: t.clone(),
            cash_before,
            cash_after: self.cash,
            holdings_value_before: holdings_before,
            holdings_value_after: self.holdings_value,
            short_pnl_after: self.short_pnl,
            net_worth_after: self.net_worth(),
        })
    }
}

/// Reduce the transaction's symbol stack, surfacing a shortfall as an
/// [`Error::InsufficientLots`] that names the offending transaction.
fn reduce_or_fail(stacks: &mut HashMap<String, LotStack>, t: &Transaction) -> Result<f64> {
    stacks
        .entry(t.symbol.clone())
        .or_default()
        .reduce(t.quantity)
        .map_err(|shortfall| Error::InsufficientLots {
            investor: t.investor.clone(),
            symbol: t.symbol.clone(),
            requested: shortfall.requested,
            available: shortfall.available,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 1, 4)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn trx(kind: TradeKind, quantity: f64, price: f64) -> Transaction {
        Transaction::new("a", "AAPL", kind, ts(), quantity, price)
    }

    #[test]
    fn test_buy() {
        let mut ledger = InvestorLedger::new(100_000.0);
        let entry = ledger.apply(&trx(TradeKind::Buy, 10.0, 10.0)).unwrap();

        assert_eq!(entry.cash_before, 100_000.0);
        assert_eq!(entry.cash_after, 99_900.0);
        assert_eq!(entry.holdings_value_after, 100.0);
        assert_eq!(entry.net_worth_after, 100_000.0);
        assert_eq!(ledger.held_quantity("AAPL"), 10.0);
        assert_eq!(ledger.last_price("AAPL"), 10.0);
        assert_eq!(ledger.long_available("AAPL"), 10.0);
    }

    #[test]
    fn test_sell_full_position() {
        let mut ledger = InvestorLedger::new(100_000.0);
        ledger.apply(&trx(TradeKind::Buy, 10.0, 10.0)).unwrap();
        let entry = ledger.apply(&trx(TradeKind::Sell, 10.0, 12.0)).unwrap();

        assert_eq!(entry.cash_after, 100_020.0);
        assert_eq!(entry.holdings_value_after, 0.0);
        assert_eq!(entry.net_worth_after, 100_020.0);
        assert_eq!(ledger.held_quantity("AAPL"), 0.0);
    }

    #[test]
    fn test_partial_sell_marks_remainder_to_market() {
        let mut ledger = InvestorLedger::new(100_000.0);
        ledger.apply(&trx(TradeKind::Buy, 10.0, 10.0)).unwrap();
        let entry = ledger.apply(&trx(TradeKind::Sell, 4.0, 12.0)).unwrap();

        // 6 remaining units revalued from $10 to $12 (+12), basis of the 4
        // sold units removed (-40): 100 + 12 - 40 = 72.
        assert_eq!(entry.holdings_value_after, 72.0);
        assert_eq!(entry.cash_after, 99_900.0 + 48.0);
        assert_eq!(ledger.held_quantity("AAPL"), 6.0);
        assert_eq!(ledger.last_price("AAPL"), 12.0);
    }

    #[test]
    fn test_sell_consumes_most_recent_lot_first() {
        let mut ledger = InvestorLedger::new(100_000.0);
        ledger.apply(&trx(TradeKind::Buy, 10.0, 5.0)).unwrap();
        ledger.apply(&trx(TradeKind::Buy, 10.0, 8.0)).unwrap();
        let entry = ledger.apply(&trx(TradeKind::Sell, 10.0, 9.0)).unwrap();

        // Basis is the $8 lot (80), not the $5 lot: holdings were 130,
        // remaining 10 units marked from $8 to $9 (+10), minus basis 80.
        assert_eq!(entry.holdings_value_before, 130.0);
        assert_eq!(entry.holdings_value_after, 60.0);
        assert_eq!(ledger.long_available("AAPL"), 10.0);
    }

    #[test]
    fn test_short_moves_no_cash() {
        let mut ledger = InvestorLedger::new(100_000.0);
        let entry = ledger.apply(&trx(TradeKind::Short, 5.0, 20.0)).unwrap();

        assert_eq!(entry.cash_after, 100_000.0);
        assert_eq!(entry.holdings_value_after, 0.0);
        assert_eq!(entry.short_pnl_after, 0.0);
        assert_eq!(ledger.short_available("AAPL"), 5.0);
    }

    #[test]
    fn test_short_cover_round_trip() {
        let mut ledger = InvestorLedger::new(100_000.0);
        ledger.apply(&trx(TradeKind::Short, 5.0, 20.0)).unwrap();
        let entry = ledger.apply(&trx(TradeKind::Cover, 5.0, 15.0)).unwrap();

        // 5*20 - 5*15 = 25 realized.
        assert_eq!(entry.short_pnl_after, 25.0);
        assert_eq!(entry.cash_after, 100_000.0);
        assert_eq!(entry.net_worth_after, 100_025.0);
        assert_eq!(ledger.short_available("AAPL"), 0.0);
    }

    #[test]
    fn test_cover_consumes_most_recent_short_first() {
        let mut ledger = InvestorLedger::new(100_000.0);
        ledger.apply(&trx(TradeKind::Short, 5.0, 20.0)).unwrap();
        ledger.apply(&trx(TradeKind::Short, 5.0, 30.0)).unwrap();
        let entry = ledger.apply(&trx(TradeKind::Cover, 5.0, 25.0)).unwrap();

        // Covers against the $30 shorts: 150 - 125 = 25.
        assert_eq!(entry.short_pnl_after, 25.0);
    }

    #[test]
    fn test_sell_insufficient_lots() {
        let mut ledger = InvestorLedger::new(100_000.0);
        ledger.apply(&trx(TradeKind::Buy, 5.0, 10.0)).unwrap();

        let err = ledger.apply(&trx(TradeKind::Sell, 10.0, 12.0)).unwrap_err();
        match err {
            Error::InsufficientLots {
                investor,
                symbol,
                requested,
                available,
            } => {
                assert_eq!(investor, "a");
                assert_eq!(symbol, "AAPL");
                assert_eq!(requested, 10.0);
                assert_eq!(available, 5.0);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // No partial application.
        assert_eq!(ledger.cash, 99_950.0);
        assert_eq!(ledger.holdings_value, 50.0);
        assert_eq!(ledger.held_quantity("AAPL"), 5.0);
        assert_eq!(ledger.long_available("AAPL"), 5.0);
    }

    #[test]
    fn test_cover_without_short() {
        let mut ledger = InvestorLedger::new(100_000.0);
        let err = ledger.apply(&trx(TradeKind::Cover, 5.0, 15.0)).unwrap_err();
        assert!(matches!(err, Error::InsufficientLots { .. }));
        assert_eq!(ledger.short_pnl, 0.0);
    }

    #[test]
    fn test_held_quantity_matches_long_lots() {
        let mut ledger = InvestorLedger::new(100_000.0);
        ledger.apply(&trx(TradeKind::Buy, 10.0, 5.0)).unwrap();
        ledger.apply(&trx(TradeKind::Buy, 4.0, 8.0)).unwrap();
        ledger.apply(&trx(TradeKind::Sell, 6.0, 9.0)).unwrap();

        assert_eq!(ledger.held_quantity("AAPL"), ledger.long_available("AAPL"));
        assert_eq!(ledger.held_quantity("AAPL"), 8.0);
    }

    #[test]
    fn test_fractional_prices() {
        use approx::assert_relative_eq;

        let mut ledger = InvestorLedger::new(1_000.0);
        ledger.apply(&trx(TradeKind::Buy, 3.0, 9.99)).unwrap();
        ledger.apply(&trx(TradeKind::Sell, 1.0, 10.01)).unwrap();

        // 29.97 + (10.01 - 9.99) * 2 - 9.99
        assert_relative_eq!(ledger.holdings_value, 20.02, epsilon = 1e-9);
        assert_relative_eq!(ledger.cash, 1_000.0 - 29.97 + 10.01, epsilon = 1e-9);
    }

    #[test]
    fn test_net_worth_identity() {
        let mut ledger = InvestorLedger::new(100_000.0);
        let kinds = [
            trx(TradeKind::Buy, 10.0, 5.0),
            trx(TradeKind::Short, 3.0, 20.0),
            trx(TradeKind::Sell, 4.0, 7.0),
            trx(TradeKind::Cover, 3.0, 18.0),
        ];
        for t in &kinds {
            let entry = ledger.apply(t).unwrap();
            assert_eq!(
                entry.net_worth_after,
                entry.cash_after + entry.holdings_value_after + entry.short_pnl_after
            );
        }
    }

    #[test]
    fn test_symbols_are_independent() {
        let mut ledger = InvestorLedger::new(100_000.0);
        ledger.apply(&trx(TradeKind::Buy, 10.0, 5.0)).unwrap();
        ledger
            .apply(&Transaction::new(
                "a",
                "GOOG",
                TradeKind::Buy,
                ts(),
                2.0,
                100.0,
            ))
            .unwrap();

        // Selling AAPL cannot draw on the GOOG lots.
        let err = ledger.apply(&trx(TradeKind::Sell, 11.0, 6.0)).unwrap_err();
        assert!(matches!(err, Error::InsufficientLots { available, .. } if available == 10.0));
    }
}
