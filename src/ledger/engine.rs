//! Deterministic ordering and replay of transactions across investors.

use crate::ledger::account::InvestorLedger;
use crate::types::{LedgerEntry, Transaction};
use crate::Result;
use std::cmp::Ordering;
use std::collections::HashMap;

/// The total replay order over transactions.
///
/// Composite key, ascending: timestamp, investor, symbol, kind
/// (buy < sell < short < cover), quantity, price. The numeric legs use
/// `total_cmp` so the order is total even for pathological floats.
pub fn replay_order(a: &Transaction, b: &Transaction) -> Ordering {
    a.timestamp
        .cmp(&b.timestamp)
        .then_with(|| a.investor.cmp(&b.investor))
        .then_with(|| a.symbol.cmp(&b.symbol))
        .then_with(|| a.kind.cmp(&b.kind))
        .then_with(|| a.quantity.total_cmp(&b.quantity))
        .then_with(|| a.price.total_cmp(&b.price))
}

/// Replays transactions against per-investor ledgers.
///
/// The engine owns the only investor→ledger mapping; ledgers are created
/// lazily with the configured starting cash the first time an investor
/// appears. Replay is a single sequential pass over the sorted stream.
#[derive(Debug)]
pub struct LedgerEngine {
    starting_cash: f64,
    ledgers: HashMap<String, InvestorLedger>,
}

impl LedgerEngine {
    /// Create an engine applying `starting_cash` to every investor.
    pub fn new(starting_cash: f64) -> Self {
        Self {
            starting_cash,
            ledgers: HashMap::new(),
        }
    }

    /// The starting cash applied to each investor's ledger.
    pub fn starting_cash(&self) -> f64 {
        self.starting_cash
    }

    /// The ledger for an investor, if any of their transactions replayed.
    pub fn ledger(&self, investor: &str) -> Option<&InvestorLedger> {
        self.ledgers.get(investor)
    }

    /// Sort the transactions into replay order and apply each to its
    /// investor's ledger, returning one annotated entry per non-excluded
    /// transaction in that order.
    ///
    /// Excluded transactions mutate nothing and produce no entry. An
    /// `InsufficientLots` error aborts the replay; entries for earlier
    /// transactions are discarded with it.
    pub fn replay(&mut self, mut transactions: Vec<Transaction>) -> Result<Vec<LedgerEntry>> {
        transactions.sort_by(replay_order);

        let mut entries = Vec::with_capacity(transactions.len());
        for t in &transactions {
            if t.excluded {
                continue;
            }
            let ledger = self
                .ledgers
                .entry(t.investor.clone())
                .or_insert_with(|| InvestorLedger::new(self.starting_cash));
            entries.push(ledger.apply(t)?);
        }
        Ok(entries)
    }
}
