//! Core data types for the ledger engine.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Transaction kind.
///
/// Declaration order is the replay precedence used when transactions tie on
/// timestamp, investor, and symbol: buy < sell < short < cover.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum TradeKind {
    Buy,
    Sell,
    Short,
    Cover,
}

impl TradeKind {
    /// Parse a kind from its lowercase wire form.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "buy" => Some(Self::Buy),
            "sell" => Some(Self::Sell),
            "short" => Some(Self::Short),
            "cover" => Some(Self::Cover),
            _ => None,
        }
    }

    /// The lowercase wire form of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
            Self::Short => "short",
            Self::Cover => "cover",
        }
    }
}

impl fmt::Display for TradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single brokerage transaction as parsed from an export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// Investor identifier (lowercase)
    pub investor: String,
    /// Instrument symbol as it appears in the export
    pub symbol: String,
    /// Buy, sell, short, or cover
    pub kind: TradeKind,
    /// Execution time; the source format carries no timezone
    pub timestamp: NaiveDateTime,
    /// Number of units
    pub quantity: f64,
    /// Per-unit price at execution
    pub price: f64,
    /// When true the transaction is skipped entirely by the engine
    #[serde(default)]
    pub excluded: bool,
}

impl Transaction {
    /// Create a new transaction (not excluded).
    pub fn new(
        investor: &str,
        symbol: &str,
        kind: TradeKind,
        timestamp: NaiveDateTime,
        quantity: f64,
        price: f64,
    ) -> Self {
        Self {
            investor: investor.to_lowercase(),
            symbol: symbol.to_string(),
            kind,
            timestamp,
            quantity,
            price,
            excluded: false,
        }
    }

    /// Mark the transaction as excluded from replay and output.
    pub fn exclude(mut self) -> Self {
        self.excluded = true;
        self
    }

    /// Total value of the transaction (quantity × price).
    pub fn notional(&self) -> f64 {
        self.quantity * self.price
    }
}

/// A replayed transaction annotated with the owning investor's balances
/// immediately before and after it was applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// The transaction that produced this entry
    #[serde(flatten)]
    pub transaction: Transaction,
    /// Cash balance before the transaction
    pub cash_before: f64,
    /// Cash balance after the transaction
    pub cash_after: f64,
    /// Mark-to-market holdings value before
    pub holdings_value_before: f64,
    /// Mark-to-market holdings value after
    pub holdings_value_after: f64,
    /// Cumulative realized short P&L after
    pub short_pnl_after: f64,
    /// cash_after + holdings_value_after + short_pnl_after
    pub net_worth_after: f64,
}
