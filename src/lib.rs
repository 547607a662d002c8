//! Folio Core - Net-worth time-series reconstruction.
//!
//! This crate rebuilds a running net-worth series for one or more investors
//! from brokerage transaction exports:
//!
//! - **Lot stacks**: LIFO cost-basis tracking for long and short lots
//! - **Investor ledgers**: cash, mark-to-market holdings, realized short P&L
//! - **Ledger engine**: deterministic ordering and replay of all transactions
//! - **Report projection**: combined per-investor net-worth time series
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use folio_core::{LedgerEngine, TradeKind, Transaction};
//!
//! let ts = NaiveDate::from_ymd_opt(2021, 1, 4).unwrap().and_hms_opt(9, 30, 0).unwrap();
//! let trades = vec![
//!     Transaction::new("alice", "AAPL", TradeKind::Buy, ts, 10.0, 150.0),
//! ];
//!
//! let mut engine = LedgerEngine::new(100_000.0);
//! let entries = engine.replay(trades).unwrap();
//! assert_eq!(entries[0].cash_after, 98_500.0);
//! assert_eq!(entries[0].net_worth_after, 100_000.0);
//! ```

pub mod ingest;
pub mod ledger;
pub mod report;
pub mod types;

// Re-export commonly used types
pub use types::{LedgerEntry, TradeKind, Transaction};

// Re-export main functionality
pub use ingest::{
    investor_from_filename, parse_currency, parse_transaction_file, read_ban_list,
    scan_transaction_files, BanList,
};
pub use ledger::{InvestorLedger, LedgerEngine, Lot, LotStack};
pub use report::{project_report, NetWorthReport, ReportRow};

/// Error types for folio-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(
        "insufficient lots for {investor}/{symbol}: requested {requested}, available {available}"
    )]
    InsufficientLots {
        investor: String,
        symbol: String,
        requested: f64,
        available: f64,
    },

    #[error("malformed transaction ({file}, line {line}): {reason}")]
    MalformedTransaction {
        file: String,
        line: u64,
        reason: String,
    },
}

/// Result type for folio-core operations.
pub type Result<T> = std::result::Result<T, Error>;
