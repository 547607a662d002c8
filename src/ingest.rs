//! Parsing of brokerage transaction-history exports.
//!
//! Everything here sits upstream of the ledger engine: currency-string
//! parsing, the MarketWatch export layout, the investor id baked into the
//! file name, and the optional symbol ban list. The engine itself never
//! sees a malformed record; failures surface as
//! [`Error::MalformedTransaction`] with the file and line.

use crate::types::{TradeKind, Transaction};
use crate::{Error, Result};
use chrono::NaiveDateTime;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Export file name prefix, e.g. `Portfolio Transactions - Rob Jay.csv`.
const FILE_PREFIX: &str = "Portfolio Transactions";

/// Timestamp format of the export, after the bare a/p suffix is completed
/// to am/pm.
const DATE_FORMAT: &str = "%m/%d/%y %I:%M%p";

/// Parse a currency-formatted string into a number.
///
/// Strips `$` and thousands separators; an empty string or a bare `-`
/// means zero; a parenthesized value is negative. Returns `None` when the
/// remainder is not a number.
pub fn parse_currency(raw: &str) -> Option<f64> {
    let s = raw.trim().replace(['$', ','], "");
    if s.is_empty() || s == "-" {
        return Some(0.0);
    }
    if let Some(inner) = s.strip_prefix('(').and_then(|rest| rest.strip_suffix(')')) {
        return inner.trim().parse::<f64>().ok().map(|v| -v);
    }
    s.parse::<f64>().ok()
}

/// Case-insensitive symbol ban list.
///
/// A transaction is excluded when any entry is a substring of its symbol
/// field, matching the plain-text ban file of the export tooling.
#[derive(Debug, Clone, Default)]
pub struct BanList {
    entries: HashSet<String>,
}

impl BanList {
    /// Build a ban list from symbol entries; blank entries are dropped.
    pub fn from_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = symbols
            .into_iter()
            .map(|s| s.as_ref().trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        Self { entries }
    }

    /// Whether the list has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a symbol field matches any banned entry.
    pub fn matches(&self, symbol: &str) -> bool {
        let upper = symbol.to_uppercase();
        self.entries.iter().any(|banned| upper.contains(banned))
    }
}

/// Read a ban list from a plain-text file, one entry per line.
pub fn read_ban_list(path: &Path) -> Result<BanList> {
    let content = fs::read_to_string(path)?;
    Ok(BanList::from_symbols(content.lines()))
}

/// Derive the investor id from an export file name:
/// the portion after the first `-`, trimmed, `.csv` dropped, lowercased.
pub fn investor_from_filename(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let part = name.split('-').nth(1)?.trim();
    let part = part.strip_suffix(".csv").unwrap_or(part).trim();
    if part.is_empty() {
        return None;
    }
    Some(part.to_lowercase())
}

/// Enumerate `Portfolio Transactions*.csv` files in a directory, in sorted
/// file-name order so downstream processing is deterministic.
pub fn scan_transaction_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with(FILE_PREFIX) && name.ends_with(".csv") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Parse one transaction-history export.
///
/// Export layout (header row skipped): column 0 = symbol, 2 = trade date,
/// 3 = transaction type, 5 = quantity, 6 = price. Transactions whose
/// symbol matches the ban list are returned marked excluded.
pub fn parse_transaction_file(path: &Path, bans: &BanList) -> Result<Vec<Transaction>> {
    let file_label = path.display().to_string();
    let investor = investor_from_filename(path).ok_or_else(|| Error::MalformedTransaction {
        file: file_label.clone(),
        line: 0,
        reason: "cannot derive an investor name from the file name".to_string(),
    })?;

    let mut transactions = Vec::new();
    let mut reader = csv::Reader::from_path(path)?;
    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());
        let malformed = |reason: String| Error::MalformedTransaction {
            file: file_label.clone(),
            line,
            reason,
        };

        let symbol = record
            .get(0)
            .ok_or_else(|| malformed("missing symbol column".to_string()))?;
        let raw_date = record
            .get(2)
            .ok_or_else(|| malformed("missing date column".to_string()))?;
        let raw_kind = record
            .get(3)
            .ok_or_else(|| malformed("missing transaction type column".to_string()))?;
        let raw_quantity = record
            .get(5)
            .ok_or_else(|| malformed("missing quantity column".to_string()))?;
        let raw_price = record
            .get(6)
            .ok_or_else(|| malformed("missing price column".to_string()))?;

        let kind = TradeKind::parse(raw_kind)
            .ok_or_else(|| malformed(format!("unrecognized transaction type {raw_kind:?}")))?;

        // The export truncates am/pm to a bare a/p.
        let completed = format!("{}m", raw_date.trim());
        let timestamp = NaiveDateTime::parse_from_str(&completed, DATE_FORMAT)
            .map_err(|e| malformed(format!("unparseable date {raw_date:?}: {e}")))?;

        let quantity = parse_currency(raw_quantity)
            .ok_or_else(|| malformed(format!("non-numeric quantity {raw_quantity:?}")))?;
        let price = parse_currency(raw_price)
            .ok_or_else(|| malformed(format!("non-numeric price {raw_price:?}")))?;

        let mut transaction = Transaction::new(&investor, symbol, kind, timestamp, quantity, price);
        if bans.matches(symbol) {
            transaction = transaction.exclude();
        }
        transactions.push(transaction);
    }

    Ok(transactions)
}
