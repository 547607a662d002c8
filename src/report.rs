//! Projection of annotated ledger entries into a combined net-worth report.
//!
//! One output row per replayed transaction, carrying the current snapshot of
//! every investor's last known net worth so the whole population can be
//! charted from a single wide CSV.

use crate::types::{LedgerEntry, TradeKind};
use crate::Result;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;

/// One row of the wide report: the transaction plus every investor's last
/// known net worth at that point in the stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRow {
    pub date: NaiveDateTime,
    /// Net worth per investor, aligned with [`NetWorthReport::investors`]
    pub net_worths: Vec<f64>,
    pub investor: String,
    pub symbol: String,
    pub kind: TradeKind,
    pub price: f64,
    pub quantity: f64,
    pub total: f64,
}

/// The combined, investor-by-investor net-worth time series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetWorthReport {
    /// Column order: seeded investors first, then any additional investors
    /// in order of first appearance in the entry stream
    pub investors: Vec<String>,
    pub rows: Vec<ReportRow>,
}

impl NetWorthReport {
    /// Write the report as a wide CSV:
    /// `date, <one column per investor>, user, symbol, type, price, quantity, total`.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);

        let mut header = vec!["date".to_string()];
        header.extend(self.investors.iter().cloned());
        for col in ["user", "symbol", "type", "price", "quantity", "total"] {
            header.push(col.to_string());
        }
        wtr.write_record(&header)?;

        for row in &self.rows {
            let mut record = vec![row.date.format("%Y-%m-%d %H:%M:%S").to_string()];
            record.extend(row.net_worths.iter().map(|v| v.to_string()));
            record.push(row.investor.clone());
            record.push(row.symbol.clone());
            record.push(row.kind.to_string());
            record.push(row.price.to_string());
            record.push(row.quantity.to_string());
            record.push(row.total.to_string());
            wtr.write_record(&record)?;
        }

        wtr.flush()?;
        Ok(())
    }
}

/// Project annotated entries into the wide report.
///
/// `investors` seeds the known population (each carried at
/// `starting_amount` until their first transaction); investors appearing in
/// the entries but not in the seed list are appended in first-appearance
/// order. Entries must be in replay order, as produced by
/// [`crate::LedgerEngine::replay`].
pub fn project_report(
    entries: &[LedgerEntry],
    investors: &[String],
    starting_amount: f64,
) -> NetWorthReport {
    let mut columns: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for investor in investors {
        if !index.contains_key(investor) {
            index.insert(investor.clone(), columns.len());
            columns.push(investor.clone());
        }
    }
    for entry in entries {
        let investor = &entry.transaction.investor;
        if !index.contains_key(investor) {
            index.insert(investor.clone(), columns.len());
            columns.push(investor.clone());
        }
    }

    let mut last_net_worth = vec![starting_amount; columns.len()];
    let mut rows = Vec::with_capacity(entries.len());
    for entry in entries {
        let t = &entry.transaction;
        if let Some(&idx) = index.get(&t.investor) {
            last_net_worth[idx] = entry.net_worth_after;
        }
        rows.push(ReportRow {
            date: t.timestamp,
            net_worths: last_net_worth.clone(),
            investor: t.investor.clone(),
            symbol: t.symbol.clone(),
            kind: t.kind,
            price: t.price,
            quantity: t.quantity,
            total: t.notional(),
        });
    }

    NetWorthReport {
        investors: columns,
        rows,
    }
}
