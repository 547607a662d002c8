//! Folio CLI - rebuild per-investor net-worth time series from brokerage
//! transaction exports and write the combined report to stdout.

use clap::Parser;
use folio_core::{
    investor_from_filename, parse_transaction_file, project_report, read_ban_list,
    scan_transaction_files, BanList, LedgerEngine, Transaction,
};
use std::io;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Rebuild per-investor net-worth time series from transaction exports")]
#[command(version)]
struct Cli {
    /// Directory with "Portfolio Transactions*.csv" exports
    input_dir: PathBuf,

    /// File with one banned symbol per line
    #[arg(long)]
    bans: Option<PathBuf>,

    /// Starting cash applied to every investor's ledger
    #[arg(long, default_value = "100000")]
    starting_amount: f64,

    /// Print each replayed transaction and its balances to stderr
    #[arg(long)]
    debug: bool,

    /// Emit annotated ledger entries as JSON instead of the CSV report
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> folio_core::Result<()> {
    let bans = match &cli.bans {
        Some(path) => read_ban_list(path)?,
        None => BanList::default(),
    };

    let mut investors: Vec<String> = Vec::new();
    let mut transactions: Vec<Transaction> = Vec::new();
    for path in scan_transaction_files(&cli.input_dir)? {
        if let Some(investor) = investor_from_filename(&path) {
            if !investors.contains(&investor) {
                investors.push(investor);
            }
        }
        transactions.extend(parse_transaction_file(&path, &bans)?);
    }

    let mut engine = LedgerEngine::new(cli.starting_amount);
    let entries = engine.replay(transactions)?;

    if cli.debug {
        for e in &entries {
            let t = &e.transaction;
            eprintln!(
                "{} {} {} {} {} @ {} -> cash {:.2} holdings {:.2} short {:.2} net {:.2}",
                t.timestamp,
                t.investor,
                t.symbol,
                t.kind,
                t.quantity,
                t.price,
                e.cash_after,
                e.holdings_value_after,
                e.short_pnl_after,
                e.net_worth_after,
            );
        }
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    let report = project_report(&entries, &investors, cli.starting_amount);
    report.write_csv(io::stdout().lock())?;
    Ok(())
}
