//! Portfolio ledger module.
//!
//! Provides LIFO lot stacks, per-investor balance state, and the
//! deterministic replay engine.

mod account;
mod engine;
mod lots;

pub use account::InvestorLedger;
pub use engine::{replay_order, LedgerEngine};
pub use lots::{Lot, LotStack, Shortfall};
