//! Bet placement: validation, escrow, and the record/debit transaction.

pub mod engine;

pub use engine::{BetReceipt, BettingEngine};
