//! Poll resolution: pari-mutuel payout computation and winner credits.

pub mod engine;

pub use engine::{OptionTally, SettlementEngine, SettlementReport, WinnerPayout};
