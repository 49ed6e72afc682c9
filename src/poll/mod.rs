//! Binary betting polls: records and their store.
//!
//! A poll has exactly two options. Bets are structured records appended to
//! the chosen option's list; a user holds at most one bet per poll.

pub mod store;
pub mod types;

pub use store::PollStore;
pub use types::{Bet, BetOption, Poll};
