//! Virtual-currency economy: accounts and the balance ledger.

pub mod ledger;

pub use ledger::{Ledger, UserAccount};
