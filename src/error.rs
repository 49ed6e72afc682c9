//! Unified error types for the economy and betting core.

use thiserror::Error;

use crate::poll::BetOption;

/// Unified error type for the bot core.
#[derive(Error, Debug)]
pub enum BotError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Ledger/balance error.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Poll store error.
    #[error("poll error: {0}")]
    Poll(#[from] PollError),

    /// Bet placement error.
    #[error("betting error: {0}")]
    Betting(#[from] BettingError),

    /// Poll settlement error.
    #[error("settlement error: {0}")]
    Settlement(#[from] SettlementError),

    /// Shop catalog error.
    #[error("shop error: {0}")]
    Shop(#[from] ShopError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Balance and account errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// No account exists for the user.
    #[error("unknown user {user_id}")]
    UnknownUser {
        /// The user id with no account.
        user_id: u64,
    },

    /// Balance too low for the requested debit.
    #[error("insufficient funds for user {user_id}: need {required}, have {available}")]
    InsufficientFunds {
        /// The user being debited.
        user_id: u64,
        /// Requested amount.
        required: u64,
        /// Current balance.
        available: u64,
    },

    /// Amount is not a positive integer.
    #[error("invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount.
        amount: u64,
    },

    /// Crediting would overflow the balance counter.
    #[error("balance overflow for user {user_id}")]
    BalanceOverflow {
        /// The user whose balance would overflow.
        user_id: u64,
    },
}

/// Poll record errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PollError {
    /// No poll exists with this id.
    #[error("poll {poll_id} not found")]
    NotFound {
        /// The missing poll id.
        poll_id: u64,
    },

    /// A poll with this id already exists.
    #[error("poll id {poll_id} already exists")]
    IdCollision {
        /// The colliding poll id.
        poll_id: u64,
    },

    /// The user already holds a bet on this poll.
    #[error("user {user_id} already voted on poll {poll_id} for option {existing}")]
    DuplicateVote {
        /// The poll being bet on.
        poll_id: u64,
        /// The user with an existing bet.
        user_id: u64,
        /// The option the existing bet is locked to.
        existing: BetOption,
    },
}

/// Bet placement errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BettingError {
    /// The poll is inactive or past its expiry timestamp.
    #[error("poll {poll_id} is closed or expired")]
    PollClosedOrExpired {
        /// The closed poll id.
        poll_id: u64,
    },

    /// Ledger rejection (unknown user, insufficient funds, invalid amount).
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Poll store rejection (not found, duplicate vote).
    #[error(transparent)]
    Poll(#[from] PollError),

    /// Keyed-lock acquisition timed out; safe to retry.
    #[error(transparent)]
    Transient(#[from] TransientStorageFailure),
}

/// Settlement errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettlementError {
    /// The poll was already settled (deactivated).
    #[error("poll {poll_id} already settled")]
    AlreadySettled {
        /// The settled poll id.
        poll_id: u64,
    },

    /// Poll store rejection (not found).
    #[error(transparent)]
    Poll(#[from] PollError),

    /// Ledger rejection while crediting a winner.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Keyed-lock acquisition timed out; safe to retry.
    #[error(transparent)]
    Transient(#[from] TransientStorageFailure),
}

/// Shop catalog errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShopError {
    /// Entry is not a `name:price` pair.
    #[error("malformed shop entry at line {line}: {entry:?}")]
    MalformedEntry {
        /// 1-based line number in the source list.
        line: usize,
        /// The offending entry text.
        entry: String,
    },

    /// Price field did not parse as a positive integer.
    #[error("invalid price at line {line} for item {name:?}: {price:?}")]
    InvalidPrice {
        /// 1-based line number in the source list.
        line: usize,
        /// Item name.
        name: String,
        /// The unparseable price text.
        price: String,
    },

    /// The same item name appears twice.
    #[error("duplicate shop item {name:?} at line {line}")]
    DuplicateItem {
        /// 1-based line number of the second occurrence.
        line: usize,
        /// The duplicated item name.
        name: String,
    },
}

/// A bounded wait on per-poll/per-user serialization elapsed.
///
/// Writes are effect-free until their atomic commit point, so the caller may
/// retry the whole operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("transient storage failure: lock on {scope} {key} not acquired within {waited_ms}ms")]
pub struct TransientStorageFailure {
    /// Which lock registry timed out ("poll" or "user").
    pub scope: &'static str,
    /// The contended key.
    pub key: u64,
    /// How long the acquisition waited.
    pub waited_ms: u64,
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, BotError>;
