//! User balance ledger.
//!
//! Sole owner of balances: no other component mutates them. Every operation
//! is an atomic check-then-write against one account entry, so a rejected
//! debit can never leave a balance partially applied and no balance is ever
//! observably negative (amounts are unsigned and checked).

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::error::LedgerError;
use crate::{Points, UserId};

/// A user account created on first observed activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    /// Opaque stable id from the host platform.
    pub user_id: UserId,
    /// Last-seen display name.
    pub name: String,
    /// Current point balance.
    pub balance: Points,
    /// Creation sequence number; leaderboard tie-break.
    pub created_seq: u64,
}

/// In-memory balance ledger keyed by user id.
#[derive(Debug, Default)]
pub struct Ledger {
    accounts: DashMap<UserId, UserAccount>,
    next_seq: AtomicU64,
    starting_balance: Points,
    message_points: Points,
}

impl Ledger {
    /// Create a ledger with the configured account defaults.
    pub fn new(config: &Config) -> Self {
        Self {
            accounts: DashMap::new(),
            next_seq: AtomicU64::new(0),
            starting_balance: config.starting_balance,
            message_points: config.message_points,
        }
    }

    /// Create an account if absent; refresh the display name if present.
    ///
    /// Never touches an existing balance. Returns true when a new account
    /// was created.
    pub fn ensure_user(&self, user_id: UserId, name: &str) -> bool {
        match self.accounts.entry(user_id) {
            Entry::Occupied(mut slot) => {
                let account = slot.get_mut();
                if account.name != name {
                    account.name = name.to_string();
                }
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(UserAccount {
                    user_id,
                    name: name.to_string(),
                    balance: self.starting_balance,
                    created_seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
                });
                debug!(user_id, name, "account created");
                true
            }
        }
    }

    /// Add points to a balance. Returns the new balance.
    pub fn credit(&self, user_id: UserId, amount: Points) -> Result<Points, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount { amount });
        }

        let mut account = self
            .accounts
            .get_mut(&user_id)
            .ok_or(LedgerError::UnknownUser { user_id })?;

        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow { user_id })?;

        debug!(user_id, amount, balance = account.balance, "credit");
        Ok(account.balance)
    }

    /// Remove points from a balance iff it covers the amount.
    ///
    /// The balance check and the write happen under one entry lock; a
    /// rejected debit leaves the balance unchanged. Returns the new balance.
    pub fn debit(&self, user_id: UserId, amount: Points) -> Result<Points, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount { amount });
        }

        let mut account = self
            .accounts
            .get_mut(&user_id)
            .ok_or(LedgerError::UnknownUser { user_id })?;

        if account.balance < amount {
            return Err(LedgerError::InsufficientFunds {
                user_id,
                required: amount,
                available: account.balance,
            });
        }

        account.balance -= amount;
        debug!(user_id, amount, balance = account.balance, "debit");
        Ok(account.balance)
    }

    /// Get a user's current balance.
    pub fn balance(&self, user_id: UserId) -> Result<Points, LedgerError> {
        self.accounts
            .get(&user_id)
            .map(|a| a.balance)
            .ok_or(LedgerError::UnknownUser { user_id })
    }

    /// The `n` richest accounts, descending by balance.
    ///
    /// Ties break by account creation order (earlier account first), so the
    /// result is deterministic.
    pub fn top(&self, n: usize) -> Vec<UserAccount> {
        let mut accounts: Vec<UserAccount> =
            self.accounts.iter().map(|a| a.value().clone()).collect();
        accounts.sort_by(|a, b| {
            b.balance
                .cmp(&a.balance)
                .then(a.created_seq.cmp(&b.created_seq))
        });
        accounts.truncate(n);
        accounts
    }

    /// Ensure the account exists, then credit the per-message award.
    ///
    /// Returns the balance after the award. A zero configured award only
    /// ensures the account.
    pub fn award_message_points(&self, user_id: UserId, name: &str) -> Result<Points, LedgerError> {
        self.ensure_user(user_id, name);
        if self.message_points == 0 {
            return self.balance(user_id);
        }
        self.credit(user_id, self.message_points)
    }

    /// Explicit admin removal of an account. Returns the removed account.
    pub fn remove_user(&self, user_id: UserId) -> Result<UserAccount, LedgerError> {
        self.accounts
            .remove(&user_id)
            .map(|(_, account)| account)
            .ok_or(LedgerError::UnknownUser { user_id })
    }

    /// True iff an account exists for the user.
    pub fn contains(&self, user_id: UserId) -> bool {
        self.accounts.contains_key(&user_id)
    }

    /// Snapshot of all accounts in creation order.
    pub fn all_users(&self) -> Vec<UserAccount> {
        let mut accounts: Vec<UserAccount> =
            self.accounts.iter().map(|a| a.value().clone()).collect();
        accounts.sort_by_key(|a| a.created_seq);
        accounts
    }

    /// Number of accounts.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// True when no accounts exist.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
