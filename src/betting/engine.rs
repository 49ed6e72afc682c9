//! Bet placement with escrow.
//!
//! A bet is validated against the poll state and the bettor's balance, then
//! recorded and escrowed. The record and the debit form one transaction:
//! the debit happens only after the bet is recorded, and a failed debit
//! rolls the record back.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::economy::Ledger;
use crate::error::{BettingError, LedgerError};
use crate::poll::{BetOption, PollStore};
use crate::sync::KeyedLocks;
use crate::{PollId, Points, UserId};

/// Confirmation returned for an accepted bet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BetReceipt {
    /// The poll bet on.
    pub poll_id: PollId,
    /// The bettor.
    pub user_id: UserId,
    /// The chosen option.
    pub option: BetOption,
    /// Display label of the chosen option.
    pub option_label: String,
    /// Escrowed amount.
    pub amount: Points,
    /// Bettor's balance after escrow.
    pub balance_after: Points,
}

/// Validates and escrows bets against the ledger and poll store.
#[derive(Debug, Clone)]
pub struct BettingEngine {
    ledger: Arc<Ledger>,
    polls: Arc<PollStore>,
    poll_locks: Arc<KeyedLocks>,
    user_locks: Arc<KeyedLocks>,
}

impl BettingEngine {
    /// Create an engine over shared stores and lock registries.
    pub fn new(
        ledger: Arc<Ledger>,
        polls: Arc<PollStore>,
        poll_locks: Arc<KeyedLocks>,
        user_locks: Arc<KeyedLocks>,
    ) -> Self {
        Self {
            ledger,
            polls,
            poll_locks,
            user_locks,
        }
    }

    /// Place a bet of `amount` on `option`.
    ///
    /// Runs under the poll lock and the user lock, so concurrent bets on the
    /// same poll or from the same user serialize around the check-then-write
    /// sections. Aborts with no side effect on any validation failure; after
    /// the bet is recorded, a failed debit rolls the record back.
    #[instrument(skip(self))]
    pub async fn place_bet(
        &self,
        poll_id: PollId,
        user_id: UserId,
        option: BetOption,
        amount: Points,
    ) -> Result<BetReceipt, BettingError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount { amount }.into());
        }

        let _poll_guard = self.poll_locks.acquire(poll_id).await?;
        let _user_guard = self.user_locks.acquire(user_id).await?;

        if !self.polls.is_open(poll_id) {
            return Err(BettingError::PollClosedOrExpired { poll_id });
        }

        let available = self.ledger.balance(user_id)?;
        if available < amount {
            return Err(LedgerError::InsufficientFunds {
                user_id,
                required: amount,
                available,
            }
            .into());
        }

        // Record first, escrow second: a duplicate vote must abort before
        // any balance movement.
        self.polls.record_bet(poll_id, user_id, option, amount)?;

        let balance_after = match self.ledger.debit(user_id, amount) {
            Ok(balance) => balance,
            Err(err) => {
                warn!(poll_id, user_id, %err, "escrow debit failed, rolling back bet record");
                if let Err(rollback) = self.polls.remove_bet(poll_id, user_id) {
                    warn!(poll_id, user_id, %rollback, "bet rollback failed");
                }
                return Err(err.into());
            }
        };

        let poll = self.polls.get(poll_id)?;
        info!(poll_id, user_id, %option, amount, balance_after, "bet escrowed");

        Ok(BetReceipt {
            poll_id,
            user_id,
            option,
            option_label: poll.label(option).to_string(),
            amount,
            balance_after,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::PollError;
    use pretty_assertions::assert_eq;
    use std::time::Duration as StdDuration;
    use time::{Duration, OffsetDateTime};

    fn engine() -> (BettingEngine, Arc<Ledger>, Arc<PollStore>) {
        let ledger = Arc::new(Ledger::new(&Config::default()));
        let polls = Arc::new(PollStore::new());
        let engine = BettingEngine::new(
            ledger.clone(),
            polls.clone(),
            Arc::new(KeyedLocks::new("poll", StdDuration::from_secs(1))),
            Arc::new(KeyedLocks::new("user", StdDuration::from_secs(1))),
        );
        (engine, ledger, polls)
    }

    fn open_poll(polls: &PollStore, id: u64) {
        polls
            .create(id, "Q", "Yes", "No", OffsetDateTime::now_utc() + Duration::hours(1))
            .unwrap();
    }

    #[tokio::test]
    async fn bet_is_recorded_then_escrowed() {
        let (engine, ledger, polls) = engine();
        ledger.ensure_user(10, "alice");
        ledger.credit(10, 200).unwrap();
        open_poll(&polls, 1);

        let receipt = engine.place_bet(1, 10, BetOption::A, 75).await.unwrap();

        assert_eq!(receipt.option_label, "Yes");
        assert_eq!(receipt.balance_after, 125);
        assert_eq!(ledger.balance(10).unwrap(), 125);
        assert_eq!(polls.get(1).unwrap().pool(BetOption::A), 75);
    }

    #[tokio::test]
    async fn zero_amount_rejected_before_any_lookup() {
        let (engine, _, _) = engine();

        let err = engine.place_bet(1, 10, BetOption::A, 0).await.unwrap_err();
        assert_eq!(err, BettingError::Ledger(LedgerError::InvalidAmount { amount: 0 }));
    }

    #[tokio::test]
    async fn expired_poll_rejected_regardless_of_balance() {
        let (engine, ledger, polls) = engine();
        ledger.ensure_user(10, "alice");
        ledger.credit(10, 1_000).unwrap();
        polls
            .create(1, "Q", "Yes", "No", OffsetDateTime::now_utc() - Duration::minutes(1))
            .unwrap();

        let err = engine.place_bet(1, 10, BetOption::A, 5).await.unwrap_err();

        assert_eq!(err, BettingError::PollClosedOrExpired { poll_id: 1 });
        assert_eq!(ledger.balance(10).unwrap(), 1_000);
    }

    #[tokio::test]
    async fn missing_poll_is_closed_to_bets() {
        let (engine, ledger, _) = engine();
        ledger.ensure_user(10, "alice");
        ledger.credit(10, 100).unwrap();

        let err = engine.place_bet(99, 10, BetOption::A, 5).await.unwrap_err();
        assert_eq!(err, BettingError::PollClosedOrExpired { poll_id: 99 });
    }

    #[tokio::test]
    async fn insufficient_funds_leaves_no_bet() {
        let (engine, ledger, polls) = engine();
        ledger.ensure_user(10, "alice");
        ledger.credit(10, 50).unwrap();
        open_poll(&polls, 1);

        let err = engine.place_bet(1, 10, BetOption::B, 51).await.unwrap_err();

        assert_eq!(
            err,
            BettingError::Ledger(LedgerError::InsufficientFunds {
                user_id: 10,
                required: 51,
                available: 50,
            })
        );
        assert_eq!(polls.get(1).unwrap().participants(), 0);
        assert_eq!(ledger.balance(10).unwrap(), 50);
    }

    #[tokio::test]
    async fn second_bet_fails_duplicate_with_no_balance_change() {
        let (engine, ledger, polls) = engine();
        ledger.ensure_user(10, "alice");
        ledger.credit(10, 100).unwrap();
        open_poll(&polls, 1);

        engine.place_bet(1, 10, BetOption::A, 40).await.unwrap();
        let err = engine.place_bet(1, 10, BetOption::B, 10).await.unwrap_err();

        assert_eq!(
            err,
            BettingError::Poll(PollError::DuplicateVote {
                poll_id: 1,
                user_id: 10,
                existing: BetOption::A,
            })
        );
        assert_eq!(ledger.balance(10).unwrap(), 60);
        assert_eq!(polls.get(1).unwrap().participants(), 1);
    }

    #[tokio::test]
    async fn unknown_bettor_is_reported() {
        let (engine, _, polls) = engine();
        open_poll(&polls, 1);

        let err = engine.place_bet(1, 77, BetOption::A, 5).await.unwrap_err();
        assert_eq!(err, BettingError::Ledger(LedgerError::UnknownUser { user_id: 77 }));
    }

    #[tokio::test]
    async fn concurrent_bets_from_one_user_yield_one_escrow() {
        let (engine, ledger, polls) = engine();
        ledger.ensure_user(10, "alice");
        ledger.credit(10, 100).unwrap();
        open_poll(&polls, 1);

        let first = tokio::spawn({
            let engine = engine.clone();
            async move { engine.place_bet(1, 10, BetOption::A, 30).await }
        });
        let second = tokio::spawn({
            let engine = engine.clone();
            async move { engine.place_bet(1, 10, BetOption::B, 30).await }
        });

        let results = [first.await.unwrap(), second.await.unwrap()];
        let successes = results.iter().filter(|r| r.is_ok()).count();

        // The user lock serializes the pair; exactly one bet lands.
        assert_eq!(successes, 1);
        assert_eq!(ledger.balance(10).unwrap(), 70);
        assert_eq!(polls.get(1).unwrap().participants(), 1);
    }
}
