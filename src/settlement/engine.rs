//! Poll settlement and pari-mutuel payout.
//!
//! The losing pool is split among winners proportionally to stake; each
//! winner receives their stake back plus `floor(losing_pool * stake /
//! winning_pool)`. Integer remainders stay in the pool. When nobody bet on
//! the winning option, no payouts occur and the losing pool is forfeit:
//! the pool stays closed and no division by zero can happen.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::economy::Ledger;
use crate::error::{LedgerError, SettlementError};
use crate::poll::{Bet, BetOption, Poll, PollStore};
use crate::sync::KeyedLocks;
use crate::{PollId, Points, UserId};

/// Per-option summary in a settlement report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionTally {
    /// The option.
    pub option: BetOption,
    /// Display label.
    pub label: String,
    /// Number of bets placed on the option.
    pub bets: usize,
    /// Total staked on the option.
    pub pool: Points,
    /// Integer percentage of all participants (0 when nobody bet).
    pub percent: u32,
}

/// One winner's payout line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WinnerPayout {
    /// The winning bettor.
    pub user_id: UserId,
    /// Original stake.
    pub stake: Points,
    /// Total credited (stake plus share of the losing pool).
    pub payout: Points,
}

/// Outcome of settling a poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettlementReport {
    /// The settled poll.
    pub poll_id: PollId,
    /// Question text.
    pub question: String,
    /// The adjudicated winning option.
    pub winning_option: BetOption,
    /// Display label of the winning option.
    pub winning_label: String,
    /// Tally for option A.
    pub tally_a: OptionTally,
    /// Tally for option B.
    pub tally_b: OptionTally,
    /// Payouts in bet-placement order; empty when the winning pool was 0.
    pub payouts: Vec<WinnerPayout>,
}

impl SettlementReport {
    /// Tally for a given option.
    pub fn tally(&self, option: BetOption) -> &OptionTally {
        match option {
            BetOption::A => &self.tally_a,
            BetOption::B => &self.tally_b,
        }
    }

    /// Sum of all credited payouts.
    pub fn total_paid(&self) -> Points {
        self.payouts.iter().map(|p| p.payout).sum()
    }
}

/// Resolves ended polls and credits winners.
#[derive(Debug, Clone)]
pub struct SettlementEngine {
    ledger: Arc<Ledger>,
    polls: Arc<PollStore>,
    poll_locks: Arc<KeyedLocks>,
}

impl SettlementEngine {
    /// Create an engine over shared stores and the poll lock registry.
    pub fn new(ledger: Arc<Ledger>, polls: Arc<PollStore>, poll_locks: Arc<KeyedLocks>) -> Self {
        Self {
            ledger,
            polls,
            poll_locks,
        }
    }

    /// Settle a poll to the adjudicated winning option.
    ///
    /// The caller names the winner; vote counts are never consulted. Runs
    /// under the poll lock so a concurrent second settlement observes the
    /// deactivated poll and fails with `AlreadySettled`. Credits and the
    /// deactivation apply as one unit: on a mid-batch credit failure, prior
    /// credits are compensated and the poll stays active.
    #[instrument(skip(self))]
    pub async fn settle(
        &self,
        poll_id: PollId,
        winning_option: BetOption,
    ) -> Result<SettlementReport, SettlementError> {
        let _poll_guard = self.poll_locks.acquire(poll_id).await?;

        let poll = self.polls.get(poll_id)?;
        if !poll.active {
            return Err(SettlementError::AlreadySettled { poll_id });
        }

        let winners = poll.bets(winning_option);
        let winning_pool = poll.pool(winning_option);
        let losing_pool = poll.pool(winning_option.opposite());

        let payouts = compute_payouts(winners, winning_pool, losing_pool)?;

        // Verify every winner account up front so an admin removal cannot
        // split the credit batch.
        for payout in &payouts {
            if !self.ledger.contains(payout.user_id) {
                return Err(LedgerError::UnknownUser {
                    user_id: payout.user_id,
                }
                .into());
            }
        }

        for (idx, payout) in payouts.iter().enumerate() {
            if let Err(err) = self.ledger.credit(payout.user_id, payout.payout) {
                self.compensate(&payouts[..idx]);
                return Err(err.into());
            }
        }

        self.polls.deactivate(poll_id)?;

        let report = build_report(&poll, winning_option, payouts);
        info!(
            poll_id,
            %winning_option,
            winners = report.payouts.len(),
            winning_pool,
            losing_pool,
            paid = report.total_paid(),
            "poll settled"
        );

        Ok(report)
    }

    /// Undo credits already applied when a later credit in the batch failed.
    fn compensate(&self, credited: &[WinnerPayout]) {
        for payout in credited {
            if let Err(err) = self.ledger.debit(payout.user_id, payout.payout) {
                warn!(user_id = payout.user_id, %err, "settlement compensation failed");
            }
        }
    }
}

/// Compute winner payouts from the two pools.
///
/// `floor(losing_pool * stake / winning_pool)` uses a 128-bit intermediate
/// product so the multiply cannot overflow.
fn compute_payouts(
    winners: &[Bet],
    winning_pool: Points,
    losing_pool: Points,
) -> Result<Vec<WinnerPayout>, SettlementError> {
    if winning_pool == 0 {
        // Nobody to pay: the losing pool is forfeit by policy.
        return Ok(Vec::new());
    }

    winners
        .iter()
        .map(|bet| {
            let share =
                (losing_pool as u128 * bet.amount as u128 / winning_pool as u128) as Points;
            let payout = bet
                .amount
                .checked_add(share)
                .ok_or(LedgerError::BalanceOverflow {
                    user_id: bet.user_id,
                })?;
            Ok(WinnerPayout {
                user_id: bet.user_id,
                stake: bet.amount,
                payout,
            })
        })
        .collect()
}

fn build_report(
    poll: &Poll,
    winning_option: BetOption,
    payouts: Vec<WinnerPayout>,
) -> SettlementReport {
    let total = poll.participants();
    let tally = |option: BetOption| {
        let bets = poll.bets(option).len();
        OptionTally {
            option,
            label: poll.label(option).to_string(),
            bets,
            pool: poll.pool(option),
            percent: if total == 0 {
                0
            } else {
                (bets * 100 / total) as u32
            },
        }
    };

    SettlementReport {
        poll_id: poll.id,
        question: poll.question.clone(),
        winning_option,
        winning_label: poll.label(winning_option).to_string(),
        tally_a: tally(BetOption::A),
        tally_b: tally(BetOption::B),
        payouts,
    }
}
