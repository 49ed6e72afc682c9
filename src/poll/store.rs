//! Poll record store.
//!
//! Owns every [`Poll`] and the bet lists inside it. Each mutation runs
//! against a single map entry, so the duplicate-vote check and the bet
//! append observe and modify the record as one atomic step.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use time::OffsetDateTime;
use tracing::debug;

use super::types::{Bet, BetOption, Poll};
use crate::error::PollError;
use crate::{PollId, Points, UserId};

/// In-memory store of polls keyed by id.
#[derive(Debug, Default)]
pub struct PollStore {
    polls: DashMap<PollId, Poll>,
}

impl PollStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new active poll.
    ///
    /// Fails with [`PollError::IdCollision`] if the id is already taken.
    pub fn create(
        &self,
        id: PollId,
        question: impl Into<String>,
        option_a: impl Into<String>,
        option_b: impl Into<String>,
        expires_at: OffsetDateTime,
    ) -> Result<(), PollError> {
        match self.polls.entry(id) {
            Entry::Occupied(_) => Err(PollError::IdCollision { poll_id: id }),
            Entry::Vacant(slot) => {
                slot.insert(Poll {
                    id,
                    question: question.into(),
                    option_a: option_a.into(),
                    option_b: option_b.into(),
                    created_at: OffsetDateTime::now_utc(),
                    expires_at,
                    active: true,
                    bets_a: Vec::new(),
                    bets_b: Vec::new(),
                });
                debug!(poll_id = id, "poll created");
                Ok(())
            }
        }
    }

    /// Get a snapshot of a poll and its bet lists.
    pub fn get(&self, id: PollId) -> Result<Poll, PollError> {
        self.polls
            .get(&id)
            .map(|p| p.value().clone())
            .ok_or(PollError::NotFound { poll_id: id })
    }

    /// True iff the poll exists, is active, and is not past expiry.
    ///
    /// Expiry is checked lazily here; an expired poll keeps its record and
    /// simply stops accepting bets until it is settled.
    pub fn is_open(&self, id: PollId) -> bool {
        self.polls
            .get(&id)
            .map(|p| p.active && !p.is_expired())
            .unwrap_or(false)
    }

    /// Record a bet on the chosen option.
    ///
    /// The duplicate-vote scan over both option lists and the append are a
    /// single atomic step against the poll entry.
    pub fn record_bet(
        &self,
        id: PollId,
        user_id: UserId,
        option: BetOption,
        amount: Points,
    ) -> Result<(), PollError> {
        let mut poll = self
            .polls
            .get_mut(&id)
            .ok_or(PollError::NotFound { poll_id: id })?;

        if let Some((existing, _)) = poll.find_bet(user_id) {
            return Err(PollError::DuplicateVote {
                poll_id: id,
                user_id,
                existing,
            });
        }

        poll.bets_mut(option).push(Bet { user_id, amount });
        debug!(poll_id = id, user_id, %option, amount, "bet recorded");
        Ok(())
    }

    /// Remove a user's bet. Rollback hook for the betting transaction.
    pub(crate) fn remove_bet(&self, id: PollId, user_id: UserId) -> Result<(), PollError> {
        let mut poll = self
            .polls
            .get_mut(&id)
            .ok_or(PollError::NotFound { poll_id: id })?;

        for option in [BetOption::A, BetOption::B] {
            let bets = poll.bets_mut(option);
            if let Some(pos) = bets.iter().position(|b| b.user_id == user_id) {
                bets.remove(pos);
                debug!(poll_id = id, user_id, %option, "bet rolled back");
                return Ok(());
            }
        }

        Ok(())
    }

    /// Mark a poll inactive.
    ///
    /// Not idempotent: callers check activity first so that a second
    /// settlement is detected rather than silently absorbed.
    pub fn deactivate(&self, id: PollId) -> Result<(), PollError> {
        let mut poll = self
            .polls
            .get_mut(&id)
            .ok_or(PollError::NotFound { poll_id: id })?;

        poll.active = false;
        debug!(poll_id = id, "poll deactivated");
        Ok(())
    }

    /// Ids of polls currently open for betting.
    pub fn open_polls(&self) -> Vec<PollId> {
        let mut ids: Vec<PollId> = self
            .polls
            .iter()
            .filter(|p| p.active && !p.is_expired())
            .map(|p| p.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Number of polls ever created and still stored.
    pub fn len(&self) -> usize {
        self.polls.len()
    }

    /// True when no polls are stored.
    pub fn is_empty(&self) -> bool {
        self.polls.is_empty()
    }
}
