//! Poll and bet records for binary betting polls.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::OffsetDateTime;

use crate::{PollId, Points, UserId};

/// One of the two mutually exclusive poll options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
pub enum BetOption {
    /// The first listed option.
    #[strum(serialize = "a", serialize = "A", serialize = "first", serialize = "1")]
    A,
    /// The second listed option.
    #[strum(serialize = "b", serialize = "B", serialize = "second", serialize = "2")]
    B,
}

impl BetOption {
    /// Get the opposite option.
    pub fn opposite(&self) -> Self {
        match self {
            BetOption::A => BetOption::B,
            BetOption::B => BetOption::A,
        }
    }
}

/// A single escrowed wager on one poll option.
///
/// Immutable once recorded; consumed by settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bet {
    /// The wagering user.
    pub user_id: UserId,
    /// Escrowed amount (always positive).
    pub amount: Points,
}

/// A binary betting poll with its recorded bets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poll {
    /// Unique id assigned by the hosting message system.
    pub id: PollId,
    /// Question text.
    pub question: String,
    /// Label of option A.
    pub option_a: String,
    /// Label of option B.
    pub option_b: String,
    /// When the poll was created.
    pub created_at: OffsetDateTime,
    /// When the poll stops accepting bets.
    pub expires_at: OffsetDateTime,
    /// False once settled; never set back to true.
    pub active: bool,
    /// Bets on option A, in placement order.
    pub bets_a: Vec<Bet>,
    /// Bets on option B, in placement order.
    pub bets_b: Vec<Bet>,
}

impl Poll {
    /// Get the display label for an option.
    pub fn label(&self, option: BetOption) -> &str {
        match option {
            BetOption::A => &self.option_a,
            BetOption::B => &self.option_b,
        }
    }

    /// Get the bets recorded for an option, in placement order.
    pub fn bets(&self, option: BetOption) -> &[Bet] {
        match option {
            BetOption::A => &self.bets_a,
            BetOption::B => &self.bets_b,
        }
    }

    pub(crate) fn bets_mut(&mut self, option: BetOption) -> &mut Vec<Bet> {
        match option {
            BetOption::A => &mut self.bets_a,
            BetOption::B => &mut self.bets_b,
        }
    }

    /// Find a user's existing bet, if any, with the option it is locked to.
    pub fn find_bet(&self, user_id: UserId) -> Option<(BetOption, Bet)> {
        for option in [BetOption::A, BetOption::B] {
            if let Some(bet) = self.bets(option).iter().find(|b| b.user_id == user_id) {
                return Some((option, *bet));
            }
        }
        None
    }

    /// Total amount staked on an option.
    pub fn pool(&self, option: BetOption) -> Points {
        self.bets(option).iter().map(|b| b.amount).sum()
    }

    /// Number of distinct participants across both options.
    pub fn participants(&self) -> usize {
        self.bets_a.len() + self.bets_b.len()
    }

    /// Check if the expiry timestamp has passed.
    pub fn is_expired(&self) -> bool {
        OffsetDateTime::now_utc() >= self.expires_at
    }

    /// Get remaining time until expiry.
    pub fn time_remaining(&self) -> Option<std::time::Duration> {
        let remaining = self.expires_at - OffsetDateTime::now_utc();
        if remaining.is_positive() {
            Some(std::time::Duration::from_secs(remaining.whole_seconds() as u64))
        } else {
            None
        }
    }
}
