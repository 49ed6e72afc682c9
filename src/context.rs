//! Explicitly constructed core context.
//!
//! [`BotCore`] owns the ledger, poll store, shop catalog, and both engines,
//! and exposes the narrow interface the chat glue calls into: one method per
//! inbound command trigger. Callers supply authenticated identity and parsed
//! arguments; admin authorization is enforced before the call, never here.

use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tracing::info;

use crate::betting::{BetReceipt, BettingEngine};
use crate::config::Config;
use crate::economy::{Ledger, UserAccount};
use crate::error::{BettingError, LedgerError, PollError, SettlementError};
use crate::poll::{BetOption, Poll, PollStore};
use crate::settlement::{SettlementEngine, SettlementReport};
use crate::shop::ShopCatalog;
use crate::sync::KeyedLocks;
use crate::{PollId, Points, UserId};

/// The assembled economy and betting core.
#[derive(Debug)]
pub struct BotCore {
    config: Config,
    ledger: Arc<Ledger>,
    polls: Arc<PollStore>,
    shop: ShopCatalog,
    betting: BettingEngine,
    settlement: SettlementEngine,
}

impl BotCore {
    /// Build the core from configuration, loading the shop catalog when one
    /// is configured.
    pub fn new(config: Config) -> crate::Result<Self> {
        let shop = match &config.shop_file {
            Some(path) => ShopCatalog::load(path)?,
            None => ShopCatalog::default(),
        };
        Ok(Self::with_shop(config, shop))
    }

    /// Build the core with an already-loaded shop catalog.
    pub fn with_shop(config: Config, shop: ShopCatalog) -> Self {
        let lock_timeout = Duration::from_millis(config.lock_timeout_ms);
        let ledger = Arc::new(Ledger::new(&config));
        let polls = Arc::new(PollStore::new());
        let poll_locks = Arc::new(KeyedLocks::new("poll", lock_timeout));
        let user_locks = Arc::new(KeyedLocks::new("user", lock_timeout));

        let betting = BettingEngine::new(
            ledger.clone(),
            polls.clone(),
            poll_locks.clone(),
            user_locks,
        );
        let settlement = SettlementEngine::new(ledger.clone(), polls.clone(), poll_locks);

        info!(
            message_points = config.message_points,
            starting_balance = config.starting_balance,
            shop_items = shop.len(),
            "core assembled"
        );

        Self {
            config,
            ledger,
            polls,
            shop,
            betting,
            settlement,
        }
    }

    /// Award per-message points, creating the account on first sight.
    pub fn observe_message(&self, user_id: UserId, name: &str) -> Result<Points, LedgerError> {
        self.ledger.award_message_points(user_id, name)
    }

    /// Admin: create a betting poll. Fails on id collision.
    pub fn create_poll(
        &self,
        id: PollId,
        question: impl Into<String>,
        option_a: impl Into<String>,
        option_b: impl Into<String>,
        expires_at: OffsetDateTime,
    ) -> Result<(), PollError> {
        self.polls.create(id, question, option_a, option_b, expires_at)
    }

    /// Place an escrowed bet.
    pub async fn place_bet(
        &self,
        poll_id: PollId,
        user_id: UserId,
        option: BetOption,
        amount: Points,
    ) -> Result<BetReceipt, BettingError> {
        self.betting.place_bet(poll_id, user_id, option, amount).await
    }

    /// Admin: end a poll, adjudicating the winning option.
    pub async fn end_poll(
        &self,
        poll_id: PollId,
        winning_option: BetOption,
    ) -> Result<SettlementReport, SettlementError> {
        self.settlement.settle(poll_id, winning_option).await
    }

    /// Admin: grant points.
    pub fn add_points(&self, user_id: UserId, amount: Points) -> Result<Points, LedgerError> {
        self.ledger.credit(user_id, amount)
    }

    /// Admin: take points away; fails if the balance does not cover it.
    pub fn remove_points(&self, user_id: UserId, amount: Points) -> Result<Points, LedgerError> {
        self.ledger.debit(user_id, amount)
    }

    /// Admin: delete an account outright.
    pub fn remove_user(&self, user_id: UserId) -> Result<UserAccount, LedgerError> {
        self.ledger.remove_user(user_id)
    }

    /// A user's current balance.
    pub fn balance(&self, user_id: UserId) -> Result<Points, LedgerError> {
        self.ledger.balance(user_id)
    }

    /// The configured-size leaderboard.
    pub fn leaderboard(&self) -> Vec<UserAccount> {
        self.ledger.top(self.config.leaderboard_size)
    }

    /// Snapshot of a poll and its bets.
    pub fn poll(&self, id: PollId) -> Result<Poll, PollError> {
        self.polls.get(id)
    }

    /// Ids of polls open for betting.
    pub fn open_polls(&self) -> Vec<PollId> {
        self.polls.open_polls()
    }

    /// The read-only shop catalog.
    pub fn shop(&self) -> &ShopCatalog {
        &self.shop
    }

    /// The active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Direct ledger access for the glue layer's read paths.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }
}
