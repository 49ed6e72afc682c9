//! Chat economy and pari-mutuel betting poll engine.
//!
//! This library implements the core of a chat-platform bot: users earn
//! points per message, admins adjust balances, and binary betting polls
//! escrow wagers until an admin settles them pari-mutuel style.
//!
//! # Payout model
//!
//! Losing stakes are split among winners proportionally to stake:
//!
//! ```text
//! Option A bets:  U1: 100, U2: 50   (winning pool 150)
//! Option B bets:  U3: 60            (losing pool 60)
//! ───────────────────────────────────────────────────
//! settle(A):      U1 → 100 + ⌊60·100/150⌋ = 140
//!                 U2 →  50 + ⌊60·50/150⌋  =  70
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`economy`]: Balance ledger and accounts
//! - [`shop`]: Static price catalog
//! - [`poll`]: Poll records and their store
//! - [`betting`]: Bet validation and escrow
//! - [`settlement`]: Payout computation and winner credits
//! - [`sync`]: Per-poll/per-user serialization
//! - [`context`]: The assembled [`BotCore`]

pub mod betting;
pub mod config;
pub mod context;
pub mod economy;
pub mod error;
pub mod poll;
pub mod settlement;
pub mod shop;
pub mod sync;

pub use config::Config;
pub use context::BotCore;
pub use error::{BotError, Result};

/// Opaque stable user id assigned by the host chat platform.
pub type UserId = u64;

/// Poll id, assigned by the hosting message system.
pub type PollId = u64;

/// Integer point amount.
pub type Points = u64;
