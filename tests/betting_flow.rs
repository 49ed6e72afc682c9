//! End-to-end tests for the economy and betting core.
//!
//! Drives the public [`BotCore`] surface the way the chat glue would:
//! message awards, admin point grants, poll lifecycle, escrowed bets, and
//! pari-mutuel settlement.

use pretty_assertions::assert_eq;
use time::{Duration, OffsetDateTime};

use pointsbot::error::{BettingError, SettlementError};
use pointsbot::poll::BetOption;
use pointsbot::shop::ShopCatalog;
use pointsbot::{BotCore, Config};

fn core() -> BotCore {
    BotCore::with_shop(
        Config {
            message_points: 0,
            ..Config::default()
        },
        ShopCatalog::default(),
    )
}

fn in_one_hour() -> OffsetDateTime {
    OffsetDateTime::now_utc() + Duration::hours(1)
}

/// Register a user and grant an exact balance.
fn seed(core: &BotCore, user_id: u64, name: &str, balance: u64) {
    core.observe_message(user_id, name).unwrap();
    if balance > 0 {
        core.add_points(user_id, balance).unwrap();
    }
}

#[tokio::test]
async fn full_round_matches_worked_example() {
    let core = core();
    seed(&core, 1, "u1", 100);
    seed(&core, 2, "u2", 80);
    seed(&core, 3, "u3", 60);

    core.create_poll(9, "Q", "Heads", "Tails", in_one_hour()).unwrap();

    core.place_bet(9, 1, BetOption::A, 100).await.unwrap();
    core.place_bet(9, 2, BetOption::A, 50).await.unwrap();
    core.place_bet(9, 3, BetOption::B, 60).await.unwrap();

    // Stakes are escrowed the moment the bet lands.
    assert_eq!(core.balance(1).unwrap(), 0);
    assert_eq!(core.balance(2).unwrap(), 30);
    assert_eq!(core.balance(3).unwrap(), 0);

    let report = core.end_poll(9, BetOption::A).await.unwrap();

    assert_eq!(core.balance(1).unwrap(), 140);
    assert_eq!(core.balance(2).unwrap(), 30 + 70);
    assert_eq!(core.balance(3).unwrap(), 0);
    assert_eq!(report.total_paid(), 210);
    // Conservation: paid out no more than the closed pool.
    assert!(report.total_paid() <= 150 + 60);
}

#[tokio::test]
async fn duplicate_vote_cannot_double_spend() {
    let core = core();
    seed(&core, 1, "u1", 100);
    core.create_poll(1, "Q", "A", "B", in_one_hour()).unwrap();

    core.place_bet(1, 1, BetOption::A, 10).await.unwrap();
    for _ in 0..3 {
        assert!(core.place_bet(1, 1, BetOption::B, 10).await.is_err());
    }

    assert_eq!(core.balance(1).unwrap(), 90);
    assert_eq!(core.poll(1).unwrap().participants(), 1);
}

#[tokio::test]
async fn expired_poll_rejects_bets_until_settled() {
    let core = core();
    seed(&core, 1, "u1", 1_000);
    core.create_poll(1, "Q", "A", "B", OffsetDateTime::now_utc() - Duration::seconds(1))
        .unwrap();

    let err = core.place_bet(1, 1, BetOption::A, 5).await.unwrap_err();
    assert!(matches!(err, BettingError::PollClosedOrExpired { poll_id: 1 }));

    // An expired-but-unsettled poll can still be adjudicated.
    let report = core.end_poll(1, BetOption::A).await.unwrap();
    assert!(report.payouts.is_empty());
}

#[tokio::test]
async fn settlement_is_single_shot() {
    let core = core();
    seed(&core, 1, "u1", 40);
    seed(&core, 2, "u2", 40);
    core.create_poll(1, "Q", "A", "B", in_one_hour()).unwrap();
    core.place_bet(1, 1, BetOption::A, 40).await.unwrap();
    core.place_bet(1, 2, BetOption::B, 40).await.unwrap();

    core.end_poll(1, BetOption::A).await.unwrap();
    let balances = (core.balance(1).unwrap(), core.balance(2).unwrap());

    let err = core.end_poll(1, BetOption::A).await.unwrap_err();
    assert!(matches!(err, SettlementError::AlreadySettled { poll_id: 1 }));

    // The failed second settlement paid nothing.
    assert_eq!((core.balance(1).unwrap(), core.balance(2).unwrap()), balances);
}

#[tokio::test]
async fn forfeited_pool_is_not_refunded() {
    let core = core();
    seed(&core, 1, "u1", 70);
    core.create_poll(1, "Q", "A", "B", in_one_hour()).unwrap();
    core.place_bet(1, 1, BetOption::A, 70).await.unwrap();

    let report = core.end_poll(1, BetOption::B).await.unwrap();

    assert!(report.payouts.is_empty());
    assert_eq!(core.balance(1).unwrap(), 0);
    assert!(!core.poll(1).unwrap().active);
}

#[tokio::test]
async fn total_points_never_exceed_minted_amount() {
    let core = core();
    let minted: u64 = 100 + 200 + 300;
    seed(&core, 1, "u1", 100);
    seed(&core, 2, "u2", 200);
    seed(&core, 3, "u3", 300);

    core.create_poll(1, "Q", "A", "B", in_one_hour()).unwrap();
    core.place_bet(1, 1, BetOption::A, 33).await.unwrap();
    core.place_bet(1, 2, BetOption::B, 177).await.unwrap();
    core.place_bet(1, 3, BetOption::A, 250).await.unwrap();
    core.end_poll(1, BetOption::A).await.unwrap();

    let total: u64 = core.ledger().all_users().iter().map(|a| a.balance).sum();
    // Floor division may burn remainder points but never mints new ones.
    assert!(total <= minted);
}

#[tokio::test]
async fn leaderboard_is_deterministic_on_ties() {
    let core = core();
    seed(&core, 1, "u1", 10);
    seed(&core, 2, "u2", 50);
    seed(&core, 3, "u3", 30);
    seed(&core, 4, "u4", 50);

    let top: Vec<u64> = core.leaderboard().iter().map(|a| a.user_id).collect();
    assert_eq!(top, vec![2, 4, 3, 1]);
}

#[tokio::test]
async fn distinct_users_bet_concurrently_on_one_poll() {
    let core = std::sync::Arc::new(core());
    core.create_poll(1, "Q", "A", "B", in_one_hour()).unwrap();

    for user_id in 1..=8u64 {
        seed(&core, user_id, &format!("u{user_id}"), 100);
    }

    let mut tasks = Vec::new();
    for user_id in 1..=8u64 {
        let core = core.clone();
        let option = if user_id % 2 == 0 { BetOption::A } else { BetOption::B };
        tasks.push(tokio::spawn(async move {
            core.place_bet(1, user_id, option, 100).await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let poll = core.poll(1).unwrap();
    assert_eq!(poll.participants(), 8);
    assert_eq!(poll.pool(BetOption::A) + poll.pool(BetOption::B), 800);

    let report = core.end_poll(1, BetOption::B).await.unwrap();
    assert_eq!(report.payouts.len(), 4);
    // Even split: each winner doubles their stake, conserving the pool.
    assert_eq!(report.total_paid(), 800);
}
