//! Economy and betting core entry point.
//!
//! The chat-platform glue normally drives [`BotCore`] directly; this binary
//! exists to validate configuration and to exercise the full betting flow
//! without a chat connection.

use clap::{Parser, Subcommand};
use time::{Duration, OffsetDateTime};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pointsbot::poll::BetOption;
use pointsbot::shop::ShopCatalog;
use pointsbot::{BotCore, Config};

/// Chat economy and betting poll engine.
#[derive(Parser, Debug)]
#[command(name = "pointsbot")]
#[command(about = "Chat economy and pari-mutuel betting poll engine")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check configuration validity.
    CheckConfig,

    /// Print the configured shop catalog.
    Shop,

    /// Run a scripted end-to-end betting round (default).
    Demo,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("pointsbot=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(),
        Some(Command::Shop) => cmd_shop(),
        Some(Command::Demo) | None => cmd_demo().await,
    }
}

/// Check configuration validity.
fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("POINTSBOT - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    print!("Loading shop catalog... ");
    match &config.shop_file {
        Some(path) => match ShopCatalog::load(path) {
            Ok(catalog) => println!("OK ({} items)", catalog.len()),
            Err(e) => {
                println!("FAILED");
                println!("  Error: {}", e);
                return Err(anyhow::anyhow!("Shop catalog load failed"));
            }
        },
        None => println!("SKIPPED (SHOP_FILE not set)"),
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Message Points: {}", config.message_points);
    println!("  Starting Balance: {}", config.starting_balance);
    println!("  Leaderboard Size: {}", config.leaderboard_size);
    println!("  Lock Timeout: {}ms", config.lock_timeout_ms);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Print the configured shop catalog.
fn cmd_shop() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    let Some(path) = &config.shop_file else {
        println!("No shop configured (set SHOP_FILE).");
        return Ok(());
    };

    let catalog = ShopCatalog::load(path)?;
    if catalog.is_empty() {
        println!("Shop catalog is empty.");
        return Ok(());
    }

    println!("Shop catalog ({} items):", catalog.len());
    for item in catalog.items() {
        println!("  {:<30} {:>8} pts", item.name, item.price);
    }

    Ok(())
}

/// Run a scripted betting round against a fresh core.
async fn cmd_demo() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;
    let core = BotCore::new(config)?;

    println!("Seeding accounts from chat activity...");
    for (user_id, name, messages) in [(1, "alice", 20), (2, "bob", 10), (3, "carol", 12)] {
        for _ in 0..messages {
            core.observe_message(user_id, name)?;
        }
        println!("  {:<8} balance {}", name, core.balance(user_id)?);
    }

    let poll_id = 1001;
    core.create_poll(
        poll_id,
        "Will the deploy go out on Friday?",
        "Yes",
        "No",
        OffsetDateTime::now_utc() + Duration::hours(1),
    )?;
    println!("Opened poll {}: open polls = {:?}", poll_id, core.open_polls());

    for (user_id, option, amount) in [
        (1, BetOption::A, 60),
        (2, BetOption::A, 30),
        (3, BetOption::B, 40),
    ] {
        let receipt = core.place_bet(poll_id, user_id, option, amount).await?;
        println!(
            "  user {} bet {} on {:?} ({}), balance now {}",
            user_id, receipt.amount, receipt.option, receipt.option_label, receipt.balance_after
        );
    }

    let report = core.end_poll(poll_id, BetOption::A).await?;
    println!(
        "Settled {:?} ({}): {} vs {} bets ({}% / {}%)",
        report.winning_option,
        report.winning_label,
        report.tally_a.bets,
        report.tally_b.bets,
        report.tally_a.percent,
        report.tally_b.percent,
    );
    for payout in &report.payouts {
        println!("  user {} staked {} -> paid {}", payout.user_id, payout.stake, payout.payout);
    }
    println!("Report payload:\n{}", serde_json::to_string_pretty(&report)?);

    println!("Leaderboard:");
    for (rank, account) in core.leaderboard().iter().enumerate() {
        println!("  #{} {:<8} {} pts", rank + 1, account.name, account.balance);
    }

    Ok(())
}
