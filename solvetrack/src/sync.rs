//! solvetrack-sync - fetch fresh LeetCode stats for every student
//!
//! Runs one "sync all" by default. With `--watch` it starts the recurring
//! sync scheduler and keeps running until Ctrl+C.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Database: $XDG_DATA_HOME/solvetrack/data.db (~/.local/share/solvetrack/data.db)
//! - Logs: $XDG_STATE_HOME/solvetrack/solvetrack.log (~/.local/state/solvetrack/solvetrack.log)
//! - Config: $XDG_CONFIG_HOME/solvetrack/config.toml (~/.config/solvetrack/config.toml)

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{ArgAction, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use solvetrack_core::{
    Config, Database, LeetCodeClient, SyncCoordinator, SyncResult, SyncScheduler,
};

#[derive(Parser)]
#[command(name = "solvetrack-sync")]
#[command(about = "Sync LeetCode stats for every student")]
#[command(version)]
struct Args {
    /// Verbose output (-v lists failures)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Sync a single student instead of the whole roster
    #[arg(long)]
    handle: Option<String>,

    /// Record the snapshot for this day (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Watch mode - sync on a schedule instead of one-shot
    #[arg(short, long)]
    watch: bool,

    /// Minutes between syncs in watch mode (defaults to sync.interval_minutes)
    #[arg(long)]
    interval: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Ensure XDG environment variables are set before using core library
    Config::ensure_xdg_env();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard =
        solvetrack_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!("solvetrack-sync starting");

    let db_path = Config::database_path();
    tracing::info!(path = %db_path.display(), "Opening database");

    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;

    println!("Database: {}", db_path.display());

    let source = LeetCodeClient::new(&config.source).context("failed to create stats client")?;
    let coordinator = SyncCoordinator::new(Arc::new(db), Arc::new(source), &config);

    if args.watch {
        let minutes = args.interval.unwrap_or(config.sync.interval_minutes).max(1);
        run_watch_mode(coordinator, Duration::from_secs(minutes * 60), args.verbose).await
    } else if let Some(handle) = &args.handle {
        let as_of = args.date.unwrap_or_else(|| Local::now().date_naive());
        run_single_student(&coordinator, handle, as_of).await
    } else {
        let as_of = args.date.unwrap_or_else(|| Local::now().date_naive());
        run_single_sync(&coordinator, as_of, args.verbose).await
    }
}

/// Sync one student and print what changed
async fn run_single_student(
    coordinator: &SyncCoordinator,
    handle: &str,
    as_of: NaiveDate,
) -> Result<()> {
    let outcome = coordinator
        .sync_handle(handle, as_of)
        .await
        .with_context(|| format!("failed to sync '{}'", handle))?;

    println!("Synced {} for {}:", handle, as_of);
    println!("  Total solved:  {}", outcome.daily.total_solved);
    println!("  Today:         {:+}", outcome.daily.daily_increment);
    println!("  This week:     {:+}", outcome.weekly.weekly_increment);
    println!("  Streak:        {} day(s)", outcome.streak);
    for badge in &outcome.new_badges {
        println!("  New badge:     {}", badge.badge_type.display_name());
    }
    Ok(())
}

/// Run a single sync operation with progress bar
async fn run_single_sync(coordinator: &SyncCoordinator, as_of: NaiveDate, verbose: u8) -> Result<()> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("invalid progress template")?
            .progress_chars("#>-"),
    );

    let result = coordinator
        .sync_all_with_progress(as_of, |completed, total, handle| {
            pb.set_length(total as u64);
            pb.set_position(completed as u64);
            pb.set_message(handle.to_string());
        })
        .await
        .context("sync failed")?;

    pb.finish_and_clear();

    print_sync_result(&result, verbose);

    tracing::info!(
        succeeded = result.succeeded,
        failed = result.failed,
        "solvetrack-sync complete"
    );

    Ok(())
}

/// Run the recurring scheduler until Ctrl+C
async fn run_watch_mode(coordinator: SyncCoordinator, interval: Duration, verbose: u8) -> Result<()> {
    println!(
        "Watch mode active (sync every {} min). Press Ctrl+C to stop.",
        interval.as_secs() / 60
    );
    println!();

    let handle = SyncScheduler::start_with_callback(coordinator, interval, move |result| {
        let timestamp = Local::now().format("%H:%M:%S");
        println!(
            "[{}] Synced {}/{} students, {} badge(s) granted",
            timestamp, result.succeeded, result.attempted, result.badges_granted
        );
        if verbose >= 1 {
            for (handle, error) in &result.errors {
                println!("  {}: {}", handle, error);
            }
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;
    eprintln!("\nShutting down...");

    let runs = handle.stop().await;
    println!("Watch mode stopped after {} sync(s).", runs);
    tracing::info!(runs, "solvetrack-sync watch mode stopped");

    Ok(())
}

/// Print sync result summary
fn print_sync_result(result: &SyncResult, verbose: u8) {
    println!("\nSync complete:");
    println!("  Students:       {}", result.attempted);
    println!("  Succeeded:      {}", result.succeeded);
    println!("  Failed:         {}", result.failed);
    println!("  Badges granted: {}", result.badges_granted);

    if !result.errors.is_empty() {
        if verbose >= 1 {
            println!("\nFailures:");
            for (handle, error) in &result.errors {
                println!("  {}: {}", handle, error);
            }
        } else {
            println!("\nRun with -v to list failures.");
        }
    }
}
