//! solvetrack - admin CLI for cohort LeetCode progress
//!
//! Onboards students, imports spreadsheets and prints dashboards from the
//! local database. Fetching fresh stats is done by `solvetrack-sync`.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Database: $XDG_DATA_HOME/solvetrack/data.db (~/.local/share/solvetrack/data.db)
//! - Logs: $XDG_STATE_HOME/solvetrack/solvetrack.log (~/.local/state/solvetrack/solvetrack.log)
//! - Config: $XDG_CONFIG_HOME/solvetrack/config.toml (~/.config/solvetrack/config.toml)

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use solvetrack_core::dashboard::{
    self, AdminDashboard, BatchSummary, LeaderboardEntry, StudentDashboard,
};
use solvetrack_core::import::{self, ImportResult};
use solvetrack_core::{Config, Database, NewStudent, Student, WeeklyProgressData};

#[derive(Parser)]
#[command(name = "solvetrack")]
#[command(about = "Track LeetCode progress for a student cohort")]
#[command(version)]
struct Args {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    /// Day to report on (YYYY-MM-DD, defaults to today)
    #[arg(long, global = true)]
    date: Option<NaiveDate>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Create the database and run migrations
    InitDb,

    /// Onboard a single student
    AddStudent {
        /// Display name
        #[arg(long)]
        name: String,

        /// LeetCode handle or profile URL
        #[arg(long)]
        handle: String,

        /// Public profile link
        #[arg(long)]
        profile_url: Option<String>,

        /// Cohort tag
        #[arg(long)]
        batch: Option<String>,
    },

    /// Onboard students from a roster CSV (Name, Handle, ProfileLink, Batch)
    ImportRoster {
        /// Path to the CSV file
        csv: PathBuf,
    },

    /// Import a weekly grid CSV (Name, Handle, ProfileLink, Week1..Week4[, Week5])
    ImportWeekly {
        /// Path to the CSV file
        csv: PathBuf,
    },

    /// List onboarded students
    Students {
        /// Only students in this batch
        #[arg(long)]
        batch: Option<String>,
    },

    /// Cohort-wide admin dashboard
    Dashboard,

    /// One student's dashboard
    Student {
        /// LeetCode handle
        handle: String,
    },

    /// Weekly leaderboard
    Leaderboard {
        /// Number of rows (defaults to dashboard.leaderboard_size)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Per-batch summaries
    Batches,

    /// Imported weekly grid
    Grid,

    /// Export per-student rows as CSV
    Export {
        /// Output file
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Delete a student and all of their history
    RemoveStudent {
        /// LeetCode handle
        handle: String,

        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Ensure XDG environment variables are set before using core library
    Config::ensure_xdg_env();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard =
        solvetrack_core::logging::init(&config.logging).context("failed to initialize logging")?;

    let db_path = Config::database_path();
    tracing::info!(path = %db_path.display(), "Opening database");

    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;

    let today = args.date.unwrap_or_else(|| Local::now().date_naive());
    let format = args.format;

    match args.command {
        Command::InitDb => {
            println!("Database ready: {}", db_path.display());
            println!("Logs:           {}", solvetrack_core::logging::log_file_path().display());
            println!(
                "Schema:         v{}",
                db.schema_version().context("failed to read schema version")?
            );
            println!(
                "Students:       {}",
                db.count_students().context("failed to count students")?
            );
        }
        Command::AddStudent {
            name,
            handle,
            profile_url,
            batch,
        } => {
            let mut new = NewStudent::new(name, handle);
            if let Some(url) = profile_url {
                new = new.with_profile_url(url);
            }
            if let Some(batch) = batch {
                new = new.with_batch(batch);
            }
            let student = db.add_student(&new).context("failed to add student")?;
            println!("Added {} ({})", student.name, student.handle);
        }
        Command::ImportRoster { csv } => {
            let result = import::import_roster(&db, open_csv(&csv)?)
                .context("roster import failed")?;
            print_import_result("Roster import", &result, format)?;
        }
        Command::ImportWeekly { csv } => {
            let result = import::import_weekly_csv(&db, open_csv(&csv)?)
                .context("weekly grid import failed")?;
            print_import_result("Weekly grid import", &result, format)?;
        }
        Command::Students { batch } => {
            let students = match &batch {
                Some(batch) => db.list_students_in_batch(batch),
                None => db.list_students(),
            }
            .context("failed to list students")?;
            match format {
                OutputFormat::Json => print_json(&students)?,
                OutputFormat::Text => print_students(&students),
            }
        }
        Command::Dashboard => {
            let dash = dashboard::assemble_admin_dashboard(&db, today, &config)
                .context("failed to assemble dashboard")?;
            match format {
                OutputFormat::Json => print_json(&dash)?,
                OutputFormat::Text => print_admin_dashboard(&dash, today),
            }
        }
        Command::Student { handle } => {
            let student = db
                .get_student_by_handle(&handle)?
                .with_context(|| format!("no student with handle '{}'", handle))?;
            let dash = dashboard::assemble_student_dashboard(&db, &student.id, today, &config)
                .context("failed to assemble student dashboard")?;
            match format {
                OutputFormat::Json => print_json(&dash)?,
                OutputFormat::Text => print_student_dashboard(&dash),
            }
        }
        Command::Leaderboard { limit } => {
            let limit = limit.unwrap_or(config.dashboard.leaderboard_size);
            let board = dashboard::assemble_leaderboard(&db, today, &config, limit)
                .context("failed to assemble leaderboard")?;
            match format {
                OutputFormat::Json => print_json(&board)?,
                OutputFormat::Text => print_leaderboard(&board),
            }
        }
        Command::Batches => {
            let batches = dashboard::assemble_batch_summaries(&db, today, &config)
                .context("failed to assemble batch summaries")?;
            match format {
                OutputFormat::Json => print_json(&batches)?,
                OutputFormat::Text => print_batches(&batches),
            }
        }
        Command::Grid => {
            let grid = db
                .list_weekly_progress_data()
                .context("failed to read weekly grid")?;
            match format {
                OutputFormat::Json => {
                    let rows: Vec<_> = grid
                        .iter()
                        .map(|(student, data)| GridRow { student, data })
                        .collect();
                    print_json(&rows)?
                }
                OutputFormat::Text => print_grid(&grid),
            }
        }
        Command::Export { out } => {
            let rows = dashboard::export_rows(&db, today, &config)
                .context("failed to collect export rows")?;
            let mut writer = csv::Writer::from_path(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            for row in &rows {
                writer.serialize(row).context("failed to write export row")?;
            }
            writer.flush().context("failed to flush export")?;
            println!("Exported {} student(s) to {}", rows.len(), out.display());
        }
        Command::RemoveStudent { handle, yes } => {
            let student = db
                .get_student_by_handle(&handle)?
                .with_context(|| format!("no student with handle '{}'", handle))?;
            if !yes {
                anyhow::bail!(
                    "refusing to delete '{}' and all of their history without --yes",
                    student.handle
                );
            }
            let deleted = db
                .delete_student(&student.id)
                .context("failed to delete student")?;
            println!(
                "Removed {} ({} daily, {} weekly, {} badges, {} grid rows)",
                student.handle,
                deleted.daily_entries,
                deleted.weekly_entries,
                deleted.badges,
                deleted.weekly_grid_rows
            );
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct GridRow<'a> {
    student: &'a Student,
    #[serde(flatten)]
    data: &'a WeeklyProgressData,
}

fn open_csv(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("failed to open {}", path.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("failed to serialize output")?
    );
    Ok(())
}

fn print_import_result(label: &str, result: &ImportResult, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(result);
    }

    println!("{} complete: {} row(s) applied", label, result.processed());
    println!("  Imported: {}", result.imported);
    println!("  Updated:  {}", result.updated);
    println!("  Skipped:  {}", result.skipped);
    if !result.errors.is_empty() {
        println!("  Errors:   {}", result.errors.len());
        for error in &result.errors {
            println!("    {}", error);
        }
    }
    Ok(())
}

fn print_students(students: &[Student]) {
    if students.is_empty() {
        println!("No students yet. Use 'solvetrack add-student' or 'solvetrack import-roster'.");
        return;
    }
    println!("{:<24} {:<20} {:<10}", "NAME", "HANDLE", "BATCH");
    for s in students {
        println!(
            "{:<24} {:<20} {:<10}",
            s.name,
            s.handle,
            s.batch.as_deref().unwrap_or("-")
        );
    }
}

fn print_admin_dashboard(dash: &AdminDashboard, today: NaiveDate) {
    println!("Cohort dashboard for the week of {}", today);
    println!("  Students:         {}", dash.total_students);
    println!("  Active this week: {}", dash.active_students);
    println!("  Underperforming:  {}", dash.underperforming);
    println!("  Avg solved:       {:.1}", dash.avg_problems);

    if !dash.students.is_empty() {
        println!();
        println!(
            "{:<20} {:>8} {:>8} {:>7}  {}",
            "HANDLE", "SOLVED", "WEEK", "STREAK", "STATUS"
        );
        for row in &dash.students {
            println!(
                "{:<20} {:>8} {:>8} {:>7}  {}",
                row.student.handle,
                row.stats.total_solved,
                row.weekly_progress,
                row.streak,
                row.status
            );
        }
    }

    if !dash.leaderboard.is_empty() {
        println!();
        print_leaderboard(&dash.leaderboard);
    }
}

fn print_leaderboard(board: &[LeaderboardEntry]) {
    if board.is_empty() {
        println!("Leaderboard is empty.");
        return;
    }
    println!("{:>4}  {:<20} {:>8} {:>8}", "RANK", "HANDLE", "WEEK", "SOLVED");
    for entry in board {
        println!(
            "{:>4}  {:<20} {:>8} {:>8}",
            entry.rank, entry.handle, entry.weekly_progress, entry.total_solved
        );
    }
}

fn print_student_dashboard(dash: &StudentDashboard) {
    println!("{} ({})", dash.student.name, dash.student.handle);
    if let Some(batch) = &dash.student.batch {
        println!("  Batch:   {}", batch);
    }
    println!(
        "  Solved:  {} (easy {}, medium {}, hard {})",
        dash.stats.total_solved,
        dash.stats.easy_solved,
        dash.stats.medium_solved,
        dash.stats.hard_solved
    );
    if let Some(rate) = dash.stats.acceptance_rate {
        println!("  Acceptance: {:.1}%", rate);
    }
    println!("  Streak:  {} day(s)", dash.current_streak);
    match dash.weekly_rank {
        Some(rank) => println!("  Weekly rank: #{}", rank),
        None => println!("  Weekly rank: -"),
    }

    if !dash.badges.is_empty() {
        println!("\nBadges:");
        for badge in &dash.badges {
            println!("  {} ({})", badge.badge_type.display_name(), badge.granted_on);
        }
    }

    if !dash.weekly_progress.is_empty() {
        println!("\nWeekly progress:");
        for week in &dash.weekly_progress {
            println!(
                "  {}  {:>5} solved  {:+}",
                week.week_start, week.total_problems, week.weekly_increment
            );
        }
    }

    if let Some(grid) = &dash.weekly_grid {
        println!("\nWeekly grid:");
        println!(
            "  W1 {}  W2 {}  W3 {}  W4 {}  current {}  (avg growth {:+})",
            grid.week1,
            grid.week2,
            grid.week3,
            grid.week4,
            grid.current_week,
            grid.average_weekly_growth
        );
    }

    if !dash.daily_activity.is_empty() {
        println!("\nDaily activity:");
        for day in &dash.daily_activity {
            println!(
                "  {}  {:>5} solved  {:+}",
                day.date, day.total_solved, day.daily_increment
            );
        }
    }
}

fn print_batches(batches: &[BatchSummary]) {
    if batches.is_empty() {
        println!("No students yet.");
        return;
    }
    println!(
        "{:<14} {:>8} {:>7} {:>10} {:>9}  {}",
        "BATCH", "STUDENTS", "ACTIVE", "AVG SOLVED", "AVG WEEK", "TOP"
    );
    for b in batches {
        println!(
            "{:<14} {:>8} {:>7} {:>10.1} {:>9.1}  {}",
            b.batch,
            b.student_count,
            b.active_students,
            b.avg_total_solved,
            b.avg_weekly_progress,
            b.top_student.as_deref().unwrap_or("-")
        );
    }
}

fn print_grid(grid: &[(Student, WeeklyProgressData)]) {
    if grid.is_empty() {
        println!("No weekly grid imported yet. Use 'solvetrack import-weekly'.");
        return;
    }
    println!(
        "{:<20} {:>6} {:>6} {:>6} {:>6} {:>7} {:>6} {:>6}",
        "HANDLE", "W1", "W2", "W3", "W4", "CURRENT", "SCORE", "AVG+"
    );
    for (student, data) in grid {
        println!(
            "{:<20} {:>6} {:>6} {:>6} {:>6} {:>7} {:>6} {:>6}",
            student.handle,
            data.week1,
            data.week2,
            data.week3,
            data.week4,
            data.current_week,
            data.total_score,
            data.average_weekly_growth
        );
    }
}
