//! Cohort and per-student read models.
//!
//! Every view is assembled from the stored daily and weekly series. Failures
//! reading one student's data are logged and replaced with zeroed values so a
//! dashboard always renders.

mod batch;
mod export;
mod student;

pub use batch::{assemble_batch_summaries, BatchSummary, UNASSIGNED_BATCH};
pub use export::{export_rows, ExportRow};
pub use student::{assemble_student_dashboard, StudentDashboard};

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::progress::{week_bounds, StreakCalculator};
use crate::types::{ActivityStatus, SolveStats, Student};

/// One student's current numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRow {
    pub student: Student,
    pub stats: SolveStats,
    /// Increment of the week containing `today`, 0 when no bucket exists
    pub weekly_progress: i64,
    pub streak: u32,
    pub status: ActivityStatus,
}

/// Leaderboard position.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// 1-based
    pub rank: usize,
    pub name: String,
    pub handle: String,
    pub weekly_progress: i64,
    pub total_solved: i64,
    pub streak: u32,
}

/// Cohort-wide admin view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboard {
    pub total_students: usize,
    /// Students with any progress this week
    pub active_students: usize,
    /// Mean latest total solved, 0 for an empty roster
    pub avg_problems: f64,
    /// Students below the "Active" tier
    pub underperforming: usize,
    pub students: Vec<StudentRow>,
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Build the admin dashboard for the week containing `today`.
pub fn assemble_admin_dashboard(
    db: &Database,
    today: NaiveDate,
    config: &Config,
) -> Result<AdminDashboard> {
    let rows = collect_student_rows(db, today, config)?;

    let total_students = rows.len();
    let active_students = rows.iter().filter(|r| r.weekly_progress > 0).count();
    let underperforming = rows
        .iter()
        .filter(|r| r.weekly_progress < ActivityStatus::ACTIVE_THRESHOLD)
        .count();
    let avg_problems = mean(rows.iter().map(|r| r.stats.total_solved));
    let leaderboard = rank_rows(&rows, config.dashboard.leaderboard_size);

    tracing::debug!(
        total_students,
        active_students,
        underperforming,
        "Assembled admin dashboard"
    );

    Ok(AdminDashboard {
        total_students,
        active_students,
        avg_problems,
        underperforming,
        students: rows,
        leaderboard,
    })
}

/// Top `limit` students by progress in the week containing `today`.
pub fn assemble_leaderboard(
    db: &Database,
    today: NaiveDate,
    config: &Config,
    limit: usize,
) -> Result<Vec<LeaderboardEntry>> {
    let rows = collect_student_rows(db, today, config)?;
    Ok(rank_rows(&rows, limit))
}

/// Rows for every student in roster order.
///
/// Only listing the roster can fail; per-student lookups fall back to zeroes.
pub fn collect_student_rows(
    db: &Database,
    today: NaiveDate,
    config: &Config,
) -> Result<Vec<StudentRow>> {
    let students = db.list_students()?;
    let streak = StreakCalculator::from(&config.progress);
    let (week_start, _) = week_bounds(today);

    Ok(students
        .into_iter()
        .map(|student| student_row(db, student, week_start, today, &streak))
        .collect())
}

fn student_row(
    db: &Database,
    student: Student,
    week_start: NaiveDate,
    today: NaiveDate,
    streak: &StreakCalculator,
) -> StudentRow {
    let stats = latest_stats(db, &student);

    let weekly_progress = match db.get_weekly_entry(&student.id, week_start) {
        Ok(entry) => entry.map(|e| e.weekly_increment).unwrap_or(0),
        Err(e) => {
            tracing::warn!(handle = %student.handle, error = %e, "Failed to read weekly trend");
            0
        }
    };

    let streak = match streak.calculate(db, &student.id, today) {
        Ok(days) => days,
        Err(e) => {
            tracing::warn!(handle = %student.handle, error = %e, "Failed to compute streak");
            0
        }
    };

    StudentRow {
        stats,
        weekly_progress,
        streak,
        status: ActivityStatus::from_weekly_progress(weekly_progress),
        student,
    }
}

/// Most recent stats for `student`, zeroed when none can be read.
pub(crate) fn latest_stats(db: &Database, student: &Student) -> SolveStats {
    match db.get_latest_daily_entry(&student.id) {
        Ok(entry) => entry.map(|e| e.stats()).unwrap_or_default(),
        Err(e) => {
            tracing::warn!(handle = %student.handle, error = %e, "Failed to read latest stats");
            SolveStats::default()
        }
    }
}

/// Sort by weekly progress descending; ties keep roster order.
fn rank_rows(rows: &[StudentRow], limit: usize) -> Vec<LeaderboardEntry> {
    let mut sorted: Vec<&StudentRow> = rows.iter().collect();
    sorted.sort_by(|a, b| b.weekly_progress.cmp(&a.weekly_progress));

    sorted
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, row)| LeaderboardEntry {
            rank: i + 1,
            name: row.student.name.clone(),
            handle: row.student.handle.clone(),
            weekly_progress: row.weekly_progress,
            total_solved: row.stats.total_solved,
            streak: row.streak,
        })
        .collect()
}

pub(crate) fn mean(values: impl Iterator<Item = i64>) -> f64 {
    let (sum, count) = values.fold((0i64, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}
