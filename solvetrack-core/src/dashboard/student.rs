//! Single-student dashboard.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use super::latest_stats;
use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::progress::{rank_week, week_bounds, StreakCalculator};
use crate::types::{
    Badge, DailyProgressEntry, SolveStats, Student, WeeklyProgressData, WeeklyTrendEntry,
};

/// Everything shown for one student.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDashboard {
    pub student: Student,
    pub stats: SolveStats,
    pub current_streak: u32,
    /// Position in the current week's ranking
    pub weekly_rank: Option<usize>,
    pub badges: Vec<Badge>,
    /// Recent week buckets, oldest first
    pub weekly_progress: Vec<WeeklyTrendEntry>,
    /// Recent daily entries, oldest first
    pub daily_activity: Vec<DailyProgressEntry>,
    /// Imported weekly grid row, if any
    pub weekly_grid: Option<WeeklyProgressData>,
}

/// Assemble the dashboard of `student_id` as of `today`.
///
/// Fails with `NotFound` for an unknown student.
pub fn assemble_student_dashboard(
    db: &Database,
    student_id: &str,
    today: NaiveDate,
    config: &Config,
) -> Result<StudentDashboard> {
    let student = db.require_student(student_id)?;
    let stats = latest_stats(db, &student);

    let current_streak = StreakCalculator::from(&config.progress)
        .calculate(db, &student.id, today)
        .unwrap_or_else(|e| {
            tracing::warn!(handle = %student.handle, error = %e, "Failed to compute streak");
            0
        });

    let (week_start, _) = week_bounds(today);
    let weekly_rank = rank_week(db, week_start)?
        .into_iter()
        .find(|r| r.student.id == student.id)
        .map(|r| r.rank);

    let badges = db.list_badges(&student.id)?;

    let mut weekly_progress =
        db.list_weekly_entries(&student.id, config.dashboard.recent_weeks as usize)?;
    weekly_progress.reverse();

    let since = today - Duration::days(i64::from(config.dashboard.recent_days.max(1)) - 1);
    let daily_activity = db.list_daily_entries_between(&student.id, since, today)?;
    let weekly_grid = db.get_weekly_progress_data(&student.id)?;

    Ok(StudentDashboard {
        student,
        stats,
        current_streak,
        weekly_rank,
        badges,
        weekly_progress,
        daily_activity,
        weekly_grid,
    })
}
