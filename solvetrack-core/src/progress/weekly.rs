//! Weekly trend buckets.
//!
//! Weeks start on Monday (ISO). A bucket's increment is always measured
//! against the most recent stored bucket before it, so every update within
//! a week reports "total growth versus last week", not growth since the
//! previous sync.

use chrono::{Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::db::Database;
use crate::error::Result;
use crate::types::{Student, WeeklyTrendEntry};

/// Monday-to-Sunday bounds of the week containing `date`.
pub fn week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = date - Duration::days(date.weekday().num_days_from_monday() as i64);
    (start, start + Duration::days(6))
}

/// Create or update the bucket for the week containing `as_of`.
pub fn update_weekly_trend(
    db: &Database,
    student_id: &str,
    total_solved: i64,
    as_of: NaiveDate,
) -> Result<WeeklyTrendEntry> {
    db.require_student(student_id)?;

    let (week_start, week_end) = week_bounds(as_of);
    let baseline = db
        .get_weekly_entry_before(student_id, week_start)?
        .map(|prev| prev.total_problems)
        .unwrap_or(0);
    let is_update = db.get_weekly_entry(student_id, week_start)?.is_some();

    let entry = WeeklyTrendEntry {
        student_id: student_id.to_string(),
        week_start,
        week_end,
        total_problems: total_solved,
        weekly_increment: total_solved - baseline,
        updated_at: Utc::now(),
    };
    db.upsert_weekly_entry(&entry)?;

    tracing::debug!(
        student_id,
        week_start = %week_start,
        total_problems = total_solved,
        weekly_increment = entry.weekly_increment,
        updated = is_update,
        "Updated weekly trend"
    );

    if let Some(mut next) = db.get_weekly_entry_after(student_id, week_start)? {
        let increment = next.total_problems - entry.total_problems;
        if increment != next.weekly_increment {
            next.weekly_increment = increment;
            next.updated_at = Utc::now();
            db.upsert_weekly_entry(&next)?;
        }
    }

    Ok(entry)
}

/// A student's position for one week.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyRanking {
    /// 1-based position
    pub rank: usize,
    pub student: Student,
    /// The week's increment, 0 if the student has no bucket
    pub weekly_progress: i64,
}

/// Rank every student for the week starting at `week_start`.
///
/// Sorted by weekly increment descending. Ties keep roster order
/// (onboarding time), which makes the ordering deterministic.
pub fn rank_week(db: &Database, week_start: NaiveDate) -> Result<Vec<WeeklyRanking>> {
    let students = db.list_students()?;
    let entries = db.list_weekly_entries_for_week(week_start)?;

    let mut rows: Vec<(Student, i64)> = students
        .into_iter()
        .map(|student| {
            let progress = entries
                .iter()
                .find(|e| e.student_id == student.id)
                .map(|e| e.weekly_increment)
                .unwrap_or(0);
            (student, progress)
        })
        .collect();

    // Vec::sort_by is stable
    rows.sort_by(|a, b| b.1.cmp(&a.1));

    Ok(rows
        .into_iter()
        .enumerate()
        .map(|(i, (student, weekly_progress))| WeeklyRanking {
            rank: i + 1,
            student,
            weekly_progress,
        })
        .collect())
}
