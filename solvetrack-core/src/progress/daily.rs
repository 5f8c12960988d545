//! Daily snapshot reconciliation.
//!
//! Each (student, date) has exactly one entry. Its increment is always taken
//! against the most recent entry strictly before that date, never against a
//! previous write of the same date, so re-syncing a day is idempotent.

use chrono::{NaiveDate, Utc};

use crate::db::Database;
use crate::error::Result;
use crate::types::{DailyProgressEntry, SolveStats};

/// Record `snapshot` as the entry for `as_of`, creating or overwriting it.
///
/// A total lower than the prior entry is stored as a negative increment.
/// If a later entry already exists (history backfill), its increment is
/// re-derived against the new entry.
pub fn record_daily_snapshot(
    db: &Database,
    student_id: &str,
    snapshot: &SolveStats,
    as_of: NaiveDate,
) -> Result<DailyProgressEntry> {
    db.require_student(student_id)?;

    let prior_total = db
        .get_daily_entry_before(student_id, as_of)?
        .map(|prior| prior.total_solved)
        .unwrap_or(0);
    let is_update = db.get_daily_entry(student_id, as_of)?.is_some();

    let entry = DailyProgressEntry {
        student_id: student_id.to_string(),
        date: as_of,
        total_solved: snapshot.total_solved,
        easy_solved: snapshot.easy_solved,
        medium_solved: snapshot.medium_solved,
        hard_solved: snapshot.hard_solved,
        acceptance_rate: snapshot.acceptance_rate,
        daily_increment: snapshot.total_solved - prior_total,
        updated_at: Utc::now(),
    };

    if entry.daily_increment < 0 {
        tracing::warn!(
            student_id,
            date = %as_of,
            prior_total,
            total_solved = entry.total_solved,
            "Solved count decreased since prior entry"
        );
    }

    db.upsert_daily_entry(&entry)?;

    tracing::debug!(
        student_id,
        date = %as_of,
        total_solved = entry.total_solved,
        daily_increment = entry.daily_increment,
        updated = is_update,
        "Recorded daily snapshot"
    );

    if let Some(mut next) = db.get_daily_entry_after(student_id, as_of)? {
        let increment = next.total_solved - entry.total_solved;
        if increment != next.daily_increment {
            next.daily_increment = increment;
            next.updated_at = Utc::now();
            db.upsert_daily_entry(&next)?;
            tracing::debug!(
                student_id,
                date = %next.date,
                daily_increment = increment,
                "Re-derived increment of following entry"
            );
        }
    }

    Ok(entry)
}
