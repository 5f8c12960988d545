//! Flat rows for spreadsheet export.

use chrono::NaiveDate;
use serde::Serialize;

use super::collect_student_rows;
use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::types::ActivityStatus;

/// One exported line. Field names double as CSV headers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRow {
    pub name: String,
    pub handle: String,
    pub total_solved: i64,
    pub weekly_progress: i64,
    pub streak: u32,
    pub status: ActivityStatus,
}

/// Export rows for every student in roster order.
pub fn export_rows(db: &Database, today: NaiveDate, config: &Config) -> Result<Vec<ExportRow>> {
    Ok(collect_student_rows(db, today, config)?
        .into_iter()
        .map(|row| ExportRow {
            name: row.student.name,
            handle: row.student.handle,
            total_solved: row.stats.total_solved,
            weekly_progress: row.weekly_progress,
            streak: row.streak,
            status: row.status,
        })
        .collect())
}
