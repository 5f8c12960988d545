//! Per-cohort comparison.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::{collect_student_rows, mean, StudentRow};
use crate::config::Config;
use crate::db::Database;
use crate::error::Result;

/// Label for students without a batch tag.
pub const UNASSIGNED_BATCH: &str = "unassigned";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub batch: String,
    pub student_count: usize,
    pub active_students: usize,
    pub avg_total_solved: f64,
    pub avg_weekly_progress: f64,
    /// Handle of the batch's best performer this week
    pub top_student: Option<String>,
}

/// Summaries for every batch, ordered by batch name.
pub fn assemble_batch_summaries(
    db: &Database,
    today: NaiveDate,
    config: &Config,
) -> Result<Vec<BatchSummary>> {
    let rows = collect_student_rows(db, today, config)?;

    let mut batches: BTreeMap<String, Vec<StudentRow>> = BTreeMap::new();
    for row in rows {
        let key = row
            .student
            .batch
            .clone()
            .unwrap_or_else(|| UNASSIGNED_BATCH.to_string());
        batches.entry(key).or_default().push(row);
    }

    Ok(batches
        .into_iter()
        .map(|(batch, rows)| summarize(batch, &rows))
        .collect())
}

fn summarize(batch: String, rows: &[StudentRow]) -> BatchSummary {
    // max_by_key returns the last maximum; reverse so the first in roster order wins
    let top_student = rows
        .iter()
        .rev()
        .filter(|r| r.weekly_progress > 0)
        .max_by_key(|r| r.weekly_progress)
        .map(|r| r.student.handle.clone());

    BatchSummary {
        batch,
        student_count: rows.len(),
        active_students: rows.iter().filter(|r| r.weekly_progress > 0).count(),
        avg_total_solved: mean(rows.iter().map(|r| r.stats.total_solved)),
        avg_weekly_progress: mean(rows.iter().map(|r| r.weekly_progress)),
        top_student,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ProgressEngine;
    use crate::types::{NewStudent, SolveStats};

    #[test]
    fn test_batches_grouped_and_sorted() {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        let engine = ProgressEngine::default();
        let today = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();

        for (handle, batch, total) in [
            ("a", Some("2027"), 10),
            ("b", Some("2026"), 30),
            ("c", Some("2027"), 10),
            ("d", None, 0),
        ] {
            let mut new = NewStudent::new(handle, handle);
            if let Some(batch) = batch {
                new = new.with_batch(batch);
            }
            let s = db.add_student(&new).unwrap();
            engine
                .apply_snapshot(&db, &s.id, &SolveStats::new(total, total, 0, 0), today)
                .unwrap();
        }

        let summaries = assemble_batch_summaries(&db, today, &Config::default()).unwrap();
        let names: Vec<_> = summaries.iter().map(|s| s.batch.as_str()).collect();
        assert_eq!(names, vec!["2026", "2027", UNASSIGNED_BATCH]);

        let cohort = &summaries[1];
        assert_eq!(cohort.student_count, 2);
        assert_eq!(cohort.active_students, 2);
        assert_eq!(cohort.avg_total_solved, 10.0);
        assert_eq!(cohort.top_student.as_deref(), Some("a"));

        assert_eq!(summaries[2].top_student, None);
    }
}
