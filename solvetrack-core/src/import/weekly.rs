//! Weekly grid CSV import.

use std::io::Read;

use csv::{ReaderBuilder, StringRecord, Trim};

use super::ImportResult;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::types::{normalize_handle, WeeklyProgressData};

/// Columns before the first week cell.
const LEADING_COLUMNS: usize = 3;
/// Weeks that make up the grid.
const GRID_WEEKS: usize = 4;
/// Largest magnitude accepted for a cumulative cell; anything beyond is noise.
const MAX_CELL_VALUE: i64 = 1_000_000_000;

/// One data row of a weekly grid CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRow {
    pub name: String,
    pub handle: String,
    pub profile_link: Option<String>,
    /// Cumulative totals, Week1 first
    pub weeks: Vec<i64>,
}

/// Parsed rows plus messages for rows that could not be read.
#[derive(Debug, Clone, Default)]
pub struct ParsedCsv {
    pub rows: Vec<ParsedRow>,
    pub errors: Vec<String>,
}

/// Read a numeric cell, treating blanks and placeholder text as 0.
///
/// Thousands separators are ignored and fractional values are rounded to the
/// nearest integer. Values beyond `MAX_CELL_VALUE` count as 0.
pub fn coerce_cell(cell: &str) -> i64 {
    let cell = cell.trim();
    if cell.is_empty() {
        return 0;
    }
    let digits = cell.replace(',', "");
    let value = match digits.parse::<i64>() {
        Ok(n) => Some(n),
        Err(_) => match digits.parse::<f64>() {
            Ok(f) if f.is_finite() && f.abs() <= MAX_CELL_VALUE as f64 => Some(f.round() as i64),
            _ => None,
        },
    };
    match value {
        Some(n) if (-MAX_CELL_VALUE..=MAX_CELL_VALUE).contains(&n) => n,
        _ => {
            tracing::debug!(cell = %cell, "Coercing non-numeric cell to 0");
            0
        }
    }
}

/// Parse a weekly grid CSV with a header row.
///
/// A header with fewer than the leading columns is rejected outright; rows
/// without a handle column are collected as errors and skipped.
pub fn parse_weekly_csv<R: Read>(reader: R) -> Result<ParsedCsv> {
    let mut csv = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = csv.headers()?.clone();
    if headers.len() < LEADING_COLUMNS {
        return Err(Error::MalformedInput(format!(
            "expected header Name, Handle, ProfileLink, Week1..Week4, got {} columns",
            headers.len()
        )));
    }

    let mut parsed = ParsedCsv::default();
    for (index, record) in csv.records().enumerate() {
        // Header is line 1
        let line = index + 2;
        match record {
            Ok(record) => match parse_record(&record) {
                Some(row) => parsed.rows.push(row),
                None => parsed
                    .errors
                    .push(format!("line {}: expected at least Name and Handle", line)),
            },
            Err(e) => parsed.errors.push(format!("line {}: {}", line, e)),
        }
    }

    Ok(parsed)
}

fn parse_record(record: &StringRecord) -> Option<ParsedRow> {
    if record.len() < 2 {
        return None;
    }
    let name = record.get(0).unwrap_or_default().to_string();
    let handle = record.get(1).unwrap_or_default().to_string();
    let profile_link = record
        .get(2)
        .filter(|link| !link.is_empty())
        .map(str::to_string);
    let weeks = record.iter().skip(LEADING_COLUMNS).map(coerce_cell).collect();

    Some(ParsedRow {
        name,
        handle,
        profile_link,
        weeks,
    })
}

/// Derive the grid row for `student_id` from cumulative week totals.
///
/// Missing weeks count as 0. The current week is the column after Week4
/// when present, otherwise Week4 itself.
pub fn compute_weekly_progress(student_id: &str, weeks: &[i64]) -> WeeklyProgressData {
    let week = |i: usize| weeks.get(i).copied().unwrap_or(0);
    let (week1, week2, week3, week4) = (week(0), week(1), week(2), week(3));
    let current_week = weeks.get(GRID_WEEKS).copied().unwrap_or(week4);

    let deltas = [
        week2.saturating_sub(week1),
        week3.saturating_sub(week2),
        week4.saturating_sub(week3),
        current_week.saturating_sub(week4),
    ];
    let delta_sum = deltas.iter().fold(0i64, |acc, d| acc.saturating_add(*d));
    let average_weekly_growth = (delta_sum as f64 / deltas.len() as f64).round() as i64;

    WeeklyProgressData {
        student_id: student_id.to_string(),
        week1,
        week2,
        week3,
        week4,
        current_week,
        week1_to_week2: deltas[0],
        week2_to_week3: deltas[1],
        week3_to_week4: deltas[2],
        last_week_to_current_increment: deltas[3],
        total_score: weeks.iter().fold(0i64, |acc, w| acc.saturating_add(*w)),
        average_weekly_growth,
    }
}

/// Merge parsed rows into the weekly grid. Re-importing is a pure overwrite.
pub fn import_weekly_snapshot(db: &Database, rows: &[ParsedRow]) -> Result<ImportResult> {
    let mut result = ImportResult::default();

    for row in rows {
        let handle = normalize_handle(&row.handle);
        if handle.is_empty() {
            tracing::warn!(name = %row.name, "Skipping row without handle");
            result.skipped += 1;
            continue;
        }
        let Some(student) = db.get_student_by_handle(&handle)? else {
            tracing::warn!(handle = %handle, "Skipping row for unknown handle");
            result.skipped += 1;
            continue;
        };

        let data = compute_weekly_progress(&student.id, &row.weeks);
        if db.upsert_weekly_progress_data(&data)? {
            result.imported += 1;
        } else {
            result.updated += 1;
        }
    }

    tracing::info!(
        imported = result.imported,
        updated = result.updated,
        skipped = result.skipped,
        "Weekly grid import complete"
    );
    Ok(result)
}

/// Parse and import a weekly grid CSV in one step.
pub fn import_weekly_csv<R: Read>(db: &Database, reader: R) -> Result<ImportResult> {
    let parsed = parse_weekly_csv(reader)?;
    for error in &parsed.errors {
        tracing::warn!(error = %error, "Malformed weekly grid row");
    }
    let mut result = import_weekly_snapshot(db, &parsed.rows)?;
    result.errors = parsed.errors;
    Ok(result)
}
