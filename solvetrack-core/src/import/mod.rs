//! Spreadsheet imports.
//!
//! Two CSV layouts are accepted:
//!
//! - roster: `Name, Handle, ProfileLink, Batch` onboarding students
//! - weekly grid: `Name, Handle, ProfileLink, Week1..Week4[, Week5...]`
//!   cumulative totals merged into the weekly grid table
//!
//! Row-level problems never abort an import; they are tallied in
//! [`ImportResult`]. Only storage failures are returned as errors.

mod roster;
mod weekly;

pub use roster::{import_roster, RosterRow};
pub use weekly::{
    coerce_cell, compute_weekly_progress, import_weekly_csv, import_weekly_snapshot,
    parse_weekly_csv, ParsedCsv, ParsedRow,
};

use serde::Serialize;

/// Summary returned by every import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    /// Rows that created a new record
    pub imported: usize,
    /// Rows that overwrote an existing record
    pub updated: usize,
    /// Rows ignored because the handle was blank or unknown
    pub skipped: usize,
    /// Rows rejected as malformed
    pub errors: Vec<String>,
}

impl ImportResult {
    pub fn processed(&self) -> usize {
        self.imported + self.updated
    }
}
