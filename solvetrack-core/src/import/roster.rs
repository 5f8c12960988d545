//! Roster CSV import.

use std::io::Read;

use serde::Deserialize;

use super::ImportResult;
use crate::db::Database;
use crate::error::Result;
use crate::types::{normalize_handle, NewStudent};

/// One roster line: `Name, Handle, ProfileLink, Batch`.
#[derive(Debug, Clone, Deserialize)]
pub struct RosterRow {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Handle")]
    pub handle: String,
    #[serde(rename = "ProfileLink", default)]
    pub profile_link: Option<String>,
    #[serde(rename = "Batch", default)]
    pub batch: Option<String>,
}

/// Onboard or refresh students from a roster CSV.
///
/// Existing handles keep their id and history; only profile metadata is
/// refreshed.
pub fn import_roster<R: Read>(db: &Database, reader: R) -> Result<ImportResult> {
    let mut csv = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut result = ImportResult::default();

    for (index, record) in csv.deserialize::<RosterRow>().enumerate() {
        let row = match record {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!(line = index + 2, error = %e, "Malformed roster row");
                result.errors.push(format!("line {}: {}", index + 2, e));
                continue;
            }
        };

        // A profile link can stand in for a missing handle
        let raw_handle = if row.handle.is_empty() {
            row.profile_link.clone().unwrap_or_default()
        } else {
            row.handle.clone()
        };
        if normalize_handle(&raw_handle).is_empty() {
            result.skipped += 1;
            continue;
        }

        let mut new = NewStudent::new(row.name, raw_handle);
        if let Some(link) = row.profile_link.filter(|l| !l.is_empty()) {
            new = new.with_profile_url(link);
        }
        if let Some(batch) = row.batch.filter(|b| !b.is_empty()) {
            new = new.with_batch(batch);
        }

        let (student, created) = db.upsert_student(&new)?;
        if created {
            tracing::debug!(handle = %student.handle, "Onboarded student");
            result.imported += 1;
        } else {
            result.updated += 1;
        }
    }

    tracing::info!(
        imported = result.imported,
        updated = result.updated,
        skipped = result.skipped,
        errors = result.errors.len(),
        "Roster import complete"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_import_creates_then_updates() {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();

        let csv = "Name,Handle,ProfileLink,Batch\n\
                   Alice,alice,,2026\n\
                   Bob,,https://leetcode.com/u/bob/,2027\n\
                   Nameless,,,\n";
        let first = import_roster(&db, csv.as_bytes()).unwrap();
        assert_eq!(first.imported, 2);
        assert_eq!(first.skipped, 1);

        let bob = db.get_student_by_handle("bob").unwrap().unwrap();
        assert_eq!(bob.batch.as_deref(), Some("2027"));
        assert_eq!(bob.profile_url.as_deref(), Some("https://leetcode.com/u/bob/"));

        let again = "Name,Handle,ProfileLink,Batch\nAlice Smith,ALICE,,2028\n";
        let second = import_roster(&db, again.as_bytes()).unwrap();
        assert_eq!(second.updated, 1);
        assert_eq!(db.count_students().unwrap(), 2);

        let alice = db.get_student_by_handle("alice").unwrap().unwrap();
        assert_eq!(alice.name, "Alice Smith");
        assert_eq!(alice.batch.as_deref(), Some("2028"));
    }

    #[test]
    fn test_roster_without_optional_columns() {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();

        let result = import_roster(&db, "Name,Handle\nCara,cara\n".as_bytes()).unwrap();
        assert_eq!(result.imported, 1);
        assert!(result.errors.is_empty());
    }
}
