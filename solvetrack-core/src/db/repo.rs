//! Database repository layer
//!
//! Provides query and upsert operations for students, their daily and weekly
//! time series, badges and the imported weekly grid.

use crate::error::{Error, Result};
use crate::types::*;
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Child rows removed alongside a student.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletedStudent {
    pub daily_entries: usize,
    pub weekly_entries: usize,
    pub badges: usize,
    pub weekly_grid_rows: usize,
}

/// Database handle with connection pooling (single connection for now)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn();
        super::schema::run_migrations(&conn)
    }

    /// Schema version recorded in `PRAGMA user_version`
    pub fn schema_version(&self) -> Result<i32> {
        super::schema::get_schema_version(&self.conn())
    }

    /// Get the underlying connection (for advanced use)
    ///
    /// A panic while the lock was held leaves SQLite itself consistent, so a
    /// poisoned lock is recovered rather than propagated.
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ============================================
    // Student operations
    // ============================================

    /// Onboard a new student. Fails if the handle is already taken.
    pub fn add_student(&self, new: &NewStudent) -> Result<Student> {
        let handle = normalize_handle(&new.handle);
        if handle.is_empty() {
            return Err(Error::MalformedInput("student handle is blank".to_string()));
        }
        if self.get_student_by_handle(&handle)?.is_some() {
            return Err(Error::Inconsistent(format!(
                "handle already registered: {}",
                handle
            )));
        }

        let student = Student {
            id: Uuid::new_v4().to_string(),
            name: new.name.trim().to_string(),
            handle,
            profile_url: new.profile_url.clone(),
            batch: new.batch.clone(),
            created_at: Utc::now(),
        };

        let conn = self.conn();
        conn.execute(
            r#"
            INSERT INTO students (id, name, handle, profile_url, batch, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                student.id,
                student.name,
                student.handle,
                student.profile_url,
                student.batch,
                student.created_at,
            ],
        )?;
        Ok(student)
    }

    /// Insert a student, or refresh profile metadata if the handle exists.
    ///
    /// Returns the stored student and whether it was newly created.
    pub fn upsert_student(&self, new: &NewStudent) -> Result<(Student, bool)> {
        let handle = normalize_handle(&new.handle);
        match self.get_student_by_handle(&handle)? {
            Some(existing) => {
                let updated = Student {
                    name: if new.name.trim().is_empty() {
                        existing.name.clone()
                    } else {
                        new.name.trim().to_string()
                    },
                    profile_url: new.profile_url.clone().or(existing.profile_url.clone()),
                    batch: new.batch.clone().or(existing.batch.clone()),
                    ..existing
                };
                self.update_student_profile(&updated)?;
                Ok((updated, false))
            }
            None => Ok((self.add_student(new)?, true)),
        }
    }

    /// Update the mutable profile metadata (name, profile link, batch).
    pub fn update_student_profile(&self, student: &Student) -> Result<()> {
        let conn = self.conn();
        let changed = conn.execute(
            "UPDATE students SET name = ?2, profile_url = ?3, batch = ?4 WHERE id = ?1",
            params![student.id, student.name, student.profile_url, student.batch],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("student {}", student.id)));
        }
        Ok(())
    }

    /// Get a student by ID
    pub fn get_student(&self, id: &str) -> Result<Option<Student>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT * FROM students WHERE id = ?",
            [id],
            Self::row_to_student,
        )
        .optional()
        .map_err(Error::from)
    }

    /// Get a student by ID, failing with `NotFound` if unknown
    pub fn require_student(&self, id: &str) -> Result<Student> {
        self.get_student(id)?
            .ok_or_else(|| Error::NotFound(format!("student {}", id)))
    }

    /// Get a student by handle (case-insensitive, URLs accepted)
    pub fn get_student_by_handle(&self, handle: &str) -> Result<Option<Student>> {
        let handle = normalize_handle(handle);
        let conn = self.conn();
        conn.query_row(
            "SELECT * FROM students WHERE handle = ?",
            [handle],
            Self::row_to_student,
        )
        .optional()
        .map_err(Error::from)
    }

    /// List all students in roster order (onboarding time, then insert order)
    pub fn list_students(&self) -> Result<Vec<Student>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT * FROM students ORDER BY created_at, rowid")?;
        let students = stmt
            .query_map([], Self::row_to_student)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(students)
    }

    /// List the students of one batch in roster order
    pub fn list_students_in_batch(&self, batch: &str) -> Result<Vec<Student>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT * FROM students WHERE batch = ? ORDER BY created_at, rowid")?;
        let students = stmt
            .query_map([batch], Self::row_to_student)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(students)
    }

    /// Count all students
    pub fn count_students(&self) -> Result<i64> {
        let conn = self.conn();
        let count = conn.query_row("SELECT COUNT(*) FROM students", [], |r| r.get(0))?;
        Ok(count)
    }

    /// Remove a student and every record that references them.
    ///
    /// This is the admin cleanup path; nothing else deletes students.
    pub fn delete_student(&self, id: &str) -> Result<DeletedStudent> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let count = |table: &str| -> rusqlite::Result<usize> {
            tx.query_row(
                &format!("SELECT COUNT(*) FROM {} WHERE student_id = ?", table),
                [id],
                |r| r.get::<_, i64>(0),
            )
            .map(|n| n as usize)
        };

        let deleted = DeletedStudent {
            daily_entries: count("daily_progress")?,
            weekly_entries: count("weekly_trends")?,
            badges: count("badges")?,
            weekly_grid_rows: count("weekly_progress_data")?,
        };

        let removed = tx.execute("DELETE FROM students WHERE id = ?", [id])?;
        if removed == 0 {
            return Err(Error::NotFound(format!("student {}", id)));
        }
        tx.commit()?;

        tracing::info!(
            student_id = id,
            daily_entries = deleted.daily_entries,
            weekly_entries = deleted.weekly_entries,
            badges = deleted.badges,
            "Deleted student and child records"
        );

        Ok(deleted)
    }

    fn row_to_student(row: &Row) -> rusqlite::Result<Student> {
        Ok(Student {
            id: row.get("id")?,
            name: row.get("name")?,
            handle: row.get("handle")?,
            profile_url: row.get("profile_url")?,
            batch: row.get("batch")?,
            created_at: row.get("created_at")?,
        })
    }

    // ============================================
    // Daily progress operations
    // ============================================

    /// Get the entry for an exact date
    pub fn get_daily_entry(
        &self,
        student_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyProgressEntry>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT * FROM daily_progress WHERE student_id = ? AND date = ?",
            params![student_id, date],
            Self::row_to_daily_entry,
        )
        .optional()
        .map_err(Error::from)
    }

    /// Get the most recent entry strictly before `date`
    pub fn get_daily_entry_before(
        &self,
        student_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyProgressEntry>> {
        let conn = self.conn();
        conn.query_row(
            r#"
            SELECT * FROM daily_progress
            WHERE student_id = ? AND date < ?
            ORDER BY date DESC
            LIMIT 1
            "#,
            params![student_id, date],
            Self::row_to_daily_entry,
        )
        .optional()
        .map_err(Error::from)
    }

    /// Get the earliest entry strictly after `date`
    pub fn get_daily_entry_after(
        &self,
        student_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyProgressEntry>> {
        let conn = self.conn();
        conn.query_row(
            r#"
            SELECT * FROM daily_progress
            WHERE student_id = ? AND date > ?
            ORDER BY date ASC
            LIMIT 1
            "#,
            params![student_id, date],
            Self::row_to_daily_entry,
        )
        .optional()
        .map_err(Error::from)
    }

    /// Get the most recent entry overall
    pub fn get_latest_daily_entry(&self, student_id: &str) -> Result<Option<DailyProgressEntry>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT * FROM daily_progress WHERE student_id = ? ORDER BY date DESC LIMIT 1",
            [student_id],
            Self::row_to_daily_entry,
        )
        .optional()
        .map_err(Error::from)
    }

    /// Insert or overwrite the entry keyed by (student, date)
    pub fn upsert_daily_entry(&self, entry: &DailyProgressEntry) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            r#"
            INSERT INTO daily_progress (
                student_id, date, total_solved, easy_solved, medium_solved, hard_solved,
                acceptance_rate, daily_increment, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(student_id, date) DO UPDATE SET
                total_solved = excluded.total_solved,
                easy_solved = excluded.easy_solved,
                medium_solved = excluded.medium_solved,
                hard_solved = excluded.hard_solved,
                acceptance_rate = excluded.acceptance_rate,
                daily_increment = excluded.daily_increment,
                updated_at = excluded.updated_at
            "#,
            params![
                entry.student_id,
                entry.date,
                entry.total_solved,
                entry.easy_solved,
                entry.medium_solved,
                entry.hard_solved,
                entry.acceptance_rate,
                entry.daily_increment,
                entry.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Entries on or after `since`, most recent first
    pub fn list_daily_entries_since(
        &self,
        student_id: &str,
        since: NaiveDate,
    ) -> Result<Vec<DailyProgressEntry>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM daily_progress
            WHERE student_id = ? AND date >= ?
            ORDER BY date DESC
            "#,
        )?;
        let entries = stmt
            .query_map(params![student_id, since], Self::row_to_daily_entry)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    /// Entries within `[start, end]`, oldest first
    pub fn list_daily_entries_between(
        &self,
        student_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyProgressEntry>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM daily_progress
            WHERE student_id = ? AND date >= ? AND date <= ?
            ORDER BY date ASC
            "#,
        )?;
        let entries = stmt
            .query_map(params![student_id, start, end], Self::row_to_daily_entry)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    fn row_to_daily_entry(row: &Row) -> rusqlite::Result<DailyProgressEntry> {
        Ok(DailyProgressEntry {
            student_id: row.get("student_id")?,
            date: row.get("date")?,
            total_solved: row.get("total_solved")?,
            easy_solved: row.get("easy_solved")?,
            medium_solved: row.get("medium_solved")?,
            hard_solved: row.get("hard_solved")?,
            acceptance_rate: row.get("acceptance_rate")?,
            daily_increment: row.get("daily_increment")?,
            updated_at: row.get("updated_at")?,
        })
    }

    // ============================================
    // Weekly trend operations
    // ============================================

    /// Get the bucket starting at `week_start`
    pub fn get_weekly_entry(
        &self,
        student_id: &str,
        week_start: NaiveDate,
    ) -> Result<Option<WeeklyTrendEntry>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT * FROM weekly_trends WHERE student_id = ? AND week_start = ?",
            params![student_id, week_start],
            Self::row_to_weekly_entry,
        )
        .optional()
        .map_err(Error::from)
    }

    /// Get the most recent bucket that starts before `week_start`
    pub fn get_weekly_entry_before(
        &self,
        student_id: &str,
        week_start: NaiveDate,
    ) -> Result<Option<WeeklyTrendEntry>> {
        let conn = self.conn();
        conn.query_row(
            r#"
            SELECT * FROM weekly_trends
            WHERE student_id = ? AND week_start < ?
            ORDER BY week_start DESC
            LIMIT 1
            "#,
            params![student_id, week_start],
            Self::row_to_weekly_entry,
        )
        .optional()
        .map_err(Error::from)
    }

    /// Get the earliest bucket that starts after `week_start`
    pub fn get_weekly_entry_after(
        &self,
        student_id: &str,
        week_start: NaiveDate,
    ) -> Result<Option<WeeklyTrendEntry>> {
        let conn = self.conn();
        conn.query_row(
            r#"
            SELECT * FROM weekly_trends
            WHERE student_id = ? AND week_start > ?
            ORDER BY week_start ASC
            LIMIT 1
            "#,
            params![student_id, week_start],
            Self::row_to_weekly_entry,
        )
        .optional()
        .map_err(Error::from)
    }

    /// Insert or overwrite the bucket keyed by (student, week_start)
    pub fn upsert_weekly_entry(&self, entry: &WeeklyTrendEntry) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            r#"
            INSERT INTO weekly_trends (
                student_id, week_start, week_end, total_problems, weekly_increment, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(student_id, week_start) DO UPDATE SET
                week_end = excluded.week_end,
                total_problems = excluded.total_problems,
                weekly_increment = excluded.weekly_increment,
                updated_at = excluded.updated_at
            "#,
            params![
                entry.student_id,
                entry.week_start,
                entry.week_end,
                entry.total_problems,
                entry.weekly_increment,
                entry.updated_at,
            ],
        )?;
        Ok(())
    }

    /// The most recent `limit` buckets for a student, newest first
    pub fn list_weekly_entries(
        &self,
        student_id: &str,
        limit: usize,
    ) -> Result<Vec<WeeklyTrendEntry>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM weekly_trends
            WHERE student_id = ?
            ORDER BY week_start DESC
            LIMIT ?
            "#,
        )?;
        let entries = stmt
            .query_map(params![student_id, limit as i64], Self::row_to_weekly_entry)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    /// Every student's bucket for one week
    pub fn list_weekly_entries_for_week(
        &self,
        week_start: NaiveDate,
    ) -> Result<Vec<WeeklyTrendEntry>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT * FROM weekly_trends WHERE week_start = ?")?;
        let entries = stmt
            .query_map([week_start], Self::row_to_weekly_entry)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    fn row_to_weekly_entry(row: &Row) -> rusqlite::Result<WeeklyTrendEntry> {
        Ok(WeeklyTrendEntry {
            student_id: row.get("student_id")?,
            week_start: row.get("week_start")?,
            week_end: row.get("week_end")?,
            total_problems: row.get("total_problems")?,
            weekly_increment: row.get("weekly_increment")?,
            updated_at: row.get("updated_at")?,
        })
    }

    // ============================================
    // Badge operations
    // ============================================

    /// Number of grants of one badge type for a student
    pub fn count_badges(&self, student_id: &str, badge_type: BadgeType) -> Result<i64> {
        let conn = self.conn();
        let count = conn.query_row(
            "SELECT COUNT(*) FROM badges WHERE student_id = ? AND badge_type = ?",
            params![student_id, badge_type.as_str()],
            |r| r.get(0),
        )?;
        Ok(count)
    }

    /// Whether a badge type was already granted on a specific day
    pub fn has_badge_on(
        &self,
        student_id: &str,
        badge_type: BadgeType,
        date: NaiveDate,
    ) -> Result<bool> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM badges WHERE student_id = ? AND badge_type = ? AND granted_on = ?",
            params![student_id, badge_type.as_str(), date],
            |r| r.get(0),
        )?;
        Ok(count > 0)
    }

    /// Record a grant
    pub fn insert_badge(
        &self,
        student_id: &str,
        badge_type: BadgeType,
        granted_on: NaiveDate,
    ) -> Result<Badge> {
        let granted_at = Utc::now();
        let conn = self.conn();
        conn.execute(
            r#"
            INSERT INTO badges (student_id, badge_type, granted_on, granted_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![student_id, badge_type.as_str(), granted_on, granted_at],
        )?;
        Ok(Badge {
            id: conn.last_insert_rowid(),
            student_id: student_id.to_string(),
            badge_type,
            granted_on,
            granted_at,
        })
    }

    /// All grants for a student, oldest first
    pub fn list_badges(&self, student_id: &str) -> Result<Vec<Badge>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT * FROM badges WHERE student_id = ? ORDER BY id")?;
        let badges = stmt
            .query_map([student_id], Self::row_to_badge)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(badges)
    }

    fn row_to_badge(row: &Row) -> rusqlite::Result<Badge> {
        let badge_type_str: String = row.get("badge_type")?;
        let badge_type = badge_type_str.parse::<BadgeType>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, e.into())
        })?;

        Ok(Badge {
            id: row.get("id")?,
            student_id: row.get("student_id")?,
            badge_type,
            granted_on: row.get("granted_on")?,
            granted_at: row.get("granted_at")?,
        })
    }

    // ============================================
    // Weekly grid operations
    // ============================================

    /// Get the imported grid row for a student
    pub fn get_weekly_progress_data(&self, student_id: &str) -> Result<Option<WeeklyProgressData>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT * FROM weekly_progress_data WHERE student_id = ?",
            [student_id],
            Self::row_to_weekly_progress_data,
        )
        .optional()
        .map_err(Error::from)
    }

    /// Overwrite the grid row for a student. Returns true if it was newly inserted.
    pub fn upsert_weekly_progress_data(&self, data: &WeeklyProgressData) -> Result<bool> {
        let conn = self.conn();
        let existed: i64 = conn.query_row(
            "SELECT COUNT(*) FROM weekly_progress_data WHERE student_id = ?",
            [&data.student_id],
            |r| r.get(0),
        )?;

        conn.execute(
            r#"
            INSERT INTO weekly_progress_data (
                student_id, week1, week2, week3, week4, current_week,
                week1_to_week2, week2_to_week3, week3_to_week4,
                last_week_to_current_increment, total_score, average_weekly_growth
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ON CONFLICT(student_id) DO UPDATE SET
                week1 = excluded.week1,
                week2 = excluded.week2,
                week3 = excluded.week3,
                week4 = excluded.week4,
                current_week = excluded.current_week,
                week1_to_week2 = excluded.week1_to_week2,
                week2_to_week3 = excluded.week2_to_week3,
                week3_to_week4 = excluded.week3_to_week4,
                last_week_to_current_increment = excluded.last_week_to_current_increment,
                total_score = excluded.total_score,
                average_weekly_growth = excluded.average_weekly_growth
            "#,
            params![
                data.student_id,
                data.week1,
                data.week2,
                data.week3,
                data.week4,
                data.current_week,
                data.week1_to_week2,
                data.week2_to_week3,
                data.week3_to_week4,
                data.last_week_to_current_increment,
                data.total_score,
                data.average_weekly_growth,
            ],
        )?;

        Ok(existed == 0)
    }

    /// Every imported grid row with its student, in roster order
    pub fn list_weekly_progress_data(&self) -> Result<Vec<(Student, WeeklyProgressData)>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            r#"
            SELECT s.*, w.*
            FROM weekly_progress_data w
            JOIN students s ON s.id = w.student_id
            ORDER BY s.created_at, s.rowid
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    Self::row_to_student(row)?,
                    Self::row_to_weekly_progress_data(row)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn row_to_weekly_progress_data(row: &Row) -> rusqlite::Result<WeeklyProgressData> {
        Ok(WeeklyProgressData {
            student_id: row.get("student_id")?,
            week1: row.get("week1")?,
            week2: row.get("week2")?,
            week3: row.get("week3")?,
            week4: row.get("week4")?,
            current_week: row.get("current_week")?,
            week1_to_week2: row.get("week1_to_week2")?,
            week2_to_week3: row.get("week2_to_week3")?,
            week3_to_week4: row.get("week3_to_week4")?,
            last_week_to_current_increment: row.get("last_week_to_current_increment")?,
            total_score: row.get("total_score")?,
            average_weekly_growth: row.get("average_weekly_growth")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn daily(student_id: &str, date: NaiveDate, total: i64, increment: i64) -> DailyProgressEntry {
        DailyProgressEntry {
            student_id: student_id.to_string(),
            date,
            total_solved: total,
            easy_solved: total,
            medium_solved: 0,
            hard_solved: 0,
            acceptance_rate: None,
            daily_increment: increment,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_add_and_lookup_student() {
        let db = test_db();
        let student = db
            .add_student(&NewStudent::new("Alice", "https://leetcode.com/u/Alice/").with_batch("2026"))
            .unwrap();

        assert_eq!(student.handle, "Alice");
        assert_eq!(db.get_student(&student.id).unwrap().unwrap(), student);
        // Handles are matched case-insensitively
        assert_eq!(db.get_student_by_handle("alice").unwrap().unwrap().id, student.id);
        assert_eq!(db.count_students().unwrap(), 1);
    }

    #[test]
    fn test_schema_version_after_migrate() {
        let db = test_db();
        assert_eq!(db.schema_version().unwrap(), super::super::schema::SCHEMA_VERSION);
    }

    #[test]
    fn test_duplicate_handle_rejected() {
        let db = test_db();
        db.add_student(&NewStudent::new("Alice", "alice")).unwrap();
        let err = db.add_student(&NewStudent::new("Other", "ALICE")).unwrap_err();
        assert!(matches!(err, Error::Inconsistent(_)));
    }

    #[test]
    fn test_blank_handle_rejected() {
        let db = test_db();
        let err = db.add_student(&NewStudent::new("Nobody", "   ")).unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
    }

    #[test]
    fn test_upsert_student_refreshes_metadata() {
        let db = test_db();
        let (created, is_new) = db
            .upsert_student(&NewStudent::new("Alice", "alice"))
            .unwrap();
        assert!(is_new);

        let (updated, is_new) = db
            .upsert_student(&NewStudent::new("Alice Smith", "alice").with_batch("2025"))
            .unwrap();
        assert!(!is_new);
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Alice Smith");
        assert_eq!(updated.batch.as_deref(), Some("2025"));
        assert_eq!(db.list_students_in_batch("2025").unwrap().len(), 1);
    }

    #[test]
    fn test_list_students_in_roster_order() {
        let db = test_db();
        for handle in ["zed", "amy", "max"] {
            db.add_student(&NewStudent::new(handle, handle)).unwrap();
        }
        let handles: Vec<_> = db
            .list_students()
            .unwrap()
            .into_iter()
            .map(|s| s.handle)
            .collect();
        assert_eq!(handles, vec!["zed", "amy", "max"]);
    }

    #[test]
    fn test_daily_entry_upsert_is_keyed_by_date() {
        let db = test_db();
        let student = db.add_student(&NewStudent::new("Alice", "alice")).unwrap();
        let day = date(2026, 3, 2);

        db.upsert_daily_entry(&daily(&student.id, day, 10, 10)).unwrap();
        db.upsert_daily_entry(&daily(&student.id, day, 12, 12)).unwrap();

        let entries = db
            .list_daily_entries_between(&student.id, day, day)
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].total_solved, 12);
    }

    #[test]
    fn test_daily_entry_before_is_strict() {
        let db = test_db();
        let student = db.add_student(&NewStudent::new("Alice", "alice")).unwrap();
        db.upsert_daily_entry(&daily(&student.id, date(2026, 3, 1), 5, 5)).unwrap();
        db.upsert_daily_entry(&daily(&student.id, date(2026, 3, 3), 9, 4)).unwrap();

        let prior = db
            .get_daily_entry_before(&student.id, date(2026, 3, 3))
            .unwrap()
            .unwrap();
        assert_eq!(prior.date, date(2026, 3, 1));
        assert!(db
            .get_daily_entry_before(&student.id, date(2026, 3, 1))
            .unwrap()
            .is_none());
        assert_eq!(
            db.get_latest_daily_entry(&student.id).unwrap().unwrap().date,
            date(2026, 3, 3)
        );
    }

    #[test]
    fn test_badges_round_trip() {
        let db = test_db();
        let student = db.add_student(&NewStudent::new("Alice", "alice")).unwrap();
        let day = date(2026, 3, 2);

        let badge = db
            .insert_badge(&student.id, BadgeType::CenturyCoder, day)
            .unwrap();
        assert!(badge.id > 0);
        assert_eq!(db.count_badges(&student.id, BadgeType::CenturyCoder).unwrap(), 1);
        assert!(db.has_badge_on(&student.id, BadgeType::CenturyCoder, day).unwrap());
        assert!(!db
            .has_badge_on(&student.id, BadgeType::CenturyCoder, date(2026, 3, 3))
            .unwrap());

        let badges = db.list_badges(&student.id).unwrap();
        assert_eq!(badges.len(), 1);
        assert_eq!(badges[0].badge_type, BadgeType::CenturyCoder);
    }

    #[test]
    fn test_weekly_progress_data_upsert_reports_insert() {
        let db = test_db();
        let student = db.add_student(&NewStudent::new("Alice", "alice")).unwrap();
        let data = WeeklyProgressData {
            student_id: student.id.clone(),
            week1: 10,
            week2: 15,
            ..Default::default()
        };

        assert!(db.upsert_weekly_progress_data(&data).unwrap());
        assert!(!db.upsert_weekly_progress_data(&data).unwrap());
        assert_eq!(db.get_weekly_progress_data(&student.id).unwrap().unwrap(), data);

        let rows = db.list_weekly_progress_data().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0.handle, "alice");
    }

    #[test]
    fn test_delete_student_cascades() {
        let db = test_db();
        let student = db.add_student(&NewStudent::new("Alice", "alice")).unwrap();
        let day = date(2026, 3, 2);
        db.upsert_daily_entry(&daily(&student.id, day, 10, 10)).unwrap();
        db.insert_badge(&student.id, BadgeType::ComebackCoder, day).unwrap();
        db.insert_badge(&student.id, BadgeType::ComebackCoder, day).unwrap();

        let deleted = db.delete_student(&student.id).unwrap();
        assert_eq!(deleted.daily_entries, 1);
        assert_eq!(deleted.badges, 2);
        assert!(db.get_student(&student.id).unwrap().is_none());
        assert!(db.list_badges(&student.id).unwrap().is_empty());
        assert!(db.get_latest_daily_entry(&student.id).unwrap().is_none());
    }

    #[test]
    fn test_delete_unknown_student_is_not_found() {
        let db = test_db();
        assert!(matches!(
            db.delete_student("missing"),
            Err(Error::NotFound(_))
        ));
    }
}
