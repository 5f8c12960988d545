//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: students and the daily/weekly time series
    r#"
    CREATE TABLE IF NOT EXISTS students (
        id               TEXT PRIMARY KEY,
        name             TEXT NOT NULL,
        handle           TEXT NOT NULL UNIQUE COLLATE NOCASE,
        profile_url      TEXT,
        batch            TEXT,
        created_at       DATETIME NOT NULL
    );

    CREATE TABLE IF NOT EXISTS daily_progress (
        student_id       TEXT NOT NULL REFERENCES students(id) ON DELETE CASCADE,
        date             DATE NOT NULL,
        total_solved     INTEGER NOT NULL,
        easy_solved      INTEGER NOT NULL,
        medium_solved    INTEGER NOT NULL,
        hard_solved      INTEGER NOT NULL,
        acceptance_rate  REAL,
        daily_increment  INTEGER NOT NULL,
        updated_at       DATETIME NOT NULL,

        PRIMARY KEY (student_id, date)
    );

    CREATE TABLE IF NOT EXISTS weekly_trends (
        student_id       TEXT NOT NULL REFERENCES students(id) ON DELETE CASCADE,
        week_start       DATE NOT NULL,
        week_end         DATE NOT NULL,
        total_problems   INTEGER NOT NULL,
        weekly_increment INTEGER NOT NULL,
        updated_at       DATETIME NOT NULL,

        PRIMARY KEY (student_id, week_start)
    );

    CREATE TABLE IF NOT EXISTS badges (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        student_id       TEXT NOT NULL REFERENCES students(id) ON DELETE CASCADE,
        badge_type       TEXT NOT NULL,
        granted_on       DATE NOT NULL,
        granted_at       DATETIME NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_students_batch ON students(batch);
    CREATE INDEX IF NOT EXISTS idx_daily_progress_date ON daily_progress(date);
    CREATE INDEX IF NOT EXISTS idx_weekly_trends_week ON weekly_trends(week_start);
    CREATE INDEX IF NOT EXISTS idx_badges_student_type ON badges(student_id, badge_type);
    "#,
    // Version 2: denormalized four-week grid fed by the weekly CSV import
    r#"
    CREATE TABLE IF NOT EXISTS weekly_progress_data (
        student_id                      TEXT PRIMARY KEY REFERENCES students(id) ON DELETE CASCADE,
        week1                           INTEGER NOT NULL,
        week2                           INTEGER NOT NULL,
        week3                           INTEGER NOT NULL,
        week4                           INTEGER NOT NULL,
        current_week                    INTEGER NOT NULL,
        week1_to_week2                  INTEGER NOT NULL,
        week2_to_week3                  INTEGER NOT NULL,
        week3_to_week4                  INTEGER NOT NULL,
        last_week_to_current_increment  INTEGER NOT NULL,
        total_score                     INTEGER NOT NULL,
        average_weekly_growth           INTEGER NOT NULL
    );
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version = get_schema_version(&conn).unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_tables_created() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let tables = [
            "students",
            "daily_progress",
            "weekly_trends",
            "badges",
            "weekly_progress_data",
        ];

        for table in tables {
            let exists: i32 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?",
                    [table],
                    |r| r.get(0),
                )
                .unwrap();
            assert_eq!(exists, 1, "Table {} should exist", table);
        }
    }

    #[test]
    fn test_child_tables_cascade_from_students() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        for table in ["daily_progress", "weekly_trends", "badges", "weekly_progress_data"] {
            let fk_list: Vec<(String, String)> = conn
                .prepare(&format!("PRAGMA foreign_key_list({})", table))
                .unwrap()
                .query_map([], |row| Ok((row.get::<_, String>(2)?, row.get::<_, String>(6)?)))
                .unwrap()
                .filter_map(|r| r.ok())
                .collect();

            assert!(
                fk_list
                    .iter()
                    .any(|(parent, on_delete)| parent == "students" && on_delete == "CASCADE"),
                "{} should cascade from students",
                table
            );
        }
    }
}
