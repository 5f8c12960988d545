//! Sync coordination.
//!
//! The [`SyncCoordinator`] pulls snapshots from a [`StatsSource`] and runs
//! them through the [`ProgressEngine`]. A bulk sync fans out one task per
//! student, bounded by the configured concurrency. Per-student failures are
//! tallied in [`SyncResult`] and never abort the batch.

mod scheduler;

pub use scheduler::{SchedulerHandle, SyncScheduler};

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::Config;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::progress::{week_bounds, ProgressEngine, SnapshotOutcome};
use crate::source::StatsSource;
use crate::types::Student;

/// Result of a bulk sync.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    /// Students a fetch was attempted for
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Badges granted during this sync, weekly topper included
    pub badges_granted: usize,
    /// Failures (handle → error message)
    pub errors: Vec<(String, String)>,
}

/// Drives fetch + reconcile for one or all students.
#[derive(Clone)]
pub struct SyncCoordinator {
    db: Arc<Database>,
    source: Arc<dyn StatsSource>,
    engine: Arc<ProgressEngine>,
    concurrency: usize,
}

impl SyncCoordinator {
    pub fn new(db: Arc<Database>, source: Arc<dyn StatsSource>, config: &Config) -> Self {
        Self {
            db,
            source,
            engine: Arc::new(ProgressEngine::from_config(config)),
            concurrency: config.sync.concurrency.max(1),
        }
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Fetch and apply one student's snapshot for `as_of`.
    pub async fn sync_student(&self, student: &Student, as_of: NaiveDate) -> Result<SnapshotOutcome> {
        let stats = self.source.fetch(&student.handle).await?;
        self.engine.apply_snapshot(&self.db, &student.id, &stats, as_of)
    }

    /// Look up a student by handle and sync it.
    pub async fn sync_handle(&self, handle: &str, as_of: NaiveDate) -> Result<SnapshotOutcome> {
        let student = self
            .db
            .get_student_by_handle(handle)?
            .ok_or_else(|| Error::NotFound(format!("student {}", handle)))?;
        self.sync_student(&student, as_of).await
    }

    /// Sync every student.
    pub async fn sync_all(&self, as_of: NaiveDate) -> Result<SyncResult> {
        self.sync_all_with_progress(as_of, |_, _, _| {}).await
    }

    /// Sync every student with a progress callback.
    ///
    /// The callback receives `(completed, total, handle)` as each student
    /// finishes, in completion order. Only failing to list the roster is an
    /// error; everything else is tallied.
    pub async fn sync_all_with_progress<F>(
        &self,
        as_of: NaiveDate,
        mut on_progress: F,
    ) -> Result<SyncResult>
    where
        F: FnMut(usize, usize, &str),
    {
        let students = self.db.list_students()?;
        let total = students.len();
        let mut result = SyncResult {
            attempted: total,
            ..SyncResult::default()
        };

        tracing::info!(
            source = self.source.name(),
            students = total,
            concurrency = self.concurrency,
            date = %as_of,
            "Starting sync"
        );

        let sem = Arc::new(Semaphore::new(self.concurrency));
        let mut join_set = JoinSet::new();

        for student in students {
            let sem = sem.clone();
            let this = self.clone();
            join_set.spawn(async move {
                let _permit = sem.acquire_owned().await;
                let outcome = this.sync_student(&student, as_of).await;
                (student.handle, outcome)
            });
        }

        let mut completed = 0;
        while let Some(joined) = join_set.join_next().await {
            completed += 1;
            match joined {
                Ok((handle, Ok(outcome))) => {
                    result.succeeded += 1;
                    result.badges_granted += outcome.new_badges.len();
                    on_progress(completed, total, &handle);
                }
                Ok((handle, Err(e))) => {
                    if e.is_recoverable() {
                        tracing::warn!(handle = %handle, error = %e, "Student sync failed");
                    } else {
                        tracing::error!(handle = %handle, error = %e, "Student sync failed");
                    }
                    result.failed += 1;
                    result.errors.push((handle.clone(), e.to_string()));
                    on_progress(completed, total, &handle);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Sync task aborted");
                    result.failed += 1;
                    result.errors.push(("<unknown>".to_string(), e.to_string()));
                    on_progress(completed, total, "");
                }
            }
        }

        // Settle the previous week's leader once the roster is up to date
        let last_week = week_bounds(as_of).0 - Duration::days(7);
        match self
            .engine
            .badge_evaluator()
            .grant_weekly_topper(&self.db, last_week)
        {
            Ok(Some(_)) => result.badges_granted += 1,
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to grant weekly topper"),
        }

        tracing::info!(
            succeeded = result.succeeded,
            failed = result.failed,
            badges_granted = result.badges_granted,
            "Sync complete"
        );
        Ok(result)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::{BadgeType, NewStudent, SolveStats};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Canned replies per handle; unknown handles are not found.
    #[derive(Default)]
    pub(crate) struct FakeSource {
        replies: Mutex<HashMap<String, Option<SolveStats>>>,
    }

    impl FakeSource {
        /// `None` simulates an unreachable upstream.
        pub(crate) fn with(self, handle: &str, reply: Option<SolveStats>) -> Self {
            self.replies.lock().unwrap().insert(handle.to_string(), reply);
            self
        }

        pub(crate) fn set(&self, handle: &str, total: i64) {
            self.replies
                .lock()
                .unwrap()
                .insert(handle.to_string(), Some(SolveStats::new(total, total, 0, 0)));
        }
    }

    #[async_trait]
    impl StatsSource for FakeSource {
        fn name(&self) -> &str {
            "fake"
        }

        async fn fetch(&self, handle: &str) -> Result<SolveStats> {
            match self.replies.lock().unwrap().get(handle) {
                Some(Some(stats)) => Ok(*stats),
                Some(None) => Err(Error::UpstreamUnavailable {
                    handle: handle.to_string(),
                    message: "connection refused".to_string(),
                }),
                None => Err(Error::NotFound(format!("LeetCode user {}", handle))),
            }
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn coordinator(source: FakeSource, handles: &[&str]) -> SyncCoordinator {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        for handle in handles {
            db.add_student(&NewStudent::new(*handle, *handle)).unwrap();
        }
        SyncCoordinator::new(Arc::new(db), Arc::new(source), &Config::default())
    }

    #[tokio::test]
    async fn test_partial_failures_do_not_abort_batch() {
        let source = FakeSource::default()
            .with("ok", Some(SolveStats::new(30, 20, 10, 0)))
            .with("down", None);
        let coordinator = coordinator(source, &["ok", "down", "ghost"]);

        let mut seen = Vec::new();
        let result = coordinator
            .sync_all_with_progress(day(4), |done, total, _| seen.push((done, total)))
            .await
            .unwrap();

        assert_eq!(result.attempted, 3);
        assert_eq!(result.succeeded, 1);
        assert_eq!(result.failed, 2);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(seen.len(), 3);
        assert_eq!(seen.last(), Some(&(3, 3)));

        let db = coordinator.database();
        let ok = db.get_student_by_handle("ok").unwrap().unwrap();
        assert_eq!(db.get_daily_entry(&ok.id, day(4)).unwrap().unwrap().total_solved, 30);
    }

    #[tokio::test]
    async fn test_sync_handle_unknown_student() {
        let coordinator = coordinator(FakeSource::default(), &[]);
        let err = coordinator.sync_handle("nobody", day(4)).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_resync_same_day_is_idempotent() {
        let source = Arc::new(FakeSource::default());
        source.set("a", 40);
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db.add_student(&NewStudent::new("A", "a")).unwrap();
        let coordinator = SyncCoordinator::new(Arc::new(db), source.clone(), &Config::default());

        coordinator.sync_all(day(3)).await.unwrap();
        source.set("a", 47);
        coordinator.sync_all(day(4)).await.unwrap();
        coordinator.sync_all(day(4)).await.unwrap();

        let db = coordinator.database();
        let a = db.get_student_by_handle("a").unwrap().unwrap();
        let entries = db.list_daily_entries_between(&a.id, day(4), day(4)).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].daily_increment, 7);
    }

    #[tokio::test]
    async fn test_weekly_topper_settled_for_previous_week() {
        let source = Arc::new(FakeSource::default());
        source.set("a", 10);
        source.set("b", 25);
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db.add_student(&NewStudent::new("A", "a")).unwrap();
        db.add_student(&NewStudent::new("B", "b")).unwrap();
        let coordinator = SyncCoordinator::new(Arc::new(db), source.clone(), &Config::default());

        // Week of Mar 2, then the following Monday
        coordinator.sync_all(day(4)).await.unwrap();
        let result = coordinator.sync_all(day(9)).await.unwrap();
        assert!(result.badges_granted >= 1);

        let db = coordinator.database();
        let b = db.get_student_by_handle("b").unwrap().unwrap();
        assert!(db.has_badge_on(&b.id, BadgeType::WeeklyTopper, day(8)).unwrap());

        // Running again in the same week does not grant twice
        source.set("b", 40);
        coordinator.sync_all(day(10)).await.unwrap();
        assert_eq!(db.count_badges(&b.id, BadgeType::WeeklyTopper).unwrap(), 1);

        // Leading the week of Mar 9 as well still leaves a single badge
        coordinator.sync_all(day(16)).await.unwrap();
        assert_eq!(db.count_badges(&b.id, BadgeType::WeeklyTopper).unwrap(), 1);
    }
}
