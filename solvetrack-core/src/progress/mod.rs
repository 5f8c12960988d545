//! Progress reconciliation pipeline.
//!
//! A snapshot flows through four stages for one student:
//!
//! 1. [`daily::record_daily_snapshot`] stores the day's entry and increment
//! 2. [`weekly::update_weekly_trend`] refreshes the week bucket
//! 3. [`streak::StreakCalculator`] recomputes the active-day streak
//! 4. [`BadgeEvaluator`] grants any badges that now apply
//!
//! Only the student named by the snapshot is touched.

pub mod daily;
pub mod streak;
pub mod weekly;

pub use daily::record_daily_snapshot;
pub use streak::{calculate_streak, StreakCalculator};
pub use weekly::{rank_week, update_weekly_trend, week_bounds, WeeklyRanking};

use chrono::NaiveDate;
use serde::Serialize;

use crate::badges::BadgeEvaluator;
use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::types::{Badge, DailyProgressEntry, SolveStats, WeeklyTrendEntry};

/// Everything one snapshot changed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotOutcome {
    pub daily: DailyProgressEntry,
    pub weekly: WeeklyTrendEntry,
    pub streak: u32,
    pub new_badges: Vec<Badge>,
}

/// Runs the full pipeline with configured thresholds.
#[derive(Debug, Clone, Default)]
pub struct ProgressEngine {
    streak: StreakCalculator,
    badges: BadgeEvaluator,
}

impl ProgressEngine {
    pub fn new(streak: StreakCalculator, badges: BadgeEvaluator) -> Self {
        Self { streak, badges }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            streak: StreakCalculator::from(&config.progress),
            badges: BadgeEvaluator::new(&config.badges),
        }
    }

    pub fn badge_evaluator(&self) -> &BadgeEvaluator {
        &self.badges
    }

    /// Record `snapshot` for `as_of` and run every downstream stage.
    pub fn apply_snapshot(
        &self,
        db: &Database,
        student_id: &str,
        snapshot: &SolveStats,
        as_of: NaiveDate,
    ) -> Result<SnapshotOutcome> {
        let daily = record_daily_snapshot(db, student_id, snapshot, as_of)?;

        // The bucket tracks the latest total within its week, which differs
        // from this snapshot when an earlier day is being backfilled.
        let (week_start, week_end) = week_bounds(as_of);
        let week_total = db
            .list_daily_entries_between(student_id, week_start, week_end)?
            .last()
            .map(|e| e.total_solved)
            .unwrap_or(daily.total_solved);
        let weekly = update_weekly_trend(db, student_id, week_total, as_of)?;

        let streak = self.streak.calculate(db, student_id, as_of)?;

        let new_badges = self.badges.evaluate_badges(
            db,
            student_id,
            snapshot,
            daily.daily_increment,
            streak,
            as_of,
        )?;

        tracing::debug!(
            student_id,
            date = %as_of,
            daily_increment = daily.daily_increment,
            weekly_increment = weekly.weekly_increment,
            streak,
            new_badges = new_badges.len(),
            "Applied snapshot"
        );

        Ok(SnapshotOutcome {
            daily,
            weekly,
            streak,
            new_badges,
        })
    }
}
