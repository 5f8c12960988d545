//! Badge evaluation.
//!
//! Snapshot-driven badges come from the declarative table in [`rules`].
//! One-time badges are skipped silently once granted; repeatable ones are
//! recorded on every evaluation where their rule holds, optionally capped at
//! one per student per day (`badges.cap_repeatable_per_day`).
//!
//! `weekly_topper` is not a snapshot rule: it is granted once per student
//! from the ranking of a completed week by
//! [`BadgeEvaluator::grant_weekly_topper`].

pub mod rules;

pub use rules::{BadgeContext, BadgeRule, SNAPSHOT_RULES};

use chrono::{Duration, NaiveDate};

use crate::config::BadgeConfig;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::progress::weekly::rank_week;
use crate::types::{Badge, BadgeType, SolveStats};

/// Applies badge rules for one student at a time.
#[derive(Debug, Clone)]
pub struct BadgeEvaluator {
    rules: Vec<BadgeRule>,
    cap_repeatable_per_day: bool,
}

impl Default for BadgeEvaluator {
    fn default() -> Self {
        Self {
            rules: SNAPSHOT_RULES.to_vec(),
            cap_repeatable_per_day: false,
        }
    }
}

impl BadgeEvaluator {
    pub fn new(config: &BadgeConfig) -> Self {
        Self {
            cap_repeatable_per_day: config.cap_repeatable_per_day,
            ..Self::default()
        }
    }

    /// Use a custom rule table.
    pub fn with_rules(rules: Vec<BadgeRule>, cap_repeatable_per_day: bool) -> Self {
        Self {
            rules,
            cap_repeatable_per_day,
        }
    }

    /// Evaluate every rule and return the badges granted by this call.
    pub fn evaluate_badges(
        &self,
        db: &Database,
        student_id: &str,
        stats: &SolveStats,
        daily_increment: i64,
        streak: u32,
        on: NaiveDate,
    ) -> Result<Vec<Badge>> {
        let ctx = BadgeContext {
            stats,
            daily_increment,
            streak,
        };

        let mut granted = Vec::new();
        for rule in &self.rules {
            if !rule.applies(&ctx) {
                continue;
            }
            if self.already_granted(db, student_id, rule, on)? {
                continue;
            }

            let badge = db.insert_badge(student_id, rule.badge_type, on)?;
            tracing::info!(
                student_id,
                badge = %rule.badge_type,
                date = %on,
                "Granted badge"
            );
            granted.push(badge);
        }

        Ok(granted)
    }

    fn already_granted(
        &self,
        db: &Database,
        student_id: &str,
        rule: &BadgeRule,
        on: NaiveDate,
    ) -> Result<bool> {
        if rule.repeatable {
            return Ok(self.cap_repeatable_per_day
                && db.has_badge_on(student_id, rule.badge_type, on)?);
        }

        let count = db.count_badges(student_id, rule.badge_type)?;
        if count > 1 {
            let err = Error::Inconsistent(format!(
                "{} one-time grants of {} for student {}",
                count, rule.badge_type, student_id
            ));
            tracing::warn!(error = %err, "Duplicate one-time badge");
        }
        Ok(count > 0)
    }

    /// Grant `weekly_topper` to the leader of the week starting at `week_start`.
    ///
    /// The grant is dated on the week's last day and happens at most once per
    /// week. It is a one-time badge, so a leader who already holds it gets
    /// nothing. Nothing is granted when nobody made progress that week.
    pub fn grant_weekly_topper(
        &self,
        db: &Database,
        week_start: NaiveDate,
    ) -> Result<Option<Badge>> {
        let week_end = week_start + Duration::days(6);
        let ranking = rank_week(db, week_start)?;
        let Some(leader) = ranking.first() else {
            return Ok(None);
        };
        if leader.weekly_progress <= 0 {
            return Ok(None);
        }
        for entry in &ranking {
            if db.has_badge_on(&entry.student.id, BadgeType::WeeklyTopper, week_end)? {
                return Ok(None);
            }
        }
        if db.count_badges(&leader.student.id, BadgeType::WeeklyTopper)? > 0 {
            tracing::debug!(
                student_id = %leader.student.id,
                week_start = %week_start,
                "Weekly topper already held"
            );
            return Ok(None);
        }

        let badge = db.insert_badge(&leader.student.id, BadgeType::WeeklyTopper, week_end)?;
        tracing::info!(
            student_id = %leader.student.id,
            week_start = %week_start,
            weekly_progress = leader.weekly_progress,
            "Granted weekly topper"
        );
        Ok(Some(badge))
    }
}
