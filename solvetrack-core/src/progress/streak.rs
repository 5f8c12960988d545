//! Consecutive active-day streaks.

use chrono::{Duration, NaiveDate};

use crate::config::{ProgressConfig, StreakAnchor};
use crate::db::Database;
use crate::error::Result;
use crate::types::DailyProgressEntry;

pub const DEFAULT_ACTIVE_DAY_THRESHOLD: i64 = 5;
pub const DEFAULT_LOOKBACK_DAYS: u32 = 100;

/// Walks a student's daily entries backwards from an anchor day.
///
/// Entry `i` of the walk must fall on exactly `anchor - i` days and have an
/// increment of at least the threshold. The first gap or quiet day ends it.
#[derive(Debug, Clone, Copy)]
pub struct StreakCalculator {
    pub active_day_threshold: i64,
    pub lookback_days: u32,
    pub anchor: StreakAnchor,
}

impl Default for StreakCalculator {
    fn default() -> Self {
        Self {
            active_day_threshold: DEFAULT_ACTIVE_DAY_THRESHOLD,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            anchor: StreakAnchor::Today,
        }
    }
}

impl From<&ProgressConfig> for StreakCalculator {
    fn from(config: &ProgressConfig) -> Self {
        Self {
            active_day_threshold: config.active_day_threshold,
            lookback_days: config.streak_lookback_days.max(1),
            anchor: config.streak_anchor,
        }
    }
}

impl StreakCalculator {
    /// Load the lookback window and compute the streak ending at `today`.
    pub fn calculate(&self, db: &Database, student_id: &str, today: NaiveDate) -> Result<u32> {
        let since = today - Duration::days(self.lookback_days as i64 - 1);
        let entries = db.list_daily_entries_since(student_id, since)?;
        Ok(self.streak_from_entries(&entries, today))
    }

    /// Compute the streak from entries ordered most recent first.
    pub fn streak_from_entries(&self, entries: &[DailyProgressEntry], today: NaiveDate) -> u32 {
        let mut walk = entries.iter().skip_while(|e| e.date > today).peekable();

        let anchor = match self.anchor {
            StreakAnchor::Today => today,
            StreakAnchor::YesterdayGrace => match walk.peek() {
                Some(first) if first.date == today => today,
                _ => today - Duration::days(1),
            },
        };

        let mut streak = 0u32;
        for (i, entry) in walk.enumerate() {
            let expected = anchor - Duration::days(i as i64);
            if entry.date != expected || entry.daily_increment < self.active_day_threshold {
                break;
            }
            streak += 1;
        }
        streak
    }
}

/// Streak ending exactly at `today` with the default lookback window.
pub fn calculate_streak(
    db: &Database,
    student_id: &str,
    active_day_threshold: i64,
    today: NaiveDate,
) -> Result<u32> {
    StreakCalculator {
        active_day_threshold,
        ..StreakCalculator::default()
    }
    .calculate(db, student_id, today)
}
