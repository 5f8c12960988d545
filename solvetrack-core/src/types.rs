//! Core domain types for solvetrack
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Student** | A tracked member of a cohort, identified by their LeetCode handle |
//! | **Batch** | A named cohort grouping (e.g. enrollment year) |
//! | **Snapshot** | One point-in-time read of a student's cumulative solve counts |
//! | **Daily entry** | The snapshot for one calendar date plus its increment over the prior date |
//! | **Weekly trend** | The week-end total for one Monday-started week plus its increment over the prior week |
//! | **Badge** | An achievement granted when a threshold rule holds |
//!
//! Dates are calendar dates without a timezone; callers decide which day "today" is.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// Student
// ============================================

/// A tracked student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    /// Stable identifier (uuid v4)
    pub id: String,
    /// Display name
    pub name: String,
    /// LeetCode username, unique case-insensitively
    pub handle: String,
    /// Link to the public profile
    pub profile_url: Option<String>,
    /// Cohort tag
    pub batch: Option<String>,
    /// When the student was onboarded
    pub created_at: DateTime<Utc>,
}

/// Fields needed to onboard a student.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewStudent {
    pub name: String,
    pub handle: String,
    pub profile_url: Option<String>,
    pub batch: Option<String>,
}

impl NewStudent {
    pub fn new(name: impl Into<String>, handle: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handle: handle.into(),
            profile_url: None,
            batch: None,
        }
    }

    pub fn with_batch(mut self, batch: impl Into<String>) -> Self {
        self.batch = Some(batch.into());
        self
    }

    pub fn with_profile_url(mut self, url: impl Into<String>) -> Self {
        self.profile_url = Some(url.into());
        self
    }
}

/// Normalize a handle typed by a human or found in a spreadsheet.
///
/// Accepts bare handles as well as profile URLs such as
/// `https://leetcode.com/u/alice/` or `leetcode.com/alice`.
pub fn normalize_handle(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches('@');
    let without_scheme = trimmed
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("www.");

    let Some(path) = without_scheme.strip_prefix("leetcode.com") else {
        return trimmed.to_string();
    };

    path.split('/')
        .find(|segment| !segment.is_empty() && *segment != "u")
        .unwrap_or("")
        .to_string()
}

// ============================================
// Stats
// ============================================

/// Cumulative solve counts for one student.
///
/// `Default` is the zeroed value used wherever real stats are unavailable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveStats {
    pub total_solved: i64,
    pub easy_solved: i64,
    pub medium_solved: i64,
    pub hard_solved: i64,
    /// Accepted / total submissions, as a percentage
    pub acceptance_rate: Option<f64>,
}

impl SolveStats {
    pub fn new(total: i64, easy: i64, medium: i64, hard: i64) -> Self {
        Self {
            total_solved: total,
            easy_solved: easy,
            medium_solved: medium,
            hard_solved: hard,
            acceptance_rate: None,
        }
    }

    pub fn with_acceptance_rate(mut self, rate: f64) -> Self {
        self.acceptance_rate = Some(rate);
        self
    }
}

// ============================================
// Time series
// ============================================

/// One snapshot per (student, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyProgressEntry {
    pub student_id: String,
    pub date: NaiveDate,
    pub total_solved: i64,
    pub easy_solved: i64,
    pub medium_solved: i64,
    pub hard_solved: i64,
    pub acceptance_rate: Option<f64>,
    /// `total_solved` minus the total of the most recent earlier entry.
    /// Negative when the upstream account was reset.
    pub daily_increment: i64,
    pub updated_at: DateTime<Utc>,
}

impl DailyProgressEntry {
    pub fn stats(&self) -> SolveStats {
        SolveStats {
            total_solved: self.total_solved,
            easy_solved: self.easy_solved,
            medium_solved: self.medium_solved,
            hard_solved: self.hard_solved,
            acceptance_rate: self.acceptance_rate,
        }
    }
}

/// One bucket per (student, Monday-started week).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyTrendEntry {
    pub student_id: String,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    /// Latest total seen during the week
    pub total_problems: i64,
    /// `total_problems` minus the previous stored week's total
    pub weekly_increment: i64,
    pub updated_at: DateTime<Utc>,
}

// ============================================
// Badges
// ============================================

/// Every badge the evaluator knows how to grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeType {
    CenturyCoder,
    StreakMaster,
    ComebackCoder,
    ProblemHunter,
    HardMode,
    Perfectionist,
    WeeklyTopper,
}

impl BadgeType {
    pub const ALL: [BadgeType; 7] = [
        BadgeType::CenturyCoder,
        BadgeType::StreakMaster,
        BadgeType::ComebackCoder,
        BadgeType::ProblemHunter,
        BadgeType::HardMode,
        BadgeType::Perfectionist,
        BadgeType::WeeklyTopper,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeType::CenturyCoder => "century_coder",
            BadgeType::StreakMaster => "streak_master",
            BadgeType::ComebackCoder => "comeback_coder",
            BadgeType::ProblemHunter => "problem_hunter",
            BadgeType::HardMode => "hard_mode",
            BadgeType::Perfectionist => "perfectionist",
            BadgeType::WeeklyTopper => "weekly_topper",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BadgeType::CenturyCoder => "Century Coder",
            BadgeType::StreakMaster => "Streak Master",
            BadgeType::ComebackCoder => "Comeback Coder",
            BadgeType::ProblemHunter => "Problem Hunter",
            BadgeType::HardMode => "Hard Mode",
            BadgeType::Perfectionist => "Perfectionist",
            BadgeType::WeeklyTopper => "Weekly Topper",
        }
    }
}

impl std::fmt::Display for BadgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BadgeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BadgeType::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| format!("unknown badge type: {}", s))
    }
}

/// A granted achievement. Never mutated or deleted after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub id: i64,
    pub student_id: String,
    pub badge_type: BadgeType,
    /// Calendar day the grant belongs to
    pub granted_on: NaiveDate,
    pub granted_at: DateTime<Utc>,
}

// ============================================
// Bulk import grid
// ============================================

/// Denormalized four-week grid populated by the weekly CSV import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyProgressData {
    pub student_id: String,
    pub week1: i64,
    pub week2: i64,
    pub week3: i64,
    pub week4: i64,
    pub current_week: i64,
    pub week1_to_week2: i64,
    pub week2_to_week3: i64,
    pub week3_to_week4: i64,
    pub last_week_to_current_increment: i64,
    pub total_score: i64,
    pub average_weekly_growth: i64,
}

// ============================================
// Status classification
// ============================================

/// Weekly activity tier shown on admin views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityStatus {
    Excellent,
    Active,
    Underperforming,
}

impl ActivityStatus {
    pub const EXCELLENT_THRESHOLD: i64 = 15;
    pub const ACTIVE_THRESHOLD: i64 = 5;

    pub fn from_weekly_progress(weekly_progress: i64) -> Self {
        if weekly_progress >= Self::EXCELLENT_THRESHOLD {
            ActivityStatus::Excellent
        } else if weekly_progress >= Self::ACTIVE_THRESHOLD {
            ActivityStatus::Active
        } else {
            ActivityStatus::Underperforming
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityStatus::Excellent => "Excellent",
            ActivityStatus::Active => "Active",
            ActivityStatus::Underperforming => "Underperforming",
        }
    }
}

impl std::fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
