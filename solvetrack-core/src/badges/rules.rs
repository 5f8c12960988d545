//! Declarative badge rule table.
//!
//! Every snapshot-driven badge is one row: the badge it grants, whether it
//! may be granted more than once, and the predicate that must hold.

use crate::types::{BadgeType, SolveStats};

/// Inputs a rule may look at.
#[derive(Debug, Clone, Copy)]
pub struct BadgeContext<'a> {
    pub stats: &'a SolveStats,
    pub daily_increment: i64,
    pub streak: u32,
}

/// One threshold rule.
#[derive(Clone, Copy)]
pub struct BadgeRule {
    pub badge_type: BadgeType,
    /// Repeatable badges are recorded every time the predicate holds
    pub repeatable: bool,
    pub predicate: fn(&BadgeContext<'_>) -> bool,
}

impl std::fmt::Debug for BadgeRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BadgeRule")
            .field("badge_type", &self.badge_type)
            .field("repeatable", &self.repeatable)
            .finish_non_exhaustive()
    }
}

impl BadgeRule {
    pub fn applies(&self, ctx: &BadgeContext<'_>) -> bool {
        (self.predicate)(ctx)
    }
}

pub const CENTURY_THRESHOLD: i64 = 100;
pub const STREAK_MASTER_DAYS: u32 = 7;
pub const COMEBACK_DAILY_INCREMENT: i64 = 10;
pub const PROBLEM_HUNTER_THRESHOLD: i64 = 50;
pub const HARD_MODE_THRESHOLD: i64 = 10;
pub const PERFECTIONIST_ACCEPTANCE: f64 = 80.0;
pub const PERFECTIONIST_MIN_SOLVED: i64 = 20;

fn century_coder(ctx: &BadgeContext<'_>) -> bool {
    ctx.stats.total_solved >= CENTURY_THRESHOLD
}

fn streak_master(ctx: &BadgeContext<'_>) -> bool {
    ctx.streak >= STREAK_MASTER_DAYS
}

fn comeback_coder(ctx: &BadgeContext<'_>) -> bool {
    ctx.daily_increment >= COMEBACK_DAILY_INCREMENT
}

fn problem_hunter(ctx: &BadgeContext<'_>) -> bool {
    ctx.stats.total_solved >= PROBLEM_HUNTER_THRESHOLD
}

fn hard_mode(ctx: &BadgeContext<'_>) -> bool {
    ctx.stats.hard_solved >= HARD_MODE_THRESHOLD
}

fn perfectionist(ctx: &BadgeContext<'_>) -> bool {
    ctx.stats.total_solved >= PERFECTIONIST_MIN_SOLVED
        && ctx
            .stats
            .acceptance_rate
            .is_some_and(|rate| rate >= PERFECTIONIST_ACCEPTANCE)
}

/// Rules evaluated on every recorded snapshot.
pub const SNAPSHOT_RULES: &[BadgeRule] = &[
    BadgeRule {
        badge_type: BadgeType::CenturyCoder,
        repeatable: false,
        predicate: century_coder,
    },
    BadgeRule {
        badge_type: BadgeType::StreakMaster,
        repeatable: false,
        predicate: streak_master,
    },
    BadgeRule {
        badge_type: BadgeType::ComebackCoder,
        repeatable: true,
        predicate: comeback_coder,
    },
    BadgeRule {
        badge_type: BadgeType::ProblemHunter,
        repeatable: false,
        predicate: problem_hunter,
    },
    BadgeRule {
        badge_type: BadgeType::HardMode,
        repeatable: false,
        predicate: hard_mode,
    },
    BadgeRule {
        badge_type: BadgeType::Perfectionist,
        repeatable: false,
        predicate: perfectionist,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(badge_type: BadgeType) -> &'static BadgeRule {
        SNAPSHOT_RULES
            .iter()
            .find(|r| r.badge_type == badge_type)
            .unwrap()
    }

    fn ctx(stats: &SolveStats, daily_increment: i64, streak: u32) -> BadgeContext<'_> {
        BadgeContext {
            stats,
            daily_increment,
            streak,
        }
    }

    #[test]
    fn test_century_boundary() {
        let r = rule(BadgeType::CenturyCoder);
        assert!(!r.applies(&ctx(&SolveStats::new(99, 99, 0, 0), 0, 0)));
        assert!(r.applies(&ctx(&SolveStats::new(100, 100, 0, 0), 0, 0)));
    }

    #[test]
    fn test_streak_master_boundary() {
        let r = rule(BadgeType::StreakMaster);
        let stats = SolveStats::default();
        assert!(!r.applies(&ctx(&stats, 0, 6)));
        assert!(r.applies(&ctx(&stats, 0, 7)));
    }

    #[test]
    fn test_comeback_is_only_repeatable_rule() {
        let repeatable: Vec<_> = SNAPSHOT_RULES
            .iter()
            .filter(|r| r.repeatable)
            .map(|r| r.badge_type)
            .collect();
        assert_eq!(repeatable, vec![BadgeType::ComebackCoder]);

        let r = rule(BadgeType::ComebackCoder);
        let stats = SolveStats::default();
        assert!(!r.applies(&ctx(&stats, 9, 0)));
        assert!(r.applies(&ctx(&stats, 10, 0)));
    }

    #[test]
    fn test_hard_mode_uses_hard_count() {
        let r = rule(BadgeType::HardMode);
        assert!(!r.applies(&ctx(&SolveStats::new(200, 150, 41, 9), 0, 0)));
        assert!(r.applies(&ctx(&SolveStats::new(20, 5, 5, 10), 0, 0)));
    }

    #[test]
    fn test_perfectionist_needs_rate_and_volume() {
        let r = rule(BadgeType::Perfectionist);
        let no_rate = SolveStats::new(50, 50, 0, 0);
        let few = SolveStats::new(5, 5, 0, 0).with_acceptance_rate(95.0);
        let good = SolveStats::new(30, 30, 0, 0).with_acceptance_rate(80.0);
        assert!(!r.applies(&ctx(&no_rate, 0, 0)));
        assert!(!r.applies(&ctx(&few, 0, 0)));
        assert!(r.applies(&ctx(&good, 0, 0)));
    }

    #[test]
    fn test_rules_are_unique_per_badge() {
        let mut seen = std::collections::HashSet::new();
        for r in SNAPSHOT_RULES {
            assert!(seen.insert(r.badge_type), "duplicate rule for {}", r.badge_type);
        }
        assert!(!seen.contains(&BadgeType::WeeklyTopper));
    }
}
