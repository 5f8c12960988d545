//! # solvetrack-core
//!
//! Core library for solvetrack, a LeetCode progress tracker for student cohorts.
//!
//! This library provides:
//! - Domain types for students, daily entries, weekly trends and badges
//! - Database storage layer with SQLite
//! - Progress reconciliation, streaks and badge rules
//! - Admin, student, leaderboard and batch dashboards
//! - CSV roster and weekly grid imports
//! - The LeetCode stats source and sync coordination
//! - Configuration management and logging infrastructure
//!
//! ## Data flow
//!
//! A sync fetches a snapshot per student, records the day's entry, refreshes
//! the week bucket, recomputes the streak and evaluates badges. Dashboards
//! are computed on read. CSV imports are an alternate entry point for bulk
//! history.
//!
//! ## Example
//!
//! ```rust,no_run
//! use solvetrack_core::{Config, Database};
//!
//! // Load configuration
//! let config = Config::load().expect("failed to load config");
//!
//! // Open database
//! let db = Database::open(&Config::database_path()).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use db::{Database, DeletedStudent};
pub use error::{Error, Result};
pub use progress::{ProgressEngine, SnapshotOutcome};
pub use source::{LeetCodeClient, StatsSource};
pub use sync::{SchedulerHandle, SyncCoordinator, SyncResult, SyncScheduler};
pub use types::*;

// Public modules
pub mod badges;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod import;
pub mod logging;
pub mod progress;
pub mod source;
pub mod sync;
pub mod types;
