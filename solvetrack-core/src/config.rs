//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/solvetrack/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/solvetrack/` (~/.config/solvetrack/)
//! - Data: `$XDG_DATA_HOME/solvetrack/` (~/.local/share/solvetrack/)
//! - State/Logs: `$XDG_STATE_HOME/solvetrack/` (~/.local/state/solvetrack/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// External stats source settings
    #[serde(default)]
    pub source: SourceConfig,

    /// Batch sync settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Streak and activity thresholds
    #[serde(default)]
    pub progress: ProgressConfig,

    /// Badge grant policy
    #[serde(default)]
    pub badges: BadgeConfig,

    /// Dashboard sizing
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// LeetCode GraphQL endpoint configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    /// GraphQL endpoint
    #[serde(default = "default_source_endpoint")]
    pub endpoint: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_source_timeout")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_source_endpoint(),
            timeout_secs: default_source_timeout(),
        }
    }
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_source_endpoint() -> String {
    "https://leetcode.com/graphql".to_string()
}

fn default_source_timeout() -> u64 {
    10
}

/// "Sync all" scheduling and fan-out
#[derive(Debug, Deserialize, Clone)]
pub struct SyncConfig {
    /// Minutes between scheduled syncs in watch mode
    #[serde(default = "default_sync_interval")]
    pub interval_minutes: u64,

    /// Maximum students fetched concurrently
    #[serde(default = "default_sync_concurrency")]
    pub concurrency: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_sync_interval(),
            concurrency: default_sync_concurrency(),
        }
    }
}

impl SyncConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }
}

fn default_sync_interval() -> u64 {
    360
}

fn default_sync_concurrency() -> usize {
    4
}

/// Where a streak walk starts when today's entry has not been synced yet.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StreakAnchor {
    /// Day 0 must be today; a missing today entry caps the streak at 0
    #[default]
    Today,
    /// Fall back to yesterday as day 0 when today has no entry
    YesterdayGrace,
}

/// Activity thresholds
#[derive(Debug, Deserialize, Clone)]
pub struct ProgressConfig {
    /// Minimum daily increment for a day to count towards a streak
    #[serde(default = "default_active_day_threshold")]
    pub active_day_threshold: i64,

    /// How many days of history the streak walk reads
    #[serde(default = "default_streak_lookback")]
    pub streak_lookback_days: u32,

    /// Anchor day for the streak walk
    #[serde(default)]
    pub streak_anchor: StreakAnchor,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            active_day_threshold: default_active_day_threshold(),
            streak_lookback_days: default_streak_lookback(),
            streak_anchor: StreakAnchor::default(),
        }
    }
}

fn default_active_day_threshold() -> i64 {
    5
}

fn default_streak_lookback() -> u32 {
    100
}

/// Badge grant policy
#[derive(Debug, Deserialize, Clone, Default)]
pub struct BadgeConfig {
    /// Limit repeatable badges to one grant per student per day
    #[serde(default)]
    pub cap_repeatable_per_day: bool,
}

/// Dashboard sizing
#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    /// Number of rows in the admin leaderboard
    #[serde(default = "default_leaderboard_size")]
    pub leaderboard_size: usize,

    /// Days of daily activity on a student dashboard
    #[serde(default = "default_recent_days")]
    pub recent_days: u32,

    /// Weeks of trend history on a student dashboard
    #[serde(default = "default_recent_weeks")]
    pub recent_weeks: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            leaderboard_size: default_leaderboard_size(),
            recent_days: default_recent_days(),
            recent_weeks: default_recent_weeks(),
        }
    }
}

fn default_leaderboard_size() -> usize {
    10
}

fn default_recent_days() -> u32 {
    30
}

fn default_recent_weeks() -> u32 {
    8
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.sync.concurrency == 0 {
            return Err(Error::Config(
                "sync.concurrency must be at least 1".to_string(),
            ));
        }
        if self.sync.interval_minutes == 0 {
            return Err(Error::Config(
                "sync.interval_minutes must be at least 1".to_string(),
            ));
        }
        if self.source.timeout_secs == 0 {
            return Err(Error::Config(
                "source.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/solvetrack/config.toml` (~/.config/solvetrack/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("solvetrack").join("config.toml")
    }

    /// Returns the data directory path (for SQLite database)
    ///
    /// `$XDG_DATA_HOME/solvetrack/` (~/.local/share/solvetrack/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("solvetrack")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/solvetrack/` (~/.local/state/solvetrack/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("solvetrack")
    }

    /// Returns the database file path
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("data.db")
    }

    /// Returns the log file path
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("solvetrack.log")
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// Called by the binaries before anything reads these variables.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_DATA_HOME").is_err() {
            std::env::set_var("XDG_DATA_HOME", home.join(".local/share"));
        }

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.progress.active_day_threshold, 5);
        assert_eq!(config.progress.streak_lookback_days, 100);
        assert_eq!(config.progress.streak_anchor, StreakAnchor::Today);
        assert_eq!(config.sync.concurrency, 4);
        assert_eq!(config.dashboard.leaderboard_size, 10);
        assert!(!config.badges.cap_repeatable_per_day);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[source]
timeout_secs = 3

[sync]
interval_minutes = 30
concurrency = 8

[progress]
active_day_threshold = 3
streak_anchor = "yesterday_grace"

[badges]
cap_repeatable_per_day = true

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.source.timeout(), Duration::from_secs(3));
        assert_eq!(config.source.endpoint, "https://leetcode.com/graphql");
        assert_eq!(config.sync.interval(), Duration::from_secs(30 * 60));
        assert_eq!(config.sync.concurrency, 8);
        assert_eq!(config.progress.active_day_threshold, 3);
        assert_eq!(config.progress.streak_anchor, StreakAnchor::YesterdayGrace);
        assert!(config.badges.cap_repeatable_per_day);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_validation_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.sync.concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[dashboard]\nleaderboard_size = 3\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.dashboard.leaderboard_size, 3);
        assert_eq!(config.dashboard.recent_days, 30);
    }

    #[test]
    fn test_load_from_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[sync]\nconcurrency = 0\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }
}
