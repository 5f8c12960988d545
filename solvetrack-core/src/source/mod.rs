//! External stats source boundary.
//!
//! A [`StatsSource`] turns a handle into a [`SolveStats`] snapshot. Any
//! failure is reported as `Error::NotFound` (unknown handle) or
//! `Error::UpstreamUnavailable` (transport, status or timeout), both of which
//! batch callers tally and skip.

mod leetcode;

pub use leetcode::LeetCodeClient;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::SolveStats;

/// Supplies cumulative solve counts for a handle.
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Fetch the current snapshot for `handle`.
    async fn fetch(&self, handle: &str) -> Result<SolveStats>;
}
