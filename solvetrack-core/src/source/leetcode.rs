//! LeetCode GraphQL client.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, REFERER};
use serde::{Deserialize, Serialize};

use super::StatsSource;
use crate::config::SourceConfig;
use crate::error::{Error, Result};
use crate::types::SolveStats;

const USER_STATS_QUERY: &str = r#"
query userProblemsSolved($username: String!) {
  matchedUser(username: $username) {
    submitStats {
      acSubmissionNum { difficulty count submissions }
      totalSubmissionNum { difficulty count submissions }
    }
  }
}
"#;

#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'static str,
    variables: Variables<'a>,
}

#[derive(Serialize)]
struct Variables<'a> {
    username: &'a str,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<ResponseData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseData {
    matched_user: Option<MatchedUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchedUser {
    submit_stats: SubmitStats,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitStats {
    ac_submission_num: Vec<DifficultyCount>,
    #[serde(default)]
    total_submission_num: Vec<DifficultyCount>,
}

#[derive(Debug, Deserialize)]
struct DifficultyCount {
    difficulty: String,
    count: i64,
    #[serde(default)]
    submissions: i64,
}

fn find<'a>(counts: &'a [DifficultyCount], difficulty: &str) -> Option<&'a DifficultyCount> {
    counts.iter().find(|c| c.difficulty == difficulty)
}

impl SubmitStats {
    fn into_stats(self) -> SolveStats {
        let count = |difficulty| {
            find(&self.ac_submission_num, difficulty)
                .map(|c| c.count)
                .unwrap_or(0)
        };
        let mut stats = SolveStats::new(count("All"), count("Easy"), count("Medium"), count("Hard"));

        let accepted = find(&self.ac_submission_num, "All").map(|c| c.submissions);
        let total = find(&self.total_submission_num, "All").map(|c| c.submissions);
        if let (Some(accepted), Some(total)) = (accepted, total) {
            if total > 0 {
                stats = stats.with_acceptance_rate(accepted as f64 / total as f64 * 100.0);
            }
        }
        stats
    }
}

/// Fetches public solve counts from LeetCode.
pub struct LeetCodeClient {
    http_client: reqwest::Client,
    endpoint: String,
}

impl LeetCodeClient {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(REFERER, HeaderValue::from_static("https://leetcode.com"));

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
        })
    }

    fn unavailable(handle: &str, message: impl Into<String>) -> Error {
        Error::UpstreamUnavailable {
            handle: handle.to_string(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl StatsSource for LeetCodeClient {
    fn name(&self) -> &str {
        "leetcode"
    }

    async fn fetch(&self, handle: &str) -> Result<SolveStats> {
        let request = GraphQlRequest {
            query: USER_STATS_QUERY,
            variables: Variables { username: handle },
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Self::unavailable(handle, "request timed out")
                } else {
                    Self::unavailable(handle, format!("HTTP request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::unavailable(handle, format!("API error ({})", status)));
        }

        let body: GraphQlResponse = response
            .json()
            .await
            .map_err(|e| Self::unavailable(handle, format!("failed to parse response: {}", e)))?;

        let data = body
            .data
            .ok_or_else(|| Self::unavailable(handle, "response has no data"))?;
        let user = data
            .matched_user
            .ok_or_else(|| Error::NotFound(format!("LeetCode user {}", handle)))?;

        let stats = user.submit_stats.into_stats();
        tracing::debug!(handle, total_solved = stats.total_solved, "Fetched stats");
        Ok(stats)
    }
}
