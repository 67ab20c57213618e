use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A merged pull request as returned by the GitHub search API.
///
/// Fetched fresh per request and never persisted. `merged_at` is optional in
/// the wire format, but the search query filters on `is:merged`, so it is
/// normally present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub url: String,
    pub merged_at: Option<DateTime<Utc>>,
    pub author: Option<String>,
    pub labels: Vec<String>,
}

/// Aggregate outcome of a paginated fetch.
///
/// `total_count` is the upstream search engine's reported number of matches
/// (authoritative); it may exceed `fetched_count` when paging was cut short
/// by the page cap or the wall-clock budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResult {
    pub prs: Vec<PullRequest>,
    pub total_count: u64,
    pub fetched_count: u64,
}

impl FetchResult {
    pub fn empty() -> FetchResult {
        FetchResult {
            prs: Vec::new(),
            total_count: 0,
            fetched_count: 0,
        }
    }

    /// True when paging stopped before retrieving every reported match.
    pub fn is_truncated(&self) -> bool {
        self.total_count > self.fetched_count
    }
}
