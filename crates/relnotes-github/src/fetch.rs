use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use relnotes_core::{DateRange, FetchResult, PullRequest, RepoId};

use crate::error::GitHubError;

/// Tunable fetch-loop limits. Defaults match the production budgets; tests
/// shrink them to exercise the termination paths without real waiting.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Base API URL, overridable so tests can point at a local mock.
    pub base_url: String,
    /// Search page size (GitHub caps this at 100).
    pub per_page: usize,
    /// Hard page ceiling: 10 pages of 100 = at most 1000 PRs.
    pub max_pages: u32,
    /// Timeout for each individual page request.
    pub page_timeout: Duration,
    /// Wall-clock budget for the whole loop; exceeding it returns whatever
    /// was fetched so far as a successful partial result.
    pub overall_budget: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            base_url: "https://api.github.com".to_string(),
            per_page: 100,
            max_pages: 10,
            page_timeout: Duration::from_secs(10),
            overall_budget: Duration::from_secs(30),
        }
    }
}

/// How to authenticate against GitHub.
///
/// The anonymous variant may carry a shared service token (raises the search
/// quota from 10 to 30 requests/minute); the user variant carries an
/// OAuth-derived token and can see private repositories.
#[derive(Debug, Clone)]
pub enum Credentials {
    Anonymous { service_token: Option<String> },
    User { token: String },
}

impl Credentials {
    fn bearer(&self) -> Option<&str> {
        match self {
            Credentials::Anonymous { service_token } => service_token.as_deref(),
            Credentials::User { token } => Some(token.as_str()),
        }
    }
}

/// Client for the GitHub search API.
pub struct GitHubClient {
    http: reqwest::Client,
    config: FetchConfig,
    credentials: Credentials,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    total_count: u64,
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    number: u64,
    title: String,
    body: Option<String>,
    html_url: String,
    user: Option<SearchUser>,
    #[serde(default)]
    labels: Vec<SearchLabel>,
    pull_request: Option<SearchPrRef>,
}

#[derive(Debug, Deserialize)]
struct SearchUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct SearchLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SearchPrRef {
    merged_at: Option<DateTime<Utc>>,
}

impl From<SearchItem> for PullRequest {
    fn from(item: SearchItem) -> PullRequest {
        PullRequest {
            number: item.number,
            title: item.title,
            body: item.body,
            url: item.html_url,
            merged_at: item.pull_request.and_then(|pr| pr.merged_at),
            author: item.user.map(|u| u.login),
            labels: item.labels.into_iter().map(|l| l.name).collect(),
        }
    }
}

impl GitHubClient {
    pub fn new(credentials: Credentials, config: FetchConfig) -> Result<Self, GitHubError> {
        let http = reqwest::Client::builder()
            .user_agent("relnotes")
            .build()
            .map_err(|e| GitHubError::Network {
                message: format!("HTTP client init: {e}"),
            })?;
        Ok(GitHubClient {
            http,
            config,
            credentials,
        })
    }

    /// Build the search qualifier string. Date bounds use day precision,
    /// matching what the search engine indexes.
    fn search_query(repo: &RepoId, range: &DateRange) -> String {
        format!(
            "repo:{}/{} is:pr is:merged merged:{}..{}",
            repo.owner,
            repo.repo,
            range.start.format("%Y-%m-%d"),
            range.end.format("%Y-%m-%d"),
        )
    }

    /// Fetch every merged PR in `range`, walking search pages in order.
    ///
    /// Termination, in priority order:
    /// - a page fails (non-2xx or transport error): the whole fetch fails,
    ///   classified per [`GitHubError`] — no partial results,
    /// - the wall-clock budget is exhausted: returns the pages accumulated so
    ///   far as a successful partial result,
    /// - the page cap is reached, a short page arrives, or the aggregate
    ///   reaches the reported total: normal completion.
    ///
    /// The first page's `total_count` is authoritative; later pages never
    /// overwrite it.
    pub async fn fetch_merged_prs(
        &self,
        repo: &RepoId,
        range: &DateRange,
    ) -> Result<FetchResult, GitHubError> {
        let query = Self::search_query(repo, range);
        let url = format!("{}/search/issues", self.config.base_url);
        let started = Instant::now();

        let mut prs: Vec<PullRequest> = Vec::new();
        let mut total_count: u64 = 0;

        for page in 1..=self.config.max_pages {
            if started.elapsed() >= self.config.overall_budget {
                warn!(
                    fetched = prs.len(),
                    total = total_count,
                    "fetch budget exhausted; returning partial results"
                );
                break;
            }

            let page_response = self.fetch_page(&url, &query, page).await?;

            // Page 1's total is the authoritative match count.
            if page == 1 {
                total_count = page_response.total_count;
            }

            let item_count = page_response.items.len();
            debug!(page, items = item_count, "fetched search page");
            prs.extend(page_response.items.into_iter().map(PullRequest::from));

            if item_count < self.config.per_page || prs.len() as u64 >= total_count {
                break;
            }
        }

        let fetched_count = prs.len() as u64;
        info!(
            repo = %repo,
            fetched = fetched_count,
            total = total_count,
            "merged PR fetch complete"
        );
        Ok(FetchResult {
            prs,
            total_count,
            fetched_count,
        })
    }

    async fn fetch_page(
        &self,
        url: &str,
        query: &str,
        page: u32,
    ) -> Result<SearchResponse, GitHubError> {
        let mut request = self
            .http
            .get(url)
            .timeout(self.config.page_timeout)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .query(&[
                ("q", query),
                ("sort", "updated"),
                ("order", "desc"),
                ("per_page", &self.config.per_page.to_string()),
                ("page", &page.to_string()),
            ]);

        if let Some(token) = self.credentials.bearer() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            let err = GitHubError::from_transport(&e);
            warn!(page, %err, "page request failed");
            err
        })?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            return Err(GitHubError::classify(status, &body, &headers));
        }

        response
            .json::<SearchResponse>()
            .await
            .map_err(|e| GitHubError::Unknown {
                message: format!("malformed search response: {e}"),
            })
    }
}
