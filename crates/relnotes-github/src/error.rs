use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use thiserror::Error;

/// Upstream rate-limit quota when GitHub omits the limit header.
/// 60/hour is the unauthenticated REST quota.
const DEFAULT_RATE_LIMIT: u32 = 60;

/// Closed taxonomy of GitHub failures.
///
/// Constructed only by [`GitHubError::classify`] (or
/// [`GitHubError::from_transport`] for client-side failures); callers match
/// on variants and never inspect raw status codes. Each variant's `Display`
/// is user-facing recovery guidance.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GitHubError {
    #[error("GitHub authentication failed. Sign in to continue.")]
    Auth,

    #[error("{}", rate_limit_message(.reset, .remaining, .limit))]
    RateLimit {
        reset: Option<DateTime<Utc>>,
        remaining: u32,
        limit: u32,
    },

    #[error("GitHub denied access: {message}")]
    Forbidden { message: String },

    #[error("Repository not found. Check the owner/repo spelling and that you have access to it.")]
    NotFound,

    #[error("Your GitHub token has expired. Sign in again to refresh access.")]
    TokenExpired,

    #[error("GitHub rejected the search query: {message}")]
    InvalidQuery { message: String },

    #[error("GitHub returned a server error (status {status}). This is usually transient; try again.")]
    Server { status: u16 },

    #[error("The request to GitHub timed out. Try again.")]
    Timeout,

    #[error("Network error while contacting GitHub: {message}")]
    Network { message: String },

    #[error("Unexpected GitHub error: {message}")]
    Unknown { message: String },
}

impl GitHubError {
    /// Map a non-2xx GitHub response into the taxonomy.
    ///
    /// `body` is the raw response text; when it is JSON with a `message`
    /// field, that message is surfaced for diagnostics.
    pub fn classify(status: StatusCode, body: &str, headers: &HeaderMap) -> GitHubError {
        let message = extract_message(body);

        match status.as_u16() {
            401 => GitHubError::Auth,
            403 => {
                if header_u32(headers, "x-ratelimit-remaining") == Some(0) {
                    let reset = header_u64(headers, "x-ratelimit-reset")
                        .and_then(|secs| Utc.timestamp_opt(secs as i64, 0).single());
                    let limit =
                        header_u32(headers, "x-ratelimit-limit").unwrap_or(DEFAULT_RATE_LIMIT);
                    GitHubError::RateLimit {
                        reset,
                        remaining: 0,
                        limit,
                    }
                } else {
                    GitHubError::Forbidden { message }
                }
            }
            404 => GitHubError::NotFound,
            422 => {
                if message.to_lowercase().contains("expired") {
                    GitHubError::TokenExpired
                } else {
                    GitHubError::InvalidQuery { message }
                }
            }
            500 | 502 | 503 | 504 => GitHubError::Server {
                status: status.as_u16(),
            },
            _ => GitHubError::Unknown {
                message: format!("status {status}: {message}"),
            },
        }
    }

    /// Classify a transport-level failure (connect error, client-side abort).
    pub fn from_transport(err: &reqwest::Error) -> GitHubError {
        if err.is_timeout() {
            GitHubError::Timeout
        } else {
            GitHubError::Network {
                message: err.to_string(),
            }
        }
    }

    /// Stable discriminant consumed by UI recovery logic.
    pub fn kind(&self) -> &'static str {
        match self {
            GitHubError::Auth => "auth",
            GitHubError::RateLimit { .. } => "rate_limit",
            GitHubError::Forbidden { .. } => "forbidden",
            GitHubError::NotFound => "not_found",
            GitHubError::TokenExpired => "token_expired",
            GitHubError::InvalidQuery { .. } => "invalid_query",
            GitHubError::Server { .. } => "server",
            GitHubError::Timeout => "timeout",
            GitHubError::Network { .. } => "network",
            GitHubError::Unknown { .. } => "unknown",
        }
    }

    /// Whether a plain retry is a sensible recovery affordance.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GitHubError::RateLimit { .. }
                | GitHubError::Server { .. }
                | GitHubError::Timeout
                | GitHubError::Network { .. }
                | GitHubError::Unknown { .. }
        )
    }
}

fn rate_limit_message(reset: &Option<DateTime<Utc>>, remaining: &u32, limit: &u32) -> String {
    let when = reset.map_or_else(
        || "Try again later.".to_string(),
        |r| format!("Resets at {}.", r.to_rfc3339()),
    );
    format!("GitHub rate limit exceeded ({remaining}/{limit} requests remaining). {when}")
}

fn extract_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| body.trim().to_string())
}

fn header_u32(headers: &HeaderMap, name: &str) -> Option<u32> {
    headers.get(name)?.to_str().ok()?.parse().ok()
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers.get(name)?.to_str().ok()?.parse().ok()
}
