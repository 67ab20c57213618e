use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use relnotes_core::PullRequest;

/// Hard cap on the body text carried into the prompt.
const MAX_BODY_CHARS: usize = 500;

const NO_DESCRIPTION: &str = "No description provided";
const UNKNOWN_AUTHOR: &str = "unknown";

/// Compact, prompt-safe projection of a [`PullRequest`].
///
/// A pure function of its source PR: body hard-cut at 500 characters with a
/// fixed placeholder for missing descriptions, author login with a defensive
/// fallback, labels carried through in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrSummary {
    pub number: u64,
    pub title: String,
    pub author: String,
    pub url: String,
    pub merged_at: Option<DateTime<Utc>>,
    pub labels: Vec<String>,
    pub body: String,
}

impl From<&PullRequest> for PrSummary {
    fn from(pr: &PullRequest) -> PrSummary {
        PrSummary {
            number: pr.number,
            title: pr.title.clone(),
            author: pr
                .author
                .clone()
                .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            url: pr.url.clone(),
            merged_at: pr.merged_at,
            labels: pr.labels.clone(),
            body: pr
                .body
                .as_deref()
                .map_or_else(|| NO_DESCRIPTION.to_string(), truncate_body),
        }
    }
}

/// First 500 characters, no ellipsis, no word-boundary adjustment.
fn truncate_body(body: &str) -> String {
    body.chars().take(MAX_BODY_CHARS).collect()
}
