use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use relnotes_core::{DateRange, DateRangeRequest, RepoId};
use relnotes_github::{Credentials, GitHubClient};
use relnotes_prompts::{assemble_prompt, PrSummary};

use super::error::{
    generate_error, github_error, rate_limited, validation_error, ApiError,
};
use super::AppState;
use crate::auth::sha256_hex;
use crate::stream::relay;

/// Fixed body for the zero-PR case. The heading is the recognizable part:
/// clients distinguish this from an error by it, so it must not change.
pub const NO_PULL_REQUESTS_BODY: &str = "# No Pull Requests Found\n\n\
    No merged pull requests were found in this repository for the selected date range. \
    Try widening the date range or double-check the repository.";

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/changelog", post(generate_changelog))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangelogRequest {
    repository: String,
    date_mode: String,
    days: Option<i64>,
    start_date: Option<String>,
    end_date: Option<String>,
    /// Rate-limit fingerprint; required on the anonymous path.
    identifier: Option<String>,
}

async fn generate_changelog(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChangelogRequest>,
) -> Result<Response, ApiError> {
    let repo = RepoId::parse(&request.repository)
        .map_err(|e| validation_error(e.to_string()))?;

    let credentials = authorize(&state, &headers, request.identifier.as_deref()).await?;

    let range = resolve_range(&request)?;

    let client = GitHubClient::new(credentials, state.fetch_config.clone())
        .map_err(|e| github_error(&e))?;
    let result = client
        .fetch_merged_prs(&repo, &range)
        .await
        .map_err(|e| github_error(&e))?;

    if result.prs.is_empty() {
        info!(repo = %repo, "no merged PRs in range");
        return Ok(text_response(NO_PULL_REQUESTS_BODY.to_string()));
    }

    let summaries: Vec<PrSummary> = result.prs.iter().map(PrSummary::from).collect();
    let prompt = assemble_prompt(&summaries, result.total_count);
    info!(
        repo = %repo,
        prs = summaries.len(),
        total = result.total_count,
        "prompt assembled; starting generation"
    );

    let chunks = state
        .generator
        .generate(&prompt)
        .await
        .map_err(|e| generate_error(&e))?;

    Ok(streamed_response(relay(chunks)))
}

/// Identify the caller, pick the matching quota, and check the limit.
///
/// Returns the GitHub credentials for the fetch on success. The limiter call
/// is a single atomic check-and-decrement, so concurrent requests from the
/// same identity cannot both pass on the last slot.
pub(super) async fn authorize(
    state: &AppState,
    headers: &HeaderMap,
    identifier: Option<&str>,
) -> Result<Credentials, ApiError> {
    match state.sessions.access_token(headers) {
        Some(token) => {
            let key = format!("user:{}", sha256_hex(&token));
            let decision = state.user_limiter.limit(&key).await;
            if !decision.success {
                return Err(rate_limited(decision.reset, state.user_hourly_limit));
            }
            Ok(Credentials::User { token })
        }
        None => {
            let identifier = identifier.ok_or_else(|| {
                validation_error("identifier is required for anonymous requests")
            })?;
            let key = format!("anon:{}", sha256_hex(identifier));
            let decision = state.anon_limiter.limit(&key).await;
            if !decision.success {
                return Err(rate_limited(decision.reset, state.anon_hourly_limit));
            }
            Ok(Credentials::Anonymous {
                service_token: state.service_token.clone(),
            })
        }
    }
}

fn resolve_range(request: &ChangelogRequest) -> Result<DateRange, ApiError> {
    let resolved = match (request.date_mode.as_str(), request.days) {
        ("days", Some(days)) => DateRangeRequest::Days { days },
        ("days", None) => return Err(validation_error("days mode requires a day count")),
        ("range", _) => match (&request.start_date, &request.end_date) {
            (Some(start), Some(end)) => DateRangeRequest::Range {
                start_date: start.clone(),
                end_date: end.clone(),
            },
            _ => {
                return Err(validation_error(
                    "range mode requires startDate and endDate",
                ))
            }
        },
        (other, _) => {
            return Err(validation_error(format!(
                "unknown dateMode {other:?}; expected \"days\" or \"range\""
            )))
        }
    };
    DateRange::resolve(&resolved).map_err(|e| validation_error(e.to_string()))
}

fn text_response(body: String) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}

pub(super) fn streamed_response(body: axum::body::Body) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}
