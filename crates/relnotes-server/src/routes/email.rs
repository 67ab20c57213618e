use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use relnotes_core::RepoId;
use relnotes_prompts::assemble_email_prompt;

use super::changelog::{authorize, streamed_response};
use super::error::{generate_error, validation_error, ApiError};
use super::AppState;
use crate::stream::relay;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/email", post(generate_email))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmailRequest {
    /// A previously generated changelog to rewrite.
    changelog: String,
    repository: String,
    identifier: Option<String>,
}

async fn generate_email(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<EmailRequest>,
) -> Result<Response, ApiError> {
    let repo = RepoId::parse(&request.repository)
        .map_err(|e| validation_error(e.to_string()))?;

    if request.changelog.trim().is_empty() {
        return Err(validation_error("changelog must not be empty"));
    }

    authorize(&state, &headers, request.identifier.as_deref()).await?;

    let prompt = assemble_email_prompt(&request.changelog, &repo.to_string());
    info!(repo = %repo, "starting email rewrite generation");

    let chunks = state
        .generator
        .generate(&prompt)
        .await
        .map_err(|e| generate_error(&e))?;

    Ok(streamed_response(relay(chunks)))
}
