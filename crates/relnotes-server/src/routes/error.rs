use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use relnotes_github::GitHubError;

use crate::generate::GenerateError;

pub type ApiError = (StatusCode, Json<Value>);

pub fn validation_error(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": message.into() })),
    )
}

pub fn rate_limited(reset: chrono::DateTime<chrono::Utc>, limit_per_hour: u32) -> ApiError {
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({
            "error": format!(
                "Rate limit of {limit_per_hour} changelogs per hour reached. Try again after {}.",
                reset.to_rfc3339()
            ),
            "reset": reset.to_rfc3339(),
        })),
    )
}

/// Map the closed GitHub taxonomy onto response statuses. Switches on the
/// variant only; raw upstream status codes never reach this layer.
pub fn github_error(err: &GitHubError) -> ApiError {
    let status = match err {
        GitHubError::Auth | GitHubError::TokenExpired => StatusCode::UNAUTHORIZED,
        GitHubError::RateLimit { .. } => StatusCode::TOO_MANY_REQUESTS,
        GitHubError::Forbidden { .. } => StatusCode::FORBIDDEN,
        GitHubError::NotFound => StatusCode::NOT_FOUND,
        GitHubError::InvalidQuery { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        GitHubError::Server { .. } => StatusCode::BAD_GATEWAY,
        GitHubError::Timeout | GitHubError::Network { .. } => StatusCode::GATEWAY_TIMEOUT,
        GitHubError::Unknown { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(json!({ "error": err.to_string(), "kind": err.kind() })),
    )
}

/// Pre-stream generation failures can still use a clean status.
pub fn generate_error(err: &GenerateError) -> ApiError {
    let status = match err {
        GenerateError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        GenerateError::Stream { .. } | GenerateError::Network { .. } => StatusCode::BAD_GATEWAY,
    };
    (status, Json(json!({ "error": err.to_string() })))
}
