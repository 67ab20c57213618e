pub mod changelog;
pub mod email;
mod error;
pub mod health;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;

use relnotes_github::FetchConfig;

use crate::auth::SessionProvider;
use crate::generate::Generator;
use crate::limiter::RateLimiter;

pub struct InnerAppState {
    pub sessions: Arc<dyn SessionProvider>,
    /// Quota for fingerprint-keyed anonymous callers.
    pub anon_limiter: Arc<dyn RateLimiter>,
    /// Higher quota for token-authenticated callers.
    pub user_limiter: Arc<dyn RateLimiter>,
    pub generator: Arc<dyn Generator>,
    pub fetch_config: FetchConfig,
    /// Quota numbers, carried so denial messages can state the limit.
    pub anon_hourly_limit: u32,
    pub user_hourly_limit: u32,
    /// Shared GitHub token for the anonymous fetch path (raises search quota).
    pub service_token: Option<String>,
}

pub type AppState = Arc<InnerAppState>;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(changelog::routes())
        .merge(email::routes())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
