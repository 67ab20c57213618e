pub mod auth;
pub mod config;
pub mod generate;
pub mod limiter;
pub mod stream;
mod routes;

#[cfg(feature = "test-helpers")]
pub mod test_helpers;

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;

pub use routes::changelog::NO_PULL_REQUESTS_BODY;
pub use routes::{build_router, AppState, InnerAppState};

pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let app = routes::build_router(state);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Build the production state from validated configuration.
pub fn app_state(config: config::Config) -> AppState {
    let anon_limiter = limiter::FixedWindowLimiter::hourly(config.anon_hourly_limit);
    let user_limiter = limiter::FixedWindowLimiter::hourly(config.user_hourly_limit);
    let generator = generate::HttpGenerator::new(
        config.generate_api_url.clone(),
        config.generate_api_key.clone(),
        config.generate_model.clone(),
    );

    Arc::new(InnerAppState {
        sessions: Arc::new(auth::BearerSessions),
        anon_limiter: Arc::new(anon_limiter),
        user_limiter: Arc::new(user_limiter),
        generator: Arc::new(generator),
        fetch_config: relnotes_github::FetchConfig::default(),
        anon_hourly_limit: config.anon_hourly_limit,
        user_hourly_limit: config.user_hourly_limit,
        service_token: config.github_token,
    })
}
