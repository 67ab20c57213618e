use anyhow::{Context, Result};

/// Process configuration, read once at startup and validated eagerly.
///
/// Components receive this (or pieces of it) through their constructors;
/// nothing reads the environment after startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    /// Optional shared GitHub token attached to anonymous fetches for the
    /// higher search quota. Absence is allowed: public repos, 10 req/min.
    pub github_token: Option<String>,
    /// OpenAI-compatible streaming completions endpoint.
    pub generate_api_url: String,
    pub generate_api_key: String,
    pub generate_model: String,
    pub anon_hourly_limit: u32,
    pub user_hourly_limit: u32,
}

impl Config {
    /// Load from environment variables, failing fast on anything required.
    pub fn from_env() -> Result<Config> {
        let bind = env_or("RELNOTES_BIND", "0.0.0.0");
        let port = env_or("RELNOTES_PORT", "3720")
            .parse()
            .context("RELNOTES_PORT must be a port number")?;

        let generate_api_url = env_or(
            "GENERATE_API_URL",
            "https://api.openai.com/v1/chat/completions",
        );
        let generate_api_key = std::env::var("GENERATE_API_KEY")
            .context("GENERATE_API_KEY is required (generation backend credential)")?;
        let generate_model = env_or("GENERATE_MODEL", "gpt-4o-mini");

        let anon_hourly_limit = env_or("RELNOTES_ANON_HOURLY_LIMIT", "5")
            .parse()
            .context("RELNOTES_ANON_HOURLY_LIMIT must be an integer")?;
        let user_hourly_limit = env_or("RELNOTES_USER_HOURLY_LIMIT", "30")
            .parse()
            .context("RELNOTES_USER_HOURLY_LIMIT must be an integer")?;

        Ok(Config {
            bind,
            port,
            github_token: std::env::var("GITHUB_TOKEN").ok(),
            generate_api_url,
            generate_api_key,
            generate_model,
            anon_hourly_limit,
            user_hourly_limit,
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}
