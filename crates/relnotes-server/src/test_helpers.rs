//! Shared helpers for integration tests (feature `test-helpers`).

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;
use tokio::net::TcpListener;

use relnotes_github::FetchConfig;

use crate::auth::BearerSessions;
use crate::generate::{ChunkStream, GenerateError, Generator};
use crate::limiter::FixedWindowLimiter;
use crate::routes::InnerAppState;

pub struct TestServer {
    pub base_url: String,
}

/// Generator that replays a fixed chunk script and records every prompt it
/// was asked to generate from.
pub struct ScriptedGenerator {
    chunks: Vec<Result<String, GenerateError>>,
    pub prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedGenerator {
    pub fn new(chunks: Vec<Result<String, GenerateError>>) -> Self {
        ScriptedGenerator {
            chunks,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<ChunkStream, GenerateError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(futures::stream::iter(self.chunks.clone()).boxed())
    }
}

/// Spawn an in-process server on 127.0.0.1:0 with injected collaborators.
pub async fn spawn_test_server(
    generator: Arc<dyn Generator>,
    fetch_config: FetchConfig,
    anon_hourly_limit: u32,
) -> TestServer {
    let state = Arc::new(InnerAppState {
        sessions: Arc::new(BearerSessions),
        anon_limiter: Arc::new(FixedWindowLimiter::hourly(anon_hourly_limit)),
        user_limiter: Arc::new(FixedWindowLimiter::hourly(anon_hourly_limit * 10)),
        generator,
        fetch_config,
        anon_hourly_limit,
        user_hourly_limit: anon_hourly_limit * 10,
        service_token: None,
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        crate::serve(listener, state).await.unwrap();
    });
    TestServer {
        base_url: format!("http://{addr}"),
    }
}
