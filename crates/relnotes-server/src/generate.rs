use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerateError {
    #[error("generation backend rejected the request (status {status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("generation stream failed: {message}")]
    Stream { message: String },

    #[error("could not reach the generation backend: {message}")]
    Network { message: String },
}

/// Ordered chunks of generated text. May fail mid-stream; the relay turns
/// that into the trailing error sentinel.
pub type ChunkStream = BoxStream<'static, Result<String, GenerateError>>;

/// Seam to the text-generation backend.
///
/// An `Err` from `generate` happens before any output is produced and can
/// still become a clean status-coded response; errors inside the returned
/// stream happen after headers are committed.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<ChunkStream, GenerateError>;
}

/// Production generator speaking an OpenAI-compatible streaming chat
/// completions endpoint (SSE `data:` lines).
pub struct HttpGenerator {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct StreamEvent {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize, Default)]
struct StreamDelta {
    content: Option<String>,
}

impl HttpGenerator {
    pub fn new(api_url: String, api_key: String, model: String) -> Self {
        HttpGenerator {
            http: reqwest::Client::new(),
            api_url,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn generate(&self, prompt: &str) -> Result<ChunkStream, GenerateError> {
        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "stream": true,
                "messages": [{ "role": "user", "content": prompt }],
            }))
            .send()
            .await
            .map_err(|e| GenerateError::Network {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GenerateError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        debug!("generation stream opened");
        Ok(sse_chunks(response.bytes_stream()).boxed())
    }
}

/// Decode an SSE byte stream into content chunks.
///
/// Splits on newlines, takes `data: ` payloads, stops at `[DONE]`, and pulls
/// `choices[0].delta.content` out of each event. Unparseable events are
/// skipped rather than failing the stream.
fn sse_chunks<S>(bytes: S) -> impl futures::Stream<Item = Result<String, GenerateError>>
where
    S: futures::Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static,
{
    struct State {
        inner: BoxStream<'static, Result<bytes::Bytes, reqwest::Error>>,
        buffer: String,
        pending: std::collections::VecDeque<String>,
        finished: bool,
    }

    futures::stream::unfold(
        State {
            inner: bytes.boxed(),
            buffer: String::new(),
            pending: std::collections::VecDeque::new(),
            finished: false,
        },
        |mut state| async move {
            loop {
                if let Some(chunk) = state.pending.pop_front() {
                    return Some((Ok(chunk), state));
                }
                if state.finished {
                    return None;
                }

                match state.inner.next().await {
                    Some(Ok(bytes)) => {
                        state.buffer.push_str(&String::from_utf8_lossy(&bytes));
                        while let Some(pos) = state.buffer.find('\n') {
                            let line: String = state.buffer.drain(..=pos).collect();
                            let line = line.trim();
                            let Some(payload) = line.strip_prefix("data: ") else {
                                continue;
                            };
                            if payload == "[DONE]" {
                                state.finished = true;
                                break;
                            }
                            if let Ok(event) = serde_json::from_str::<StreamEvent>(payload) {
                                if let Some(content) = event
                                    .choices
                                    .into_iter()
                                    .next()
                                    .and_then(|c| c.delta.content)
                                {
                                    if !content.is_empty() {
                                        state.pending.push_back(content);
                                    }
                                }
                            }
                        }
                    }
                    Some(Err(e)) => {
                        state.finished = true;
                        return Some((
                            Err(GenerateError::Stream {
                                message: e.to_string(),
                            }),
                            state,
                        ));
                    }
                    None => {
                        state.finished = true;
                    }
                }
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn byte_stream(
        parts: Vec<&'static str>,
    ) -> impl futures::Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static {
        stream::iter(
            parts
                .into_iter()
                .map(|p| Ok(bytes::Bytes::from_static(p.as_bytes()))),
        )
    }

    #[tokio::test]
    async fn decodes_sse_content_deltas_in_order() {
        let sse = byte_stream(vec![
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
            "data: [DONE]\n",
        ]);
        let chunks: Vec<String> = sse_chunks(sse)
            .map(|r| r.unwrap())
            .collect::<Vec<_>>()
            .await;
        assert_eq!(chunks, vec!["Hel".to_string(), "lo".to_string()]);
    }

    #[tokio::test]
    async fn reassembles_events_split_across_reads() {
        let sse = byte_stream(vec![
            "data: {\"choices\":[{\"del",
            "ta\":{\"content\":\"whole\"}}]}\n",
            "data: [DONE]\n",
        ]);
        let chunks: Vec<String> = sse_chunks(sse)
            .map(|r| r.unwrap())
            .collect::<Vec<_>>()
            .await;
        assert_eq!(chunks, vec!["whole".to_string()]);
    }

    #[tokio::test]
    async fn skips_events_without_content() {
        let sse = byte_stream(vec![
            ": keepalive\n",
            "data: {\"choices\":[{\"delta\":{}}]}\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\n",
            "data: [DONE]\n",
        ]);
        let chunks: Vec<String> = sse_chunks(sse)
            .map(|r| r.unwrap())
            .collect::<Vec<_>>()
            .await;
        assert_eq!(chunks, vec!["x".to_string()]);
    }

    #[tokio::test]
    async fn ends_after_done_marker() {
        let sse = byte_stream(vec![
            "data: [DONE]\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n",
        ]);
        let chunks: Vec<Result<String, GenerateError>> =
            sse_chunks(sse).collect::<Vec<_>>().await;
        assert!(chunks.is_empty());
    }
}
