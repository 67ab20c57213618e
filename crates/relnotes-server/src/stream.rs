use std::convert::Infallible;

use axum::body::Body;
use bytes::Bytes;
use futures::{future, StreamExt};
use tracing::warn;

use crate::generate::ChunkStream;

/// Marker prepended to the terminal chunk when generation fails mid-stream.
///
/// By the time a stream error surfaces, headers are committed and a clean
/// error status is no longer possible; clients recognize a stream ending in
/// this marker as a failed generation, not a truncated success. The format
/// is load-bearing: existing clients string-match it.
pub const ERROR_MARKER: &str = "\n\n---\n\n**Error:** ";

/// Forward generation chunks to the response body as they arrive.
///
/// Order-preserving, no buffering beyond chunk boundaries. The first stream
/// error is converted into a single terminal sentinel chunk and the stream
/// ends there.
pub fn relay(chunks: ChunkStream) -> Body {
    let body_stream = chunks.scan(false, |errored, item| {
        if *errored {
            return future::ready(None);
        }
        let text = match item {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(%e, "generation failed mid-stream");
                *errored = true;
                format!("{ERROR_MARKER}{e}")
            }
        };
        future::ready(Some(Ok::<Bytes, Infallible>(Bytes::from(text))))
    });
    Body::from_stream(body_stream)
}
