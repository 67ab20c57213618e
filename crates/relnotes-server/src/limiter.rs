use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy)]
pub struct Decision {
    pub success: bool,
    /// When the caller's window resets (meaningful on denial).
    pub reset: DateTime<Utc>,
}

/// Seam to the rate-limiter backend, keyed by caller identity.
///
/// `limit` must be atomic check-and-decrement: two concurrent calls for the
/// same key when one slot remains must not both succeed.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn limit(&self, key: &str) -> Decision;
}

/// In-process fixed-window limiter, the default backend.
///
/// External token-bucket services plug in behind the [`RateLimiter`] trait;
/// this one keeps per-key windows under a single mutex, which gives the
/// required atomicity within the process.
pub struct FixedWindowLimiter {
    window: Duration,
    max_requests: u32,
    windows: Mutex<HashMap<String, WindowState>>,
}

struct WindowState {
    started: DateTime<Utc>,
    used: u32,
}

impl FixedWindowLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        FixedWindowLimiter {
            window,
            max_requests,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn hourly(max_requests: u32) -> Self {
        Self::new(Duration::from_secs(3600), max_requests)
    }

    fn check(&self, key: &str, now: DateTime<Utc>) -> Decision {
        let window = chrono::Duration::from_std(self.window).unwrap_or(chrono::Duration::hours(1));
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());

        let state = windows.entry(key.to_string()).or_insert(WindowState {
            started: now,
            used: 0,
        });

        if now - state.started >= window {
            state.started = now;
            state.used = 0;
        }

        let reset = state.started + window;
        if state.used < self.max_requests {
            state.used += 1;
            Decision {
                success: true,
                reset,
            }
        } else {
            Decision {
                success: false,
                reset,
            }
        }
    }
}

#[async_trait]
impl RateLimiter for FixedWindowLimiter {
    async fn limit(&self, key: &str) -> Decision {
        self.check(key, Utc::now())
    }
}
