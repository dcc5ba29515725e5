// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fixed-window rate limiter for form submissions.
//!
//! Each client key gets a fixed number of points per window (5 per 60s by
//! default). The window starts at the key's first request and resets once it
//! has fully elapsed. State lives in process memory only.

use crate::config::RateLimitConfig;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Request is allowed
    Allowed {
        /// Remaining requests in current window
        remaining: u32,
        /// Time until window resets
        reset_in: Duration,
    },
    /// Request is rate limited
    Limited {
        /// Time until the window resets
        retry_after: Duration,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }
}

/// Counter for one client key.
#[derive(Debug)]
struct Window {
    /// Points consumed in the current window
    count: u32,
    /// When the current window started
    started: Instant,
}

impl Window {
    fn new(now: Instant) -> Self {
        Self {
            count: 0,
            started: now,
        }
    }

    fn is_expired(&self, now: Instant, length: Duration) -> bool {
        now.duration_since(self.started) >= length
    }

    fn reset_in(&self, now: Instant, length: Duration) -> Duration {
        length.saturating_sub(now.duration_since(self.started))
    }
}

/// Thread-safe rate limiter.
pub struct RateLimiter {
    /// Configuration
    config: RateLimitConfig,
    /// Per-key windows
    windows: Arc<RwLock<HashMap<String, Window>>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given configuration.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Consume one point for `key`.
    ///
    /// The write lock is held across lookup and increment, so concurrent
    /// requests for the same key can never overshoot the quota.
    pub async fn consume(&self, key: &str) -> RateLimitResult {
        let length = self.config.window_duration();
        let now = Instant::now();

        let mut windows = self.windows.write().await;
        let window = windows
            .entry(key.to_string())
            .or_insert_with(|| Window::new(now));

        if window.is_expired(now, length) {
            *window = Window::new(now);
        }

        if window.count < self.config.points {
            window.count += 1;
            RateLimitResult::Allowed {
                remaining: self.config.points - window.count,
                reset_in: window.reset_in(now, length),
            }
        } else {
            let retry_after = window.reset_in(now, length);
            debug!(key, ?retry_after, "Rate limit exceeded");
            RateLimitResult::Limited { retry_after }
        }
    }

    /// Drop keys whose window has elapsed (should be called periodically).
    pub async fn cleanup(&self) {
        let length = self.config.window_duration();
        let now = Instant::now();

        let mut windows = self.windows.write().await;
        let before = windows.len();
        windows.retain(|_, window| !window.is_expired(now, length));
        let removed = before - windows.len();
        if removed > 0 {
            debug!(removed, remaining = windows.len(), "Cleaned up rate limit windows");
        }
    }

    /// Number of keys currently tracked.
    pub async fn tracked_keys(&self) -> usize {
        self.windows.read().await.len()
    }
}
