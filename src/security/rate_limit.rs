//! Fixed-window rate limiting keyed by route and client IP.
//!
//! Counters live in process memory. Several gateway instances each keep
//! their own windows, so this is a local throttle, not a global quota.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::config::RateLimitRule;
use crate::http::error::ApiError;
use crate::observability::metrics;

/// Outcome of a single rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Requests left in the current window.
    pub remaining: u32,
    /// Time until the current window ends.
    pub reset_in: Duration,
}

impl RateLimitDecision {
    /// `Retry-After` value: whole seconds, rounded up, never zero.
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.reset_in.as_secs() + u64::from(self.reset_in.subsec_nanos() > 0);
        secs.max(1)
    }
}

struct Window {
    started: Instant,
    window: Duration,
    count: u32,
}

impl Window {
    fn expired(&self, now: Instant) -> bool {
        now.duration_since(self.started) >= self.window
    }
}

/// Keyed fixed-window counters.
#[derive(Default)]
pub struct RateLimiter {
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one request against `key` and decide whether it may proceed.
    pub fn check(&self, key: &str, max_requests: u32, window: Duration) -> RateLimitDecision {
        self.check_at(key, max_requests, window, Instant::now())
    }

    fn check_at(
        &self,
        key: &str,
        max_requests: u32,
        window: Duration,
        now: Instant,
    ) -> RateLimitDecision {
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());

        let entry = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            window,
            count: 0,
        });
        if entry.expired(now) {
            entry.started = now;
            entry.count = 0;
        }
        entry.window = window;

        let reset_in = window.saturating_sub(now.duration_since(entry.started));
        if entry.count >= max_requests {
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_in,
            };
        }

        entry.count += 1;
        RateLimitDecision {
            allowed: true,
            remaining: max_requests - entry.count,
            reset_in,
        }
    }

    /// Drop windows that have ended. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let before = windows.len();
        windows.retain(|_, w| !w.expired(now));
        before - windows.len()
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.windows.lock().map(|w| w.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check `route:ip` against `rule`, mapping a rejection to a 429 error.
    pub fn enforce(&self, route: &str, client_ip: &str, rule: &RateLimitRule) -> Result<RateLimitDecision, ApiError> {
        let key = format!("{}:{}", route, client_ip);
        let decision = self.check(&key, rule.max_requests, rule.window());

        if decision.allowed {
            Ok(decision)
        } else {
            tracing::warn!(route, client = %client_ip, reset_in = ?decision.reset_in, "Rate limit exceeded");
            metrics::record_rate_limited(route);
            Err(ApiError::RateLimited {
                retry_after_secs: decision.retry_after_secs(),
            })
        }
    }
}

/// Evict expired windows periodically until the task is aborted.
pub fn spawn_sweeper(limiter: Arc<RateLimiter>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = limiter.sweep();
            if removed > 0 {
                tracing::debug!(removed, "Evicted expired rate-limit windows");
            }
        }
    })
}
