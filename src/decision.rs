//! Rate limit decisions and response augmentation.

use serde_json::{json, Value};

use crate::clock;

/// Default informational header names.
pub const HEADER_LIMIT: &str = "X-RateLimit-Limit";
pub const HEADER_REMAINING: &str = "X-RateLimit-Remaining";
pub const HEADER_RESET: &str = "X-RateLimit-Reset";

/// The outcome of evaluating one request against a rate limiter.
///
/// Derived per request, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Configured maximum requests per window.
    pub limit: u64,
    /// Hits counted in the current window, including this request.
    pub current: u64,
    /// Requests left before the limit is reached.
    pub remaining: u64,
    /// Whether this request pushed the count past the limit.
    pub exceeded: bool,
    /// When the current window rolls over (epoch milliseconds).
    pub reset_time_ms: i64,
    /// Whether evaluation was bypassed (skip predicate or unidentifiable client).
    pub skipped: bool,
}

impl Decision {
    /// Decision for a counted request.
    ///
    /// The boundary is inclusive of the limit: the `limit`-th request in a
    /// window is allowed, the one after it is not.
    pub(crate) fn evaluated(limit: u64, current: u64, reset_time_ms: i64) -> Self {
        Self {
            limit,
            current,
            remaining: limit.saturating_sub(current),
            exceeded: current > limit,
            reset_time_ms,
            skipped: false,
        }
    }

    /// Decision for a bypassed request. No store mutation happened.
    pub(crate) fn bypassed(limit: u64, reset_time_ms: i64) -> Self {
        Self {
            limit,
            current: 0,
            remaining: limit,
            exceeded: false,
            reset_time_ms,
            skipped: true,
        }
    }

    /// Whether the request should proceed.
    pub fn allowed(&self) -> bool {
        !self.exceeded
    }

    /// Seconds until the window resets, rounded up. Floored at zero.
    pub fn retry_after_secs_at(&self, now_ms: i64) -> u64 {
        let delta = self.reset_time_ms.saturating_sub(now_ms);
        if delta <= 0 {
            0
        } else {
            ((delta + 999) / 1000) as u64
        }
    }

    /// Seconds until the window resets, measured from the current clock.
    pub fn retry_after_secs(&self) -> u64 {
        self.retry_after_secs_at(clock::now_ms())
    }

    /// Informational headers the caller should attach to the response.
    ///
    /// Reset is reported as a Unix timestamp in seconds.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        vec![
            (HEADER_LIMIT, self.limit.to_string()),
            (HEADER_REMAINING, self.remaining.to_string()),
            (HEADER_RESET, (self.reset_time_ms / 1000).to_string()),
        ]
    }

    /// JSON body for the default 429 rejection response.
    pub fn rejection_body(&self) -> Value {
        json!({
            "error": "Too Many Requests",
            "message": "Rate limit exceeded, retry later",
            "retryAfter": self.retry_after_secs(),
        })
    }
}
