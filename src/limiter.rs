//! Core rate limiter implementation.

use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::clock;
use crate::decision::Decision;
use crate::error::{Result, TollgateError};
use crate::key::{self, KeyStrategy};
use crate::request::RequestDescriptor;
use crate::store::Store;
use crate::window::TimeWindow;

/// Predicate deciding whether a request bypasses rate limiting entirely.
pub type SkipFn = Arc<dyn Fn(&RequestDescriptor) -> bool + Send + Sync>;

/// Callback invoked when a request is rejected.
pub type RejectFn = Arc<dyn Fn(&RequestDescriptor, &Decision) + Send + Sync>;

/// A sliding-window rate limiter over a shared store.
///
/// Every hit is timestamped individually and the count is the number of
/// timestamps inside the trailing window, so there is no 2x burst at fixed
/// bucket boundaries. The limiter holds no per-key state of its own; all of
/// it lives in the [`Store`], which several limiters may share safely.
pub struct RateLimiter {
    scope: String,
    max: u64,
    window: TimeWindow,
    strategy: KeyStrategy,
    store: Arc<dyn Store>,
    skip: Option<SkipFn>,
    on_reject: Option<RejectFn>,
}

impl RateLimiter {
    /// Create a rate limiter.
    ///
    /// `scope` namespaces this limiter's keys inside the shared store.
    /// Invalid configuration is rejected here, loudly, rather than surfacing
    /// at request time.
    pub fn new(
        scope: impl Into<String>,
        max: u64,
        window: TimeWindow,
        strategy: KeyStrategy,
        store: Arc<dyn Store>,
    ) -> Result<Self> {
        let scope = scope.into();
        if scope.is_empty() {
            return Err(TollgateError::Config("scope must not be empty".to_string()));
        }
        if max == 0 {
            return Err(TollgateError::Config(format!(
                "max must be positive for scope '{}'",
                scope
            )));
        }

        Ok(Self {
            scope,
            max,
            window,
            strategy,
            store,
            skip: None,
            on_reject: None,
        })
    }

    /// Attach a skip predicate. Matching requests are allowed without
    /// touching the store.
    pub fn with_skip<F>(mut self, skip: F) -> Self
    where
        F: Fn(&RequestDescriptor) -> bool + Send + Sync + 'static,
    {
        self.skip = Some(Arc::new(skip));
        self
    }

    /// Attach a callback invoked whenever a request is rejected.
    ///
    /// The default behavior without one is for the caller to answer with 429
    /// and [`Decision::rejection_body`].
    pub fn with_reject_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&RequestDescriptor, &Decision) + Send + Sync + 'static,
    {
        self.on_reject = Some(Arc::new(handler));
        self
    }

    /// The scope namespace of this limiter.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Configured maximum requests per window.
    pub fn max(&self) -> u64 {
        self.max
    }

    /// Configured time window.
    pub fn window(&self) -> TimeWindow {
        self.window
    }

    /// Evaluate one request.
    ///
    /// Every evaluated, non-skipped request increments the store, including
    /// requests that end up rejected; retry storms therefore keep counting
    /// against the window instead of evading it. Store failures fail open:
    /// the limiter never turns a storage outage into an outage for the
    /// traffic it guards.
    pub async fn evaluate(&self, request: &RequestDescriptor) -> Decision {
        if let Some(skip) = &self.skip {
            if skip(request) {
                trace!(scope = %self.scope, "Skip predicate matched, bypassing");
                return self.bypass();
            }
        }

        let raw = match self.strategy.derive(request) {
            Some(raw) => raw,
            None => {
                // An unidentifiable client cannot be rate limited safely.
                warn!(
                    scope = %self.scope,
                    strategy = ?self.strategy,
                    "Request yields no rate-limit key, bypassing"
                );
                return self.bypass();
            }
        };

        let store_key = key::store_key(&self.scope, &raw);
        trace!(scope = %self.scope, key = %store_key, "Evaluating rate limit");

        let hit = match self.store.increment(&store_key, self.window).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(
                    scope = %self.scope,
                    error = %e,
                    "Store increment failed, allowing request"
                );
                return self.bypass();
            }
        };

        let decision = Decision::evaluated(self.max, hit.current, hit.reset_time_ms);
        if decision.exceeded {
            debug!(
                scope = %self.scope,
                key = %store_key,
                current = hit.current,
                limit = self.max,
                "Rate limit exceeded"
            );
            if let Some(handler) = &self.on_reject {
                handler(request, &decision);
            }
        }

        decision
    }

    /// Delete the window for the key this request maps to.
    ///
    /// Administrative operation, not part of the request hot path. A request
    /// that yields no key is a no-op.
    pub async fn reset(&self, request: &RequestDescriptor) -> Result<()> {
        let Some(raw) = self.strategy.derive(request) else {
            return Ok(());
        };
        self.store.reset(&key::store_key(&self.scope, &raw)).await
    }

    /// Delete every key in the backing store.
    pub async fn clear(&self) -> Result<()> {
        self.store.clear().await
    }

    fn bypass(&self) -> Decision {
        Decision::bypassed(self.max, clock::now_ms() + self.window.as_millis())
    }
}
