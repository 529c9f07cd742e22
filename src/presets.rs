//! Preset factories for common call sites.
//!
//! Pure configuration wiring: each factory pairs a scope, a key strategy,
//! and a store so callers do not hand-assemble limiters. Every preset runs
//! the same sliding-window algorithm.

use std::sync::Arc;
use tracing::{info, warn};

use crate::error::Result;
use crate::key::KeyStrategy;
use crate::limiter::RateLimiter;
use crate::store::{MemoryStore, RedisStore, Store};
use crate::window::TimeWindow;

/// Global per-client cap keyed on the client address alone.
pub fn strict(max: u64, window: TimeWindow) -> Result<RateLimiter> {
    strict_with_store(max, window, Arc::new(MemoryStore::new()))
}

/// [`strict`] over a caller-provided store.
pub fn strict_with_store(
    max: u64,
    window: TimeWindow,
    store: Arc<dyn Store>,
) -> Result<RateLimiter> {
    RateLimiter::new("strict", max, window, KeyStrategy::ClientAddr, store)
}

/// Per-endpoint budgets: client address plus method and path.
pub fn api(max: u64, window: TimeWindow) -> Result<RateLimiter> {
    api_with_store(max, window, Arc::new(MemoryStore::new()))
}

/// [`api`] over a caller-provided store.
pub fn api_with_store(max: u64, window: TimeWindow, store: Arc<dyn Store>) -> Result<RateLimiter> {
    RateLimiter::new("api", max, window, KeyStrategy::Endpoint, store)
}

/// Credential-stuffing throttle: client address plus the lowercased
/// attempted username, so each target account gets its own budget.
pub fn auth(max: u64, window: TimeWindow) -> Result<RateLimiter> {
    auth_with_store(max, window, Arc::new(MemoryStore::new()))
}

/// [`auth`] over a caller-provided store.
pub fn auth_with_store(max: u64, window: TimeWindow, store: Arc<dyn Store>) -> Result<RateLimiter> {
    RateLimiter::new("auth", max, window, KeyStrategy::Credential, store)
}

/// Per-account fairness keyed on the authenticated user id, regardless of IP
/// churn. Unauthenticated requests are skipped entirely.
pub fn user(max: u64, window: TimeWindow) -> Result<RateLimiter> {
    user_with_store(max, window, Arc::new(MemoryStore::new()))
}

/// [`user`] over a caller-provided store.
pub fn user_with_store(max: u64, window: TimeWindow, store: Arc<dyn Store>) -> Result<RateLimiter> {
    Ok(
        RateLimiter::new("user", max, window, KeyStrategy::Principal, store)?
            .with_skip(|req| req.principal.is_none()),
    )
}

/// Limiter backed by a shared Redis store, for multi-instance deployments.
///
/// An unreachable backend at construction time falls back permanently to an
/// in-memory store for this limiter (fail-open at startup, not per request).
pub async fn distributed(
    url: &str,
    max: u64,
    window: TimeWindow,
    strategy: KeyStrategy,
) -> Result<RateLimiter> {
    let store: Arc<dyn Store> = match RedisStore::connect(url).await {
        Ok(store) => {
            info!(url = %url, "Connected distributed rate limit store");
            Arc::new(store)
        }
        Err(e) => {
            warn!(
                url = %url,
                error = %e,
                "Distributed store unreachable, falling back to in-memory"
            );
            Arc::new(MemoryStore::new())
        }
    };

    RateLimiter::new("distributed", max, window, strategy, store)
}
