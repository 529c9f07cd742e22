//! Storage backends for rate limit hit tracking.

mod memory;
mod redis;

pub use self::redis::RedisStore;
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::error::Result;
use crate::window::TimeWindow;

/// Post-increment view of a single key's window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    /// Hits in the window after pruning, including the one just recorded.
    pub current: u64,
    /// When the window rolls over (epoch milliseconds).
    pub reset_time_ms: i64,
}

/// Contract shared by all storage backends.
///
/// The store exclusively owns all per-key hit data; limiters hold no state of
/// their own beyond configuration. Multiple limiters may share one store
/// because every operation is scoped by key.
#[async_trait]
pub trait Store: Send + Sync {
    /// Record one hit for `key` at now, prune hits strictly older than
    /// `now - window`, and return the post-prune, post-append count together
    /// with the window reset timestamp. Atomic per key: concurrent calls for
    /// the same key never lose updates.
    async fn increment(&self, key: &str, window: TimeWindow) -> Result<Hit>;

    /// Delete all hits for `key`. Idempotent.
    async fn reset(&self, key: &str) -> Result<()>;

    /// Delete every tracked key. Administrative/test use only.
    async fn clear(&self) -> Result<()>;
}
