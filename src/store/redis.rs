//! Redis-backed storage for multi-instance deployments.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::trace;
use uuid::Uuid;

use crate::clock;
use crate::error::Result;
use crate::window::TimeWindow;

use super::{Hit, Store};

const DEFAULT_PREFIX: &str = "tollgate";

/// Sorted-set-backed store shared across processes.
///
/// Each rate-limit key maps to one sorted set whose members are individual
/// hits scored by their millisecond timestamp. An increment prunes, appends,
/// counts, and refreshes the TTL in a single MULTI/EXEC pipeline, so
/// concurrent increments from different processes are linearized per key and
/// none are lost. Keys expire at twice the window size, so stale records
/// self-clean without a sweeper.
pub struct RedisStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisStore {
    /// Connect to the backend.
    ///
    /// Failure here is a construction-time error; callers that prefer
    /// availability over shared state answer it by falling back to a
    /// [`MemoryStore`](super::MemoryStore).
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;

        Ok(Self {
            conn,
            prefix: DEFAULT_PREFIX.to_string(),
        })
    }

    /// Override the key namespace. Useful when one Redis instance serves
    /// several applications.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn increment(&self, key: &str, window: TimeWindow) -> Result<Hit> {
        let now = clock::now_ms();
        let window_ms = window.as_millis();
        let cutoff = now - window_ms;
        let redis_key = self.namespaced(key);

        // A UUID suffix keeps same-millisecond hits distinct in the set.
        let member = format!("{}-{}", now, Uuid::new_v4());

        let mut conn = self.conn.clone();
        let (_pruned, _added, current, _expired): (u64, u64, u64, u64) = redis::pipe()
            .atomic()
            .cmd("ZREMRANGEBYSCORE")
            .arg(&redis_key)
            .arg("-inf")
            .arg(format!("({}", cutoff))
            .cmd("ZADD")
            .arg(&redis_key)
            .arg(now)
            .arg(&member)
            .cmd("ZCARD")
            .arg(&redis_key)
            .cmd("PEXPIRE")
            .arg(&redis_key)
            .arg(window_ms * 2)
            .query_async(&mut conn)
            .await?;

        trace!(key = %redis_key, current = current, "Incremented distributed counter");

        Ok(Hit {
            current,
            reset_time_ms: now + window_ms,
        })
    }

    async fn reset(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: u64 = redis::cmd("DEL")
            .arg(self.namespaced(key))
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        // Delete only our namespace; the instance may be shared.
        let mut conn = self.conn.clone();
        let keys: Vec<String> = redis::cmd("KEYS")
            .arg(format!("{}:*", self.prefix))
            .query_async(&mut conn)
            .await?;

        if !keys.is_empty() {
            let _: u64 = redis::cmd("DEL").arg(keys).query_async(&mut conn).await?;
        }
        Ok(())
    }
}
