//! In-memory storage backend.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::clock;
use crate::error::Result;
use crate::window::TimeWindow;

use super::{Hit, Store};

/// Hit log for one key.
#[derive(Debug, Default)]
struct Record {
    /// Millisecond timestamps of counted requests, oldest first.
    hits: Vec<i64>,
    /// When the current window rolls over.
    reset_time_ms: i64,
}

/// Map-backed store for single-instance deployments.
///
/// Per-key atomicity comes from the map's entry locking: an increment holds
/// the entry guard for the whole prune-and-append, so concurrent increments
/// for one key serialize and none are dropped. State is not shared across
/// processes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: DashMap<String, Record>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently tracked.
    pub fn key_count(&self) -> usize {
        self.records.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn increment(&self, key: &str, window: TimeWindow) -> Result<Hit> {
        let now = clock::now_ms();
        let cutoff = now - window.as_millis();

        let mut record = self.records.entry(key.to_string()).or_default();
        record.hits.retain(|&ts| ts >= cutoff);
        record.hits.push(now);
        record.reset_time_ms = now + window.as_millis();

        Ok(Hit {
            current: record.hits.len() as u64,
            reset_time_ms: record.reset_time_ms,
        })
    }

    async fn reset(&self, key: &str) -> Result<()> {
        self.records.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.records.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_increment_counts_hits() {
        let store = MemoryStore::new();

        let first = store.increment("k", TimeWindow::Minute).await.unwrap();
        assert_eq!(first.current, 1);

        let second = store.increment("k", TimeWindow::Minute).await.unwrap();
        assert_eq!(second.current, 2);
    }

    #[tokio::test]
    async fn test_increment_reset_time_is_in_the_future() {
        let store = MemoryStore::new();
        let before = clock::now_ms();

        let hit = store.increment("k", TimeWindow::Minute).await.unwrap();
        assert!(hit.reset_time_ms >= before + TimeWindow::Minute.as_millis());
    }

    #[tokio::test]
    async fn test_keys_are_isolated() {
        let store = MemoryStore::new();

        store.increment("a", TimeWindow::Minute).await.unwrap();
        store.increment("a", TimeWindow::Minute).await.unwrap();
        let other = store.increment("b", TimeWindow::Minute).await.unwrap();

        assert_eq!(other.current, 1);
        assert_eq!(store.key_count(), 2);
    }

    #[tokio::test]
    async fn test_old_hits_are_pruned() {
        let store = MemoryStore::new();

        store.increment("k", TimeWindow::Second).await.unwrap();
        store.increment("k", TimeWindow::Second).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1100)).await;

        // Previous hits fell out of the window.
        let hit = store.increment("k", TimeWindow::Second).await.unwrap();
        assert_eq!(hit.current, 1);
    }

    #[tokio::test]
    async fn test_reset_deletes_key() {
        let store = MemoryStore::new();

        store.increment("k", TimeWindow::Minute).await.unwrap();
        store.reset("k").await.unwrap();

        let hit = store.increment("k", TimeWindow::Minute).await.unwrap();
        assert_eq!(hit.current, 1);
    }

    #[tokio::test]
    async fn test_reset_is_idempotent() {
        let store = MemoryStore::new();
        store.reset("missing").await.unwrap();
        store.reset("missing").await.unwrap();
    }

    #[tokio::test]
    async fn test_clear_removes_all_keys() {
        let store = MemoryStore::new();

        store.increment("a", TimeWindow::Minute).await.unwrap();
        store.increment("b", TimeWindow::Minute).await.unwrap();
        assert_eq!(store.key_count(), 2);

        store.clear().await.unwrap();
        assert_eq!(store.key_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_increments_lose_nothing() {
        use std::sync::Arc;

        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();

        for _ in 0..20 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.increment("shared", TimeWindow::Minute).await.unwrap()
            }));
        }

        let mut max_seen = 0;
        for handle in handles {
            max_seen = max_seen.max(handle.await.unwrap().current);
        }
        assert_eq!(max_seen, 20);
    }
}
