//! # Aggregate Cache
//!
//! Remembers the last computed per-location counts so a freshly started view
//! has numbers to show before the mirror catches up.
//!
//! The cache is advisory. Reads never fail (missing, unreadable or corrupt
//! data all read as empty) and writes never report failure to the caller.
//!
//! ## Stored Shape
//! ```text
//! key:   "tally.location_counts"           (configurable)
//! value: {"loc-1": 3, "loc-2": 0, ...}     (JSON object, id → count)
//! ```
//! Entries whose value is not a non-negative integer are dropped on load.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use tally_core::AggregateCounts;

use crate::store::KeyValueStore;

/// Default key the counts are stored under.
pub const DEFAULT_CACHE_KEY: &str = "tally.location_counts";

/// Best-effort persistence for [`AggregateCounts`].
#[derive(Clone)]
pub struct AggregateCache {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl AggregateCache {
    /// Creates a cache under [`DEFAULT_CACHE_KEY`].
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(store, DEFAULT_CACHE_KEY)
    }

    /// Creates a cache under a custom key.
    pub fn with_key(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Reads the persisted counts.
    pub async fn load(&self) -> AggregateCounts {
        let raw = match self.store.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %self.key, "No cached counts");
                return AggregateCounts::new();
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Cached counts unavailable");
                return AggregateCounts::new();
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(entries)) => {
                let counts: AggregateCounts = entries
                    .into_iter()
                    .filter_map(|(id, value)| value.as_u64().map(|count| (id, count)))
                    .collect();
                debug!(key = %self.key, locations = counts.len(), "Cached counts loaded");
                counts
            }
            Ok(_) => {
                warn!(key = %self.key, "Cached counts are not an object, ignoring");
                AggregateCounts::new()
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Cached counts are corrupt, ignoring");
                AggregateCounts::new()
            }
        }
    }

    /// Persists counts, replacing whatever was stored.
    pub async fn save(&self, counts: &AggregateCounts) {
        let encoded = match serde_json::to_string(counts) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(error = %e, "Failed to encode counts");
                return;
            }
        };

        match self.store.set(&self.key, &encoded).await {
            Ok(()) => debug!(key = %self.key, locations = counts.len(), "Counts cached"),
            Err(e) => warn!(key = %self.key, error = %e, "Failed to cache counts"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryKvStore;

    fn cache() -> (Arc<MemoryKvStore>, AggregateCache) {
        let kv = Arc::new(MemoryKvStore::new());
        (kv.clone(), AggregateCache::new(kv))
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let (_, cache) = cache();
        let counts = AggregateCounts::from([("r1".to_string(), 3), ("r2".to_string(), 0)]);
        cache.save(&counts).await;
        assert_eq!(cache.load().await, counts);
    }

    #[tokio::test]
    async fn test_missing_is_empty() {
        let (_, cache) = cache();
        assert!(cache.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_is_empty() {
        let (kv, cache) = cache();
        kv.insert_raw(DEFAULT_CACHE_KEY, "{not json");
        assert!(cache.load().await.is_empty());

        kv.insert_raw(DEFAULT_CACHE_KEY, "[1, 2]");
        assert!(cache.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_non_integer_entries_ignored() {
        let (kv, cache) = cache();
        kv.insert_raw(
            DEFAULT_CACHE_KEY,
            r#"{"a": 2, "b": "3", "c": -1, "d": 1.5, "e": null}"#,
        );
        let counts = cache.load().await;
        assert_eq!(counts, AggregateCounts::from([("a".to_string(), 2)]));
    }

    #[tokio::test]
    async fn test_unavailable_store_is_swallowed() {
        let (kv, cache) = cache();
        kv.set_unavailable(true);
        cache
            .save(&AggregateCounts::from([("r1".to_string(), 1)]))
            .await;
        assert!(cache.load().await.is_empty());

        kv.set_unavailable(false);
        assert!(cache.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_custom_key() {
        let kv = Arc::new(MemoryKvStore::new());
        let a = AggregateCache::with_key(kv.clone(), "a");
        let b = AggregateCache::with_key(kv, "b");
        a.save(&AggregateCounts::from([("r".to_string(), 7)])).await;
        assert!(b.load().await.is_empty());
        assert_eq!(a.key(), "a");
    }
}
