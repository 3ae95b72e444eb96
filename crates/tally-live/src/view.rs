//! # Inventory View
//!
//! What a front end binds to: the live mirror, the derived projections and
//! the aggregate cache, composed.
//!
//! ## Count Provenance
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  open()                                                                 │
//! │    │  cache.load()  ──▶  warm counts                                    │
//! │    │  LiveMirror::observe()                                             │
//! │    ▼                                                                    │
//! │  counts()  ──▶  Cached(warm)         until both collections arrived     │
//! │    │                                                                    │
//! │    │  first live snapshot                                               │
//! │    ▼                                                                    │
//! │  counts()  ──▶  Live(location_counts(snapshot))   from then on          │
//! │                                                                         │
//! │  persister task: every live snapshot whose counts changed ──▶ save()    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use tally_core::aggregate::{self, AggregateCounts, InventoryStats};
use tally_core::{search, GroupedResult, Item, Location, LocationLabel, Snapshot};

use crate::cache::AggregateCache;
use crate::error::{LiveError, LiveResult};
use crate::mirror::{LiveMirror, MirrorHandle, SnapshotFeed};
use crate::store::DocumentStore;

// =============================================================================
// Counts
// =============================================================================

/// Where a set of counts came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Loaded from the cache; may be stale.
    Cached,
    /// Computed from the current snapshot.
    Live,
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provenance::Cached => write!(f, "cached"),
            Provenance::Live => write!(f, "live"),
        }
    }
}

/// Per-location counts tagged with their provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationCounts {
    pub provenance: Provenance,
    pub counts: AggregateCounts,
}

impl LocationCounts {
    /// Count for one location. Unknown ids count zero.
    pub fn get(&self, location_id: &str) -> u64 {
        self.counts.get(location_id).copied().unwrap_or(0)
    }

    pub fn is_live(&self) -> bool {
        self.provenance == Provenance::Live
    }
}

// =============================================================================
// Inventory View
// =============================================================================

/// Live inventory with cached warm-start counts.
pub struct InventoryView {
    mirror: MirrorHandle,
    warm: AggregateCounts,
    persister: Option<JoinHandle<()>>,
}

impl InventoryView {
    /// Loads cached counts (if a cache is given) and starts mirroring.
    pub async fn open(
        store: Arc<dyn DocumentStore>,
        cache: Option<AggregateCache>,
    ) -> LiveResult<Self> {
        let warm = match &cache {
            Some(cache) => cache.load().await,
            None => AggregateCounts::new(),
        };

        let mirror = LiveMirror::observe(store).await?;

        let persister = cache.map(|cache| tokio::spawn(persist_counts(mirror.subscribe(), cache)));

        info!(
            cached_locations = warm.len(),
            caching = persister.is_some(),
            "Inventory view opened"
        );

        Ok(Self {
            mirror,
            warm,
            persister,
        })
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.mirror.snapshot()
    }

    /// Feed of snapshots, starting with the current one.
    pub fn subscribe(&self) -> SnapshotFeed {
        self.mirror.subscribe()
    }

    /// True once both collections have arrived.
    pub fn is_live(&self) -> bool {
        self.snapshot().is_live()
    }

    /// Waits until both collections have arrived.
    pub async fn wait_until_live(&self) -> LiveResult<Arc<Snapshot>> {
        self.subscribe().next_live().await.ok_or(LiveError::Released)
    }

    // =========================================================================
    // Projections
    // =========================================================================

    /// Per-location counts: cached until the first live snapshot, live after.
    pub fn counts(&self) -> LocationCounts {
        let snapshot = self.snapshot();
        if snapshot.is_live() {
            LocationCounts {
                provenance: Provenance::Live,
                counts: aggregate::location_counts(&snapshot),
            }
        } else {
            LocationCounts {
                provenance: Provenance::Cached,
                counts: self.warm.clone(),
            }
        }
    }

    /// Count for one location.
    pub fn count_for(&self, location_id: &str) -> u64 {
        self.counts().get(location_id)
    }

    /// Grouped search over names and comments. Blank terms give nothing.
    pub fn search(&self, term: &str) -> GroupedResult {
        search::search(&self.snapshot(), term)
    }

    pub fn stats(&self) -> InventoryStats {
        aggregate::stats(&self.snapshot())
    }

    /// Locations sorted by name.
    pub fn locations(&self) -> Vec<Location> {
        aggregate::locations_by_name(&self.snapshot())
            .into_iter()
            .cloned()
            .collect()
    }

    /// Location detail: the location and the items in it.
    pub fn location_detail(&self, location_id: &str) -> LiveResult<(Location, Vec<Item>)> {
        let snapshot = self.snapshot();
        let location = snapshot
            .location(location_id)
            .cloned()
            .ok_or_else(|| LiveError::not_found("location", location_id))?;
        let items = aggregate::items_in_location(&snapshot, location_id)
            .into_iter()
            .cloned()
            .collect();
        Ok((location, items))
    }

    /// Item by exact code, from the mirror.
    pub fn item_by_code(&self, code: &str) -> Option<Item> {
        self.snapshot().item_by_code(code).cloned()
    }

    /// Display label for an item's location.
    pub fn location_label(&self, item: &Item) -> LocationLabel {
        aggregate::location_label(&self.snapshot(), item.location_id.as_deref())
    }

    /// Stops mirroring and persisting. Safe to call more than once.
    pub fn close(&mut self) {
        self.mirror.release();
        if let Some(persister) = self.persister.take() {
            persister.abort();
        }
    }
}

impl Drop for InventoryView {
    fn drop(&mut self) {
        self.close();
    }
}

/// Saves counts for every live snapshot whose counts differ from the last
/// saved ones.
async fn persist_counts(mut feed: SnapshotFeed, cache: AggregateCache) {
    let mut last_saved: Option<AggregateCounts> = None;

    while let Some(snapshot) = feed.next().await {
        if !snapshot.is_live() {
            continue;
        }
        let counts = aggregate::location_counts(&snapshot);
        if last_saved.as_ref() == Some(&counts) {
            continue;
        }
        cache.save(&counts).await;
        last_saved = Some(counts);
    }

    debug!("Count persister stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{KeyValueStore, MemoryDocumentStore, MemoryKvStore};
    use crate::cache::DEFAULT_CACHE_KEY;
    use serde_json::json;
    use tally_core::{Assignment, Fields, Quality};

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_cached_counts_shown_until_live() {
        let store = Arc::new(MemoryDocumentStore::new());
        let kv = Arc::new(MemoryKvStore::new());
        kv.set(DEFAULT_CACHE_KEY, r#"{"r1": 3}"#).await.unwrap();

        let view = InventoryView::open(store, Some(AggregateCache::new(kv)))
            .await
            .unwrap();

        // nothing has been pumped yet
        let before = view.counts();
        assert_eq!(before.provenance, Provenance::Cached);
        assert_eq!(before.get("r1"), 3);

        view.wait_until_live().await.unwrap();
        let after = view.counts();
        assert_eq!(after.provenance, Provenance::Live);
        assert_eq!(after.get("r1"), 0);
        assert!(after.counts.is_empty());
    }

    #[tokio::test]
    async fn test_live_counts_follow_writes_and_are_persisted() {
        let store = Arc::new(MemoryDocumentStore::new());
        let kv = Arc::new(MemoryKvStore::new());
        let garage = store
            .create("locations", fields(json!({"name": "Garage"})))
            .await
            .unwrap();
        let item = store
            .create("items", fields(json!({"code": "c1"})))
            .await
            .unwrap();

        let view = InventoryView::open(store.clone(), Some(AggregateCache::new(kv.clone())))
            .await
            .unwrap();
        let mut feed = view.subscribe();
        feed.next_live().await.unwrap();
        assert_eq!(view.count_for(&garage), 0);

        let assignment = Assignment {
            location_id: Some(garage.clone()),
            ..Default::default()
        };
        store.update("items", &item, assignment.to_fields()).await.unwrap();
        feed.next().await.unwrap();
        assert_eq!(view.count_for(&garage), 1);

        settle().await;
        let reloaded = AggregateCache::new(kv).load().await;
        assert_eq!(reloaded.get(&garage), Some(&1));
    }

    #[tokio::test]
    async fn test_deleted_location_orphans_items() {
        let store = Arc::new(MemoryDocumentStore::new());
        let garage = store
            .create("locations", fields(json!({"name": "Garage"})))
            .await
            .unwrap();
        store
            .create("items", fields(json!({"code": "c1", "location_id": garage})))
            .await
            .unwrap();

        let view = InventoryView::open(store.clone(), None).await.unwrap();
        let mut feed = view.subscribe();
        feed.next_live().await.unwrap();
        assert_eq!(view.count_for(&garage), 1);

        store.delete("locations", &garage).await.unwrap();
        feed.next().await.unwrap();

        let item = view.item_by_code("c1").unwrap();
        assert_eq!(item.location_id.as_deref(), Some(garage.as_str()));
        assert_eq!(view.location_label(&item), LocationLabel::Unknown);
        assert!(view.counts().counts.is_empty());
        assert_eq!(view.stats().assigned, 1);
    }

    #[tokio::test]
    async fn test_search_and_detail() {
        let store = Arc::new(MemoryDocumentStore::new());
        let office = store
            .create("locations", fields(json!({"name": "Office"})))
            .await
            .unwrap();
        for (code, name, comment) in [
            ("c1", Some("Lamp"), None),
            ("c2", Some("lamp"), Some("desk")),
            ("c3", None, Some("desk drawer")),
        ] {
            store
                .create(
                    "items",
                    fields(json!({
                        "code": code,
                        "name": name,
                        "comment": comment,
                        "location_id": office,
                    })),
                )
                .await
                .unwrap();
        }

        let view = InventoryView::open(store, None).await.unwrap();
        view.wait_until_live().await.unwrap();

        assert!(view.search("   ").is_empty());
        let groups = view.search("DESK");
        assert_eq!(groups.keys(), vec!["lamp", "unnamed"]);
        assert_eq!(view.search("lamp").buckets[0].len(), 2);

        let (location, items) = view.location_detail(&office).unwrap();
        assert_eq!(location.name, "Office");
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].quality, Quality::default());
        assert!(matches!(
            view.location_detail("missing"),
            Err(LiveError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_close_ends_feeds() {
        let store = Arc::new(MemoryDocumentStore::new());
        let mut view = InventoryView::open(store, None).await.unwrap();
        view.wait_until_live().await.unwrap();

        let mut feed = view.subscribe();
        view.close();
        view.close();
        assert!(feed.next().await.is_some()); // buffered current snapshot
        assert!(feed.next().await.is_none());
        assert!(matches!(view.wait_until_live().await, Err(LiveError::Released)));
    }
}
