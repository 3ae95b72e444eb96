//! # Store Contracts
//!
//! The two external stores the live layer talks to, and the adapters that
//! ship with the workspace.
//!
//! ## Adapters
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  trait DocumentStore                   trait KeyValueStore              │
//! │  ├── observe(collection) → feed        ├── get(key)                     │
//! │  ├── create / update / delete          └── set(key, value)              │
//! │  └── get_once(collection, filter)                                       │
//! │        │                                     │                          │
//! │        ├── tally_db::Database (SQLite)       ├── tally_db::Database     │
//! │        └── MemoryDocumentStore               └── MemoryKvStore          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Feeds deliver the full current contents of a collection: first on
//! subscription, then after every write. Dropping the receiver ends the
//! subscription.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use tally_core::{FieldFilter, Fields, Record};
use tally_db::Database;

use crate::error::{LiveError, LiveResult};

/// Stream of full collection listings.
pub type RecordFeed = tally_db::ChangeFeed;

// =============================================================================
// Traits
// =============================================================================

/// Remote document store with change notifications.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Subscribes to a collection.
    async fn observe(&self, collection: &str) -> LiveResult<RecordFeed>;

    /// Creates a document and returns its id.
    async fn create(&self, collection: &str, fields: Fields) -> LiveResult<String>;

    /// Merges `patch` into an existing document.
    async fn update(&self, collection: &str, id: &str, patch: Fields) -> LiveResult<()>;

    /// Deletes a document. Missing ids are not an error.
    async fn delete(&self, collection: &str, id: &str) -> LiveResult<()>;

    /// One-shot query for documents whose field equals a value.
    async fn get_once(&self, collection: &str, filter: &FieldFilter) -> LiveResult<Vec<Record>>;
}

/// Local string key-value persistence.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> LiveResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> LiveResult<()>;
}

// =============================================================================
// SQLite Adapter
// =============================================================================

#[async_trait]
impl DocumentStore for Database {
    async fn observe(&self, collection: &str) -> LiveResult<RecordFeed> {
        Ok(self.documents().watch(collection).await?)
    }

    async fn create(&self, collection: &str, fields: Fields) -> LiveResult<String> {
        Ok(self.documents().create(collection, &fields).await?)
    }

    async fn update(&self, collection: &str, id: &str, patch: Fields) -> LiveResult<()> {
        Ok(self.documents().update(collection, id, &patch).await?)
    }

    async fn delete(&self, collection: &str, id: &str) -> LiveResult<()> {
        self.documents().delete(collection, id).await?;
        Ok(())
    }

    async fn get_once(&self, collection: &str, filter: &FieldFilter) -> LiveResult<Vec<Record>> {
        Ok(self.documents().find(collection, filter).await?)
    }
}

#[async_trait]
impl KeyValueStore for Database {
    async fn get(&self, key: &str) -> LiveResult<Option<String>> {
        Ok(self.kv().get(key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> LiveResult<()> {
        Ok(self.kv().set(key, value).await?)
    }
}

// =============================================================================
// In-Memory Document Store
// =============================================================================

#[derive(Default)]
struct MemoryState {
    collections: HashMap<String, Vec<Record>>,
    watchers: HashMap<String, Vec<mpsc::UnboundedSender<Vec<Record>>>>,
    next_id: u64,
    fail_writes: bool,
}

impl MemoryState {
    fn publish(&mut self, collection: &str, records: Vec<Record>) {
        if let Some(senders) = self.watchers.get_mut(collection) {
            senders.retain(|tx| tx.send(records.clone()).is_ok());
        }
    }

    fn publish_current(&mut self, collection: &str) {
        let records = self.collections.get(collection).cloned().unwrap_or_default();
        self.publish(collection, records);
    }

    fn check_writable(&self, operation: &str) -> LiveResult<()> {
        if self.fail_writes {
            return Err(LiveError::Store(format!("{operation}: store unavailable")));
        }
        Ok(())
    }
}

/// Document store held entirely in memory.
///
/// Behaves like the SQLite adapter (creation order, merge on update, full
/// listings on every change) and can be told to reject writes.
#[derive(Default)]
pub struct MemoryDocumentStore {
    state: Mutex<MemoryState>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Makes every following write fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.state().fail_writes = fail;
    }

    /// Pushes an arbitrary payload to a collection's watchers without
    /// changing what is stored.
    pub fn broadcast(&self, collection: &str, records: Vec<Record>) {
        self.state().publish(collection, records);
    }

    /// Current contents of a collection.
    pub fn records(&self, collection: &str) -> Vec<Record> {
        self.state().collections.get(collection).cloned().unwrap_or_default()
    }

    /// Number of open feeds on a collection.
    pub fn watcher_count(&self, collection: &str) -> usize {
        self.state()
            .watchers
            .get(collection)
            .map_or(0, |senders| senders.iter().filter(|tx| !tx.is_closed()).count())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn observe(&self, collection: &str) -> LiveResult<RecordFeed> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state();
        let current = state.collections.get(collection).cloned().unwrap_or_default();
        let _ = tx.send(current);
        state.watchers.entry(collection.to_string()).or_default().push(tx);
        Ok(rx)
    }

    async fn create(&self, collection: &str, fields: Fields) -> LiveResult<String> {
        let mut state = self.state();
        state.check_writable("create")?;

        state.next_id += 1;
        let id = format!("mem-{:06}", state.next_id);
        state
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(Record::new(id.clone(), fields));
        state.publish_current(collection);

        debug!(collection, id = %id, "Memory document created");
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, patch: Fields) -> LiveResult<()> {
        let mut state = self.state();
        state.check_writable("update")?;

        let record = state
            .collections
            .get_mut(collection)
            .and_then(|records| records.iter_mut().find(|r| r.id == id))
            .ok_or_else(|| LiveError::not_found(collection, id))?;
        record.fields.extend(patch);
        state.publish_current(collection);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> LiveResult<()> {
        let mut state = self.state();
        state.check_writable("delete")?;

        let Some(records) = state.collections.get_mut(collection) else {
            return Ok(());
        };
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() != before {
            state.publish_current(collection);
        }
        Ok(())
    }

    async fn get_once(&self, collection: &str, filter: &FieldFilter) -> LiveResult<Vec<Record>> {
        Ok(self
            .state()
            .collections
            .get(collection)
            .map(|records| records.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default())
    }
}

// =============================================================================
// In-Memory Key-Value Store
// =============================================================================

#[derive(Default)]
struct KvState {
    entries: HashMap<String, String>,
    unavailable: bool,
}

/// Key-value store held in memory. Can simulate an unavailable backend.
#[derive(Default)]
pub struct MemoryKvStore {
    state: Mutex<KvState>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, KvState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Makes every call fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state().unavailable = unavailable;
    }

    /// Writes a raw value, bypassing the unavailable switch.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.state().entries.insert(key.to_string(), value.to_string());
    }
}

#[async_trait]
impl KeyValueStore for MemoryKvStore {
    async fn get(&self, key: &str) -> LiveResult<Option<String>> {
        let state = self.state();
        if state.unavailable {
            return Err(LiveError::Store("key-value store unavailable".into()));
        }
        Ok(state.entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> LiveResult<()> {
        let mut state = self.state();
        if state.unavailable {
            return Err(LiveError::Store("key-value store unavailable".into()));
        }
        state.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
