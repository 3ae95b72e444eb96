//! # Document Repository
//!
//! Schemaless JSON documents grouped by collection, with whole-collection
//! change feeds.
//!
//! ## Change Feed Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  watch("items")                                                         │
//! │     │  register sender + send current listing  (under registry lock)    │
//! │     ▼                                                                   │
//! │  feed: [r1, r2]                                                         │
//! │                                                                         │
//! │  create("items", {...})                                                 │
//! │     │  INSERT                                                           │
//! │     │  re-list "items" and push to every live sender (under lock)       │
//! │     ▼                                                                   │
//! │  feed: [r1, r2, r3]                                                     │
//! │                                                                         │
//! │  Payloads are full listings, never deltas. Receivers that were          │
//! │  dropped are pruned on the next push.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use sqlx::SqlitePool;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};
use uuid::Uuid;

use tally_core::{FieldFilter, Fields, Record};

use crate::error::{DbError, DbResult};

/// Receiving end of a change feed. Each message is a full listing.
pub type ChangeFeed = mpsc::UnboundedReceiver<Vec<Record>>;

/// Senders per collection, shared by every clone of a `Database`.
pub type WatcherRegistry = Arc<Mutex<HashMap<String, Vec<mpsc::UnboundedSender<Vec<Record>>>>>>;

#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    id: String,
    fields: String,
}

impl DocumentRow {
    fn into_record(self) -> DbResult<Record> {
        match serde_json::from_str::<Value>(&self.fields) {
            Ok(Value::Object(fields)) => Ok(Record::new(self.id, fields)),
            Ok(_) => Err(DbError::corrupt(self.id, "not a JSON object")),
            Err(e) => Err(DbError::corrupt(self.id, e.to_string())),
        }
    }
}

fn encode(fields: &Fields) -> DbResult<String> {
    Ok(serde_json::to_string(fields)?)
}

/// Repository for document operations.
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    pool: SqlitePool,
    watchers: WatcherRegistry,
}

impl DocumentRepository {
    /// Creates a new repository. Obtain one through `Database::documents()`.
    pub fn new(pool: SqlitePool, watchers: WatcherRegistry) -> Self {
        Self { pool, watchers }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Inserts a document and returns its generated id.
    pub async fn create(&self, collection: &str, fields: &Fields) -> DbResult<String> {
        let id = Uuid::new_v4().to_string();

        sqlx::query("INSERT INTO documents (collection, id, fields) VALUES (?, ?, ?)")
            .bind(collection)
            .bind(&id)
            .bind(encode(fields)?)
            .execute(&self.pool)
            .await?;

        debug!(collection, id = %id, "Document created");
        self.notify(collection).await;
        Ok(id)
    }

    /// Merges `patch` into an existing document.
    ///
    /// Keys present in `patch` overwrite, including explicit nulls; keys not
    /// present are left alone.
    pub async fn update(&self, collection: &str, id: &str, patch: &Fields) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, fields FROM documents WHERE collection = ? AND id = ?",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found(collection, id))?;

        let mut record = row.into_record()?;
        for (key, value) in patch {
            record.fields.insert(key.clone(), value.clone());
        }

        sqlx::query(
            "UPDATE documents
             SET fields = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
             WHERE collection = ? AND id = ?",
        )
        .bind(encode(&record.fields)?)
        .bind(collection)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(collection, id, keys = patch.len(), "Document updated");
        self.notify(collection).await;
        Ok(())
    }

    /// Deletes a document. Deleting a missing id is not an error.
    ///
    /// ## Returns
    /// `true` if a document was removed.
    pub async fn delete(&self, collection: &str, id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected() > 0;
        if removed {
            debug!(collection, id, "Document deleted");
            self.notify(collection).await;
        } else {
            debug!(collection, id, "Delete of missing document ignored");
        }
        Ok(removed)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Fetches one document.
    pub async fn get(&self, collection: &str, id: &str) -> DbResult<Option<Record>> {
        sqlx::query_as::<_, DocumentRow>(
            "SELECT id, fields FROM documents WHERE collection = ? AND id = ?",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(DocumentRow::into_record)
        .transpose()
    }

    /// Every document in a collection, in creation order.
    ///
    /// Corrupt documents are skipped with a warning so one bad row cannot
    /// hide the rest of the collection.
    pub async fn list(&self, collection: &str) -> DbResult<Vec<Record>> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, fields FROM documents WHERE collection = ? ORDER BY seq",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        Ok(decode_rows(rows))
    }

    /// Documents whose field equals the filter value exactly.
    pub async fn find(&self, collection: &str, filter: &FieldFilter) -> DbResult<Vec<Record>> {
        let records = match &filter.value {
            Value::String(wanted) => {
                let rows = sqlx::query_as::<_, DocumentRow>(
                    "SELECT id, fields FROM documents
                     WHERE collection = ? AND json_extract(fields, ?) = ?
                     ORDER BY seq",
                )
                .bind(collection)
                .bind(format!("$.{}", filter.field))
                .bind(wanted)
                .fetch_all(&self.pool)
                .await?;
                decode_rows(rows)
            }
            _ => self.list(collection).await?,
        };

        Ok(records.into_iter().filter(|r| filter.matches(r)).collect())
    }

    /// Number of documents in a collection.
    pub async fn count(&self, collection: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = ?")
            .bind(collection)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // =========================================================================
    // Change Feeds
    // =========================================================================

    /// Subscribes to a collection.
    ///
    /// The first message is the current listing; every later write to the
    /// collection (through any clone of the database) sends a fresh one.
    /// Dropping the receiver unsubscribes.
    pub async fn watch(&self, collection: &str) -> DbResult<ChangeFeed> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watchers = self.watchers.lock().await;
        let current = self.list(collection).await?;
        // Receiver is alive in this scope, so the send cannot fail
        let _ = tx.send(current);
        watchers.entry(collection.to_string()).or_default().push(tx);

        debug!(collection, "Change feed opened");
        Ok(rx)
    }

    /// Number of open feeds on a collection.
    pub async fn watcher_count(&self, collection: &str) -> usize {
        self.watchers
            .lock()
            .await
            .get(collection)
            .map_or(0, |senders| senders.iter().filter(|tx| !tx.is_closed()).count())
    }

    async fn notify(&self, collection: &str) {
        let mut watchers = self.watchers.lock().await;
        let Some(senders) = watchers.get_mut(collection) else {
            return;
        };

        senders.retain(|tx| !tx.is_closed());
        if senders.is_empty() {
            watchers.remove(collection);
            return;
        }

        match self.list(collection).await {
            Ok(records) => {
                senders.retain(|tx| tx.send(records.clone()).is_ok());
                debug!(collection, watchers = senders.len(), "Change feed notified");
            }
            Err(e) => warn!(collection, error = %e, "Failed to re-list collection for watchers"),
        }
    }
}

fn decode_rows(rows: Vec<DocumentRow>) -> Vec<Record> {
    rows.into_iter()
        .filter_map(|row| match row.into_record() {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "Skipping corrupt document");
                None
            }
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};
    use serde_json::json;
    use tally_core::{FieldFilter, Fields};

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_get_list_in_order() {
        let db = db().await;
        let docs = db.documents();

        let a = docs.create("locations", &fields(json!({"name": "A"}))).await.unwrap();
        let b = docs.create("locations", &fields(json!({"name": "B"}))).await.unwrap();
        docs.create("items", &fields(json!({"code": "x"}))).await.unwrap();

        let listed: Vec<_> = docs
            .list("locations")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(listed, vec![a.clone(), b]);

        let got = docs.get("locations", &a).await.unwrap().unwrap();
        assert_eq!(got.fields["name"], json!("A"));
        assert!(docs.get("items", &a).await.unwrap().is_none());
        assert_eq!(docs.count("items").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_merges_and_writes_nulls() {
        let db = db().await;
        let docs = db.documents();
        let id = docs
            .create("items", &fields(json!({"code": "c1", "name": "Old", "comment": "keep"})))
            .await
            .unwrap();

        docs.update("items", &id, &fields(json!({"name": null, "quality": 3})))
            .await
            .unwrap();

        let record = docs.get("items", &id).await.unwrap().unwrap();
        assert_eq!(record.fields["code"], json!("c1"));
        assert_eq!(record.fields["name"], serde_json::Value::Null);
        assert_eq!(record.fields["quality"], json!(3));
        assert_eq!(record.fields["comment"], json!("keep"));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let db = db().await;
        let err = db
            .documents()
            .update("items", "nope", &Fields::new())
            .await
            .unwrap_err();
        assert!(matches!(err, crate::DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let db = db().await;
        let docs = db.documents();
        let id = docs.create("locations", &fields(json!({"name": "A"}))).await.unwrap();
        assert!(docs.delete("locations", &id).await.unwrap());
        assert!(!docs.delete("locations", &id).await.unwrap());
    }

    #[tokio::test]
    async fn test_find_exact_code() {
        let db = db().await;
        let docs = db.documents();
        docs.create("items", &fields(json!({"code": "ABC-1"}))).await.unwrap();
        docs.create("items", &fields(json!({"code": "abc-1"}))).await.unwrap();
        docs.create("items", &fields(json!({"code": "ABC-10"}))).await.unwrap();

        let hits = docs.find("items", &FieldFilter::eq("code", "ABC-1")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].fields["code"], json!("ABC-1"));

        let by_number = docs.find("items", &FieldFilter::eq("quality", 3)).await.unwrap();
        assert!(by_number.is_empty());
    }

    #[tokio::test]
    async fn test_watch_sends_initial_then_full_listings() {
        let db = db().await;
        let docs = db.documents();
        docs.create("locations", &fields(json!({"name": "A"}))).await.unwrap();

        let mut feed = docs.watch("locations").await.unwrap();
        assert_eq!(feed.recv().await.unwrap().len(), 1);

        // writes through another clone reach the same feed
        let other = db.clone();
        other
            .documents()
            .create("locations", &fields(json!({"name": "B"})))
            .await
            .unwrap();
        assert_eq!(feed.recv().await.unwrap().len(), 2);

        // other collections don't notify this feed
        docs.create("items", &fields(json!({"code": "c"}))).await.unwrap();
        assert!(feed.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dropped_feeds_are_pruned() {
        let db = db().await;
        let docs = db.documents();
        let feed = docs.watch("items").await.unwrap();
        assert_eq!(docs.watcher_count("items").await, 1);
        drop(feed);

        docs.create("items", &fields(json!({"code": "c"}))).await.unwrap();
        assert_eq!(docs.watcher_count("items").await, 0);
    }
}
