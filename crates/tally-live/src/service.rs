//! # Inventory Service
//!
//! The write path: every change to the store goes through here.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  create_location(name) ── validate ──▶ store.create("locations")        │
//! │  delete_location(id)   ─────────────▶ store.delete("locations")         │
//! │                                        (items keep the stale id)        │
//! │  mint_batch(n)         ── mint ─────▶ store.create("items") × n         │
//! │  find_by_code(code)    ─────────────▶ store.get_once(code == ...)       │
//! │  assign_item(id, a)    ── validate ──▶ store.update("items", id)        │
//! │                                                                         │
//! │  Writes are never retried or queued. A failure is logged and returned   │
//! │  as LiveError::WriteFailed.                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use tally_core::validation::{
    validate_code, validate_comment, validate_item_name, validate_location_name,
    validate_location_ref,
};
use tally_core::{
    minter, Assignment, CoreError, FieldFilter, Item, Location, ITEMS_COLLECTION,
    LOCATIONS_COLLECTION,
};

use crate::error::{LiveError, LiveResult};
use crate::store::DocumentStore;

/// A code that has been written to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MintedItem {
    /// Document id.
    pub id: String,
    /// Printed code.
    pub code: String,
}

/// Write operations against the document store.
#[derive(Clone)]
pub struct InventoryService {
    store: Arc<dyn DocumentStore>,
}

impl InventoryService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    // =========================================================================
    // Locations
    // =========================================================================

    /// Creates a location and returns its id. The name is trimmed.
    pub async fn create_location(&self, name: &str) -> LiveResult<String> {
        let name = validate_location_name(name)?;

        let id = self
            .store
            .create(LOCATIONS_COLLECTION, Location::new_fields(&name, Utc::now()))
            .await
            .map_err(|e| write_failure("create location", e))?;

        info!(location_id = %id, name = %name, "Location created");
        Ok(id)
    }

    /// Deletes a location. Items pointing at it are left untouched.
    pub async fn delete_location(&self, location_id: &str) -> LiveResult<()> {
        self.store
            .delete(LOCATIONS_COLLECTION, location_id)
            .await
            .map_err(|e| write_failure("delete location", e))?;

        info!(location_id, "Location deleted");
        Ok(())
    }

    // =========================================================================
    // Items
    // =========================================================================

    /// Mints `count` fresh codes and persists one item per code.
    pub async fn mint_batch(&self, count: usize) -> LiveResult<Vec<MintedItem>> {
        let codes = minter::mint(count);
        self.persist_codes(&codes).await
    }

    /// Persists one item per code, in order.
    ///
    /// Stops at the first failure. Items written before it stay written.
    pub async fn persist_codes(&self, codes: &[String]) -> LiveResult<Vec<MintedItem>> {
        for code in codes {
            validate_code(code)?;
        }

        let now = Utc::now();
        let mut minted = Vec::with_capacity(codes.len());
        for code in codes {
            let id = self
                .store
                .create(ITEMS_COLLECTION, Item::new_fields(code, now))
                .await
                .map_err(|e| write_failure("persist code", e))?;
            minted.push(MintedItem {
                id,
                code: code.clone(),
            });
        }

        info!(count = minted.len(), "Codes persisted");
        Ok(minted)
    }

    /// Looks an item up by its exact code.
    pub async fn find_by_code(&self, code: &str) -> LiveResult<Option<Item>> {
        validate_code(code)?;

        let records = self
            .store
            .get_once(ITEMS_COLLECTION, &FieldFilter::eq("code", code))
            .await?;

        if records.len() > 1 {
            warn!(code, matches = records.len(), "Code is not unique, using the first match");
        }

        match records.first() {
            Some(record) => Ok(Some(Item::try_from(record)?)),
            None => {
                debug!(code, "No item with code");
                Ok(None)
            }
        }
    }

    /// Writes name, location, quality and comment of an item in one update.
    ///
    /// Blank text fields are stored as null. The location id is not checked
    /// against existing locations.
    pub async fn assign_item(&self, item_id: &str, assignment: &Assignment) -> LiveResult<()> {
        let assignment = normalize(assignment)?;

        self.store
            .update(ITEMS_COLLECTION, item_id, assignment.to_fields())
            .await
            .map_err(|e| write_failure("assign item", e))?;

        info!(
            item_id,
            location_id = ?assignment.location_id,
            quality = %assignment.quality,
            "Item assigned"
        );
        Ok(())
    }

    /// Finds an item by code and assigns it. Returns the item as written.
    pub async fn assign_by_code(&self, code: &str, assignment: &Assignment) -> LiveResult<Item> {
        let item = self
            .find_by_code(code)
            .await?
            .ok_or_else(|| CoreError::ItemNotFound(code.to_string()))?;

        let assignment = normalize(assignment)?;
        self.assign_item(&item.id, &assignment).await?;

        Ok(Item {
            name: assignment.name,
            location_id: assignment.location_id,
            quality: assignment.quality,
            comment: assignment.comment,
            ..item
        })
    }
}

fn normalize(assignment: &Assignment) -> LiveResult<Assignment> {
    Ok(Assignment {
        location_id: validate_location_ref(assignment.location_id.as_deref())?,
        name: validate_item_name(assignment.name.as_deref())?,
        quality: assignment.quality,
        comment: validate_comment(assignment.comment.as_deref())?,
    })
}

/// Logs a failed write and wraps it. Missing documents keep their own error.
fn write_failure(operation: &str, err: LiveError) -> LiveError {
    match err {
        LiveError::NotFound { .. } => err,
        other => {
            error!(operation, error = %other, "Write failed");
            LiveError::write_failed(operation, other)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDocumentStore;
    use serde_json::json;
    use tally_core::{Quality, ValidationError};

    fn service() -> (Arc<MemoryDocumentStore>, InventoryService) {
        let store = Arc::new(MemoryDocumentStore::new());
        (store.clone(), InventoryService::new(store))
    }

    #[tokio::test]
    async fn test_create_location_trims_and_validates() {
        let (store, service) = service();
        let id = service.create_location("  Garage ").await.unwrap();

        let records = store.records(LOCATIONS_COLLECTION);
        assert_eq!(records[0].id, id);
        assert_eq!(records[0].fields["name"], json!("Garage"));

        let err = service.create_location("   ").await.unwrap_err();
        assert!(matches!(
            err,
            LiveError::Validation(ValidationError::Required { .. })
        ));
        assert_eq!(store.records(LOCATIONS_COLLECTION).len(), 1);
    }

    #[tokio::test]
    async fn test_write_failure_is_surfaced() {
        let (store, service) = service();
        store.set_fail_writes(true);

        let err = service.create_location("Garage").await.unwrap_err();
        assert!(matches!(err, LiveError::WriteFailed { ref operation, .. } if operation == "create location"));
        assert!(err.is_retryable());

        let err = service.mint_batch(9).await.unwrap_err();
        assert!(matches!(err, LiveError::WriteFailed { .. }));
        assert!(store.records(ITEMS_COLLECTION).is_empty());
    }

    #[tokio::test]
    async fn test_mint_batch_persists_codes_in_order() {
        let (store, service) = service();
        let minted = service.mint_batch(9).await.unwrap();
        assert_eq!(minted.len(), 9);

        let stored: Vec<_> = store
            .records(ITEMS_COLLECTION)
            .into_iter()
            .map(|r| r.fields["code"].as_str().unwrap().to_string())
            .collect();
        let codes: Vec<_> = minted.iter().map(|m| m.code.clone()).collect();
        assert_eq!(stored, codes);

        // quality is left unset so readers fall back to the default
        let record = &store.records(ITEMS_COLLECTION)[0];
        assert!(record.get("quality").is_none());
    }

    #[tokio::test]
    async fn test_find_by_code_is_exact() {
        let (_, service) = service();
        service
            .persist_codes(&["ABC-1".to_string(), "ABC-10".to_string()])
            .await
            .unwrap();

        let item = service.find_by_code("ABC-1").await.unwrap().unwrap();
        assert_eq!(item.code, "ABC-1");
        assert!(service.find_by_code("abc-1").await.unwrap().is_none());
        assert!(service.find_by_code("ABC").await.unwrap().is_none());
        assert!(service.find_by_code("  ").await.is_err());
    }

    #[tokio::test]
    async fn test_assign_by_code_writes_everything_at_once() {
        let (store, service) = service();
        let location = service.create_location("Office").await.unwrap();
        let minted = service.mint_batch(1).await.unwrap();

        let item = service
            .assign_by_code(
                &minted[0].code,
                &Assignment {
                    location_id: Some(location.clone()),
                    name: Some(" Desk lamp ".into()),
                    quality: Quality::clamped(3),
                    comment: Some("   ".into()),
                },
            )
            .await
            .unwrap();

        assert_eq!(item.name.as_deref(), Some("Desk lamp"));
        assert_eq!(item.comment, None);

        let record = &store.records(ITEMS_COLLECTION)[0];
        assert_eq!(record.fields["location_id"], json!(location));
        assert_eq!(record.fields["quality"], json!(3));
        assert_eq!(record.fields["comment"], serde_json::Value::Null);
        assert_eq!(record.fields["code"], json!(minted[0].code));
    }

    #[tokio::test]
    async fn test_assign_unknown_code() {
        let (_, service) = service();
        let err = service
            .assign_by_code("nope", &Assignment::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LiveError::Core(CoreError::ItemNotFound(_))));

        let err = service
            .assign_item("missing-id", &Assignment::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LiveError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_location_does_not_cascade() {
        let (store, service) = service();
        let location = service.create_location("Attic").await.unwrap();
        let minted = service.mint_batch(1).await.unwrap();
        service
            .assign_item(
                &minted[0].id,
                &Assignment {
                    location_id: Some(location.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        service.delete_location(&location).await.unwrap();
        service.delete_location(&location).await.unwrap();

        assert!(store.records(LOCATIONS_COLLECTION).is_empty());
        let record = &store.records(ITEMS_COLLECTION)[0];
        assert_eq!(record.fields["location_id"], json!(location));
    }
}
