//! # Store Records
//!
//! The document store knows nothing about items or locations. It hands out
//! opaque field bags keyed by a document id; this module turns them into
//! domain types and back.
//!
//! ## Record Shapes
//! ```text
//! items/<id>                         locations/<id>
//! ┌──────────────────────────────┐   ┌──────────────────────────────┐
//! │ code:        "9f0c…" (req.)  │   │ name:       "Garage" (req.)  │
//! │ name:        string | null   │   │ created_at: RFC 3339 | absent│
//! │ location_id: string | null   │   └──────────────────────────────┘
//! │ quality:     int | absent    │
//! │ comment:     string | null   │
//! │ created_at:  RFC 3339|absent │
//! └──────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, CoreResult};
use crate::types::{Item, Location, Quality};
use crate::{ITEMS_COLLECTION, LOCATIONS_COLLECTION};

/// Field bag stored per document.
pub type Fields = Map<String, Value>;

// =============================================================================
// Record
// =============================================================================

/// One document as the store delivers it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub fields: Fields,
}

impl Record {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Record {
            id: id.into(),
            fields,
        }
    }

    /// Returns a field, treating JSON null the same as absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).filter(|v| !v.is_null())
    }
}

// =============================================================================
// Field Filter
// =============================================================================

/// Equality filter used by one-shot queries (`code == "…"`).
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

impl FieldFilter {
    /// Matches records whose `field` equals `value` exactly.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        FieldFilter {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Returns true if the record satisfies the filter.
    pub fn matches(&self, record: &Record) -> bool {
        record.fields.get(&self.field) == Some(&self.value)
    }
}

// =============================================================================
// Decoding
// =============================================================================

fn optional_string(record: &Record, collection: &str, key: &str) -> CoreResult<Option<String>> {
    match record.get(key) {
        None => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(CoreError::invalid_record(
            collection,
            &record.id,
            format!("{key} must be a string, got {other}"),
        )),
    }
}

fn timestamp(record: &Record, key: &str) -> Option<DateTime<Utc>> {
    record
        .get(key)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

impl TryFrom<&Record> for Item {
    type Error = CoreError;

    fn try_from(record: &Record) -> CoreResult<Self> {
        let code = optional_string(record, ITEMS_COLLECTION, "code")?.ok_or_else(|| {
            CoreError::invalid_record(ITEMS_COLLECTION, &record.id, "missing code")
        })?;

        Ok(Item {
            id: record.id.clone(),
            code,
            name: optional_string(record, ITEMS_COLLECTION, "name")?,
            location_id: optional_string(record, ITEMS_COLLECTION, "location_id")?,
            quality: Quality::from_json(record.get("quality")),
            comment: optional_string(record, ITEMS_COLLECTION, "comment")?,
            created_at: timestamp(record, "created_at"),
        })
    }
}

impl TryFrom<&Record> for Location {
    type Error = CoreError;

    fn try_from(record: &Record) -> CoreResult<Self> {
        let name = optional_string(record, LOCATIONS_COLLECTION, "name")?.ok_or_else(|| {
            CoreError::invalid_record(LOCATIONS_COLLECTION, &record.id, "missing name")
        })?;

        Ok(Location {
            id: record.id.clone(),
            name,
            created_at: timestamp(record, "created_at"),
        })
    }
}
