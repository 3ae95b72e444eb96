//! # Domain Types
//!
//! Core domain types used throughout Tally.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Item       │   │    Location     │   │    Snapshot     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (store)     │   │  id (store)     │   │  revision       │       │
//! │  │  code (minted)  │──▶│  name           │   │  items[]        │       │
//! │  │  name?          │   │  created_at?    │   │  locations[]    │       │
//! │  │  location_id?   │   └─────────────────┘   │  *_loaded flags │       │
//! │  │  quality 1..=5  │                         └─────────────────┘       │
//! │  │  comment?       │   ┌─────────────────┐   ┌─────────────────┐       │
//! │  └─────────────────┘   │    Quality      │   │  LocationLabel  │       │
//! │                        │  u8, default 5  │   │  Unassigned     │       │
//! │                        │  clamped on read│   │  Unknown        │       │
//! │                        └─────────────────┘   │  Named(name)    │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every item has:
//! - `id`: assigned by the document store, used for updates
//! - `code`: minted client-side, printed on the label, used for lookups
//!
//! The code never changes once minted. Lookups by code are exact-match.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use ts_rs::TS;

use crate::record::{Fields, Record};
use crate::{DEFAULT_QUALITY, ITEMS_COLLECTION, LOCATIONS_COLLECTION, MAX_QUALITY, MIN_QUALITY};

// =============================================================================
// Quality
// =============================================================================

/// Condition rating of an item, always within `1..=5`.
///
/// ## Read vs Write
/// ```text
/// Reading a record:   absent/null → 5,  7 → 5,  0 → 1   (never fails)
/// Writing an update:  validation::validate_quality rejects out-of-range
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct Quality(u8);

impl Quality {
    /// Builds a quality from any stored integer, clamping into range.
    pub fn clamped(value: i64) -> Self {
        Quality(value.clamp(MIN_QUALITY as i64, MAX_QUALITY as i64) as u8)
    }

    /// Builds a quality only if the value is already in range.
    pub fn new(value: u8) -> Option<Self> {
        (MIN_QUALITY..=MAX_QUALITY).contains(&value).then_some(Quality(value))
    }

    /// Reads a quality out of a raw JSON value.
    ///
    /// Absent, null and non-numeric values fall back to the default.
    pub fn from_json(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Number(n)) => match n.as_i64() {
                Some(i) => Quality::clamped(i),
                None => n
                    .as_f64()
                    .map(|f| Quality::clamped(f.round() as i64))
                    .unwrap_or_default(),
            },
            _ => Quality::default(),
        }
    }

    /// Returns the rating as an integer.
    #[inline]
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Human-readable label for the rating.
    pub fn label(&self) -> &'static str {
        match self.0 {
            1 => "Poor",
            2 => "Fair",
            3 => "Acceptable",
            4 => "Good",
            _ => "Excellent",
        }
    }

    /// Coarse tier used for colouring.
    pub fn tier(&self) -> QualityTier {
        match self.0 {
            4..=5 => QualityTier::Good,
            3 => QualityTier::Fair,
            _ => QualityTier::Poor,
        }
    }
}

impl Default for Quality {
    fn default() -> Self {
        Quality(DEFAULT_QUALITY)
    }
}

impl From<i64> for Quality {
    fn from(value: i64) -> Self {
        Quality::clamped(value)
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.0, MAX_QUALITY)
    }
}

/// Three-level grouping of quality ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    /// Ratings 4 and 5.
    Good,
    /// Rating 3.
    Fair,
    /// Ratings 1 and 2.
    Poor,
}

// =============================================================================
// Collection
// =============================================================================

/// The two collections the inventory is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Items,
    Locations,
}

impl Collection {
    /// Both collections, items first.
    pub const ALL: [Collection; 2] = [Collection::Items, Collection::Locations];

    /// Name of the collection in the document store.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Items => ITEMS_COLLECTION,
            Collection::Locations => LOCATIONS_COLLECTION,
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Item
// =============================================================================

/// A physical thing carrying a printed code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Item {
    /// Document id assigned by the store.
    pub id: String,

    /// Minted code printed on the label. Immutable.
    pub code: String,

    /// What the item is, once someone has named it.
    pub name: Option<String>,

    /// Location the item sits in. `None` means unassigned.
    ///
    /// May point at a location that no longer exists: deleting a location
    /// leaves this id in place.
    pub location_id: Option<String>,

    /// Condition rating.
    #[ts(type = "number")]
    pub quality: Quality,

    /// Free-form note.
    pub comment: Option<String>,

    /// When the code was first persisted.
    #[ts(as = "Option<String>")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Item {
    /// Fields written when a freshly minted code is first persisted.
    ///
    /// Quality is left out on purpose so readers fall back to the default.
    pub fn new_fields(code: &str, now: DateTime<Utc>) -> Fields {
        let mut fields = Fields::new();
        fields.insert("code".into(), Value::String(code.to_string()));
        fields.insert("name".into(), Value::Null);
        fields.insert("location_id".into(), Value::Null);
        fields.insert("comment".into(), Value::Null);
        fields.insert("created_at".into(), Value::String(now.to_rfc3339()));
        fields
    }

    /// Returns true if the item has been given a location.
    #[inline]
    pub fn is_assigned(&self) -> bool {
        self.location_id.is_some()
    }

    /// Returns true if the item has been named.
    #[inline]
    pub fn is_named(&self) -> bool {
        self.name.is_some()
    }
}

/// The single edit operation items support: everything at once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub location_id: Option<String>,
    pub name: Option<String>,
    pub quality: Quality,
    pub comment: Option<String>,
}

impl Assignment {
    /// Partial field set sent to the store. Every assignable field is
    /// written, absent values as null.
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("location_id".into(), opt_value(&self.location_id));
        fields.insert("name".into(), opt_value(&self.name));
        fields.insert("quality".into(), Value::from(self.quality.value()));
        fields.insert("comment".into(), opt_value(&self.comment));
        fields
    }
}

fn opt_value(value: &Option<String>) -> Value {
    value.clone().map(Value::String).unwrap_or(Value::Null)
}

// =============================================================================
// Location
// =============================================================================

/// A named place items can be assigned to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Location {
    pub id: String,
    pub name: String,
    #[ts(as = "Option<String>")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Location {
    /// Fields written when a location is created.
    pub fn new_fields(name: &str, now: DateTime<Utc>) -> Fields {
        let mut fields = Fields::new();
        fields.insert("name".into(), Value::String(name.to_string()));
        fields.insert("created_at".into(), Value::String(now.to_rfc3339()));
        fields
    }
}

/// What to show where an item's location would go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationLabel {
    /// The item has no location id.
    Unassigned,
    /// The id points at a location that is not in the snapshot.
    Unknown,
    /// The id resolves.
    Named(String),
}

impl std::fmt::Display for LocationLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocationLabel::Unassigned => write!(f, "Unassigned"),
            LocationLabel::Unknown => write!(f, "Unknown"),
            LocationLabel::Named(name) => f.write_str(name),
        }
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// The most recently observed state of both collections.
///
/// ## Replacement, Never Patching
/// ```text
/// notification(items, [r1, r2, r3])
///        │
///        ▼
/// Snapshot { revision: n }  ──replace(Items)──▶  Snapshot { revision: n+1 }
///   items:     [old...]                             items:     [r1, r2, r3]
///   locations: [L...]                               locations: [L...] (same)
/// ```
///
/// A snapshot is immutable. Each notification produces a brand-new one with
/// the notified collection rebuilt wholesale from the payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    /// Number of notifications applied so far.
    pub revision: u64,
    pub items: Vec<Item>,
    pub locations: Vec<Location>,
    /// True once the items collection has been delivered at least once.
    pub items_loaded: bool,
    /// True once the locations collection has been delivered at least once.
    pub locations_loaded: bool,
}

impl Snapshot {
    /// Snapshot before anything has been observed.
    pub fn empty() -> Self {
        Self::default()
    }

    /// True once both collections have arrived from the store.
    ///
    /// Until then derived counts would be computed from partial data.
    pub fn is_live(&self) -> bool {
        self.items_loaded && self.locations_loaded
    }

    /// Returns a new snapshot with `collection` rebuilt from `records`.
    ///
    /// Records that fail to decode are skipped with a warning.
    pub fn replace(&self, collection: Collection, records: &[Record]) -> Snapshot {
        let mut next = Snapshot {
            revision: self.revision + 1,
            ..self.clone()
        };

        match collection {
            Collection::Items => {
                next.items = decode_all(records, |r| Item::try_from(r));
                next.items_loaded = true;
            }
            Collection::Locations => {
                next.locations = decode_all(records, |r| Location::try_from(r));
                next.locations_loaded = true;
            }
        }

        next
    }

    /// Finds a location by id.
    pub fn location(&self, id: &str) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }

    /// Finds an item by exact code.
    pub fn item_by_code(&self, code: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.code == code)
    }
}

fn decode_all<T>(records: &[Record], decode: impl Fn(&Record) -> crate::CoreResult<T>) -> Vec<T> {
    records
        .iter()
        .filter_map(|record| match decode(record) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, "Skipping undecodable record");
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
    use super::*;
    use serde_json::json;

    fn record(id: &str, fields: Value) -> Record {
        Record::new(id, fields.as_object().cloned().unwrap_or_default())
    }

    #[test]
    fn test_quality_clamps_on_read() {
        assert_eq!(Quality::from_json(None).value(), 5);
        assert_eq!(Quality::from_json(Some(&Value::Null)).value(), 5);
        assert_eq!(Quality::from_json(Some(&json!(0))).value(), 1);
        assert_eq!(Quality::from_json(Some(&json!(9))).value(), 5);
        assert_eq!(Quality::from_json(Some(&json!(3))).value(), 3);
        assert_eq!(Quality::from_json(Some(&json!(2.6))).value(), 3);
        assert_eq!(Quality::from_json(Some(&json!("high"))).value(), 5);
    }

    #[test]
    fn test_quality_serde_clamps() {
        let q: Quality = serde_json::from_str("42").unwrap();
        assert_eq!(q.value(), 5);
        assert_eq!(serde_json::to_string(&Quality::clamped(2)).unwrap(), "2");
    }

    #[test]
    fn test_quality_new_rejects_out_of_range() {
        assert!(Quality::new(0).is_none());
        assert!(Quality::new(6).is_none());
        assert_eq!(Quality::new(4).map(|q| q.value()), Some(4));
    }

    #[test]
    fn test_quality_tiers_and_labels() {
        assert_eq!(Quality::clamped(5).tier(), QualityTier::Good);
        assert_eq!(Quality::clamped(4).tier(), QualityTier::Good);
        assert_eq!(Quality::clamped(3).tier(), QualityTier::Fair);
        assert_eq!(Quality::clamped(1).tier(), QualityTier::Poor);
        assert_eq!(Quality::clamped(1).label(), "Poor");
        assert_eq!(Quality::default().label(), "Excellent");
    }

    #[test]
    fn test_snapshot_replace_is_wholesale() {
        let s0 = Snapshot::empty();
        assert!(!s0.is_live());

        let s1 = s0.replace(
            Collection::Items,
            &[
                record("a", json!({"code": "c-a"})),
                record("b", json!({"code": "c-b"})),
            ],
        );
        assert_eq!(s1.revision, 1);
        assert_eq!(s1.items.len(), 2);
        assert!(!s1.is_live());

        let s2 = s1.replace(Collection::Items, &[record("c", json!({"code": "c-c"}))]);
        assert_eq!(s2.items.len(), 1);
        assert_eq!(s2.items[0].id, "c");

        let s3 = s2.replace(Collection::Locations, &[record("r1", json!({"name": "Garage"}))]);
        assert!(s3.is_live());
        assert_eq!(s3.items, s2.items);
        assert_eq!(s3.revision, 3);
    }

    #[test]
    fn test_snapshot_skips_bad_records() {
        let snapshot = Snapshot::empty().replace(
            Collection::Items,
            &[
                record("ok", json!({"code": "c-1"})),
                record("bad", json!({"name": "no code"})),
            ],
        );
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.items[0].id, "ok");
    }

    #[test]
    fn test_assignment_fields_write_nulls() {
        let assignment = Assignment {
            location_id: Some("r1".into()),
            name: None,
            quality: Quality::clamped(2),
            comment: None,
        };
        let fields = assignment.to_fields();
        assert_eq!(fields["location_id"], json!("r1"));
        assert_eq!(fields["name"], Value::Null);
        assert_eq!(fields["quality"], json!(2));
        assert_eq!(fields["comment"], Value::Null);
    }

    #[test]
    fn test_new_item_fields_omit_quality() {
        let fields = Item::new_fields("abc", Utc::now());
        assert_eq!(fields["code"], json!("abc"));
        assert!(!fields.contains_key("quality"));

        let item = Item::try_from(&Record::new("id-1", fields)).unwrap();
        assert_eq!(item.quality.value(), 5);
        assert!(!item.is_assigned());
        assert!(item.created_at.is_some());
    }
}
