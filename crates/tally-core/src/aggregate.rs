//! # Aggregates
//!
//! Counts and summaries derived from a [`Snapshot`].
//!
//! Per-location counts are recomputed from scratch on every call. There are
//! no running counters to drift out of sync with the mirrored items.

use std::collections::BTreeMap;

use serde::Serialize;
use ts_rs::TS;

use crate::types::{Item, LocationLabel, Location, Snapshot};

/// Location id → number of mirrored items pointing at it.
///
/// Absent keys mean zero.
pub type AggregateCounts = BTreeMap<String, u64>;

/// Count of items per known location.
///
/// Every location in the snapshot gets an entry, including those with no
/// items. Items pointing at deleted locations are not counted anywhere.
pub fn location_counts(snapshot: &Snapshot) -> AggregateCounts {
    let mut counts: AggregateCounts = snapshot
        .locations
        .iter()
        .map(|location| (location.id.clone(), 0))
        .collect();

    for item in &snapshot.items {
        if let Some(count) = item
            .location_id
            .as_ref()
            .and_then(|id| counts.get_mut(id))
        {
            *count += 1;
        }
    }

    counts
}

/// Summary line for the inventory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct InventoryStats {
    /// Every mirrored item.
    pub total: u32,
    /// Items that have a name.
    pub named: u32,
    /// Items that have a location id (dangling ids included).
    pub assigned: u32,
}

/// Computes [`InventoryStats`].
pub fn stats(snapshot: &Snapshot) -> InventoryStats {
    snapshot
        .items
        .iter()
        .fold(InventoryStats::default(), |mut acc, item| {
            acc.total += 1;
            acc.named += item.is_named() as u32;
            acc.assigned += item.is_assigned() as u32;
            acc
        })
}

/// Items whose location id equals `location_id`, in snapshot order.
pub fn items_in_location<'a>(snapshot: &'a Snapshot, location_id: &str) -> Vec<&'a Item> {
    snapshot
        .items
        .iter()
        .filter(|item| item.location_id.as_deref() == Some(location_id))
        .collect()
}

/// Resolves an item's location id for display.
pub fn location_label(snapshot: &Snapshot, location_id: Option<&str>) -> LocationLabel {
    match location_id {
        None => LocationLabel::Unassigned,
        Some(id) => match snapshot.location(id) {
            Some(location) => LocationLabel::Named(location.name.clone()),
            None => LocationLabel::Unknown,
        },
    }
}

/// Locations sorted by name, case-insensitively.
pub fn locations_by_name(snapshot: &Snapshot) -> Vec<&Location> {
    let mut locations: Vec<&Location> = snapshot.locations.iter().collect();
    locations.sort_by_key(|l| l.name.to_lowercase());
    locations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Quality;

    fn item(id: &str, name: Option<&str>, location: Option<&str>) -> Item {
        Item {
            id: id.into(),
            code: format!("code-{id}"),
            name: name.map(String::from),
            location_id: location.map(String::from),
            quality: Quality::default(),
            comment: None,
            created_at: None,
        }
    }

    fn location(id: &str, name: &str) -> Location {
        Location {
            id: id.into(),
            name: name.into(),
            created_at: None,
        }
    }

    fn fixture() -> Snapshot {
        Snapshot {
            revision: 2,
            items: vec![
                item("1", Some("Drill"), Some("r1")),
                item("2", None, Some("r1")),
                item("3", Some("Saw"), Some("r2")),
                item("4", Some("Lamp"), Some("gone")),
                item("5", None, None),
            ],
            locations: vec![location("r1", "Garage"), location("r2", "attic"), location("r3", "Basement")],
            items_loaded: true,
            locations_loaded: true,
        }
    }

    #[test]
    fn test_counts_match_items() {
        let counts = location_counts(&fixture());
        assert_eq!(counts.get("r1"), Some(&2));
        assert_eq!(counts.get("r2"), Some(&1));
        assert_eq!(counts.get("r3"), Some(&0));
        assert!(!counts.contains_key("gone"));
    }

    #[test]
    fn test_counts_recomputed_per_snapshot() {
        let mut s = fixture();
        assert_eq!(location_counts(&s)["r1"], 2);
        s.items.retain(|i| i.id != "1");
        assert_eq!(location_counts(&s)["r1"], 1);
    }

    #[test]
    fn test_stats() {
        assert_eq!(
            stats(&fixture()),
            InventoryStats {
                total: 5,
                named: 3,
                assigned: 4
            }
        );
        assert_eq!(stats(&Snapshot::empty()), InventoryStats::default());
    }

    #[test]
    fn test_labels() {
        let s = fixture();
        assert_eq!(location_label(&s, None), LocationLabel::Unassigned);
        assert_eq!(location_label(&s, Some("gone")), LocationLabel::Unknown);
        assert_eq!(location_label(&s, Some("r1")), LocationLabel::Named("Garage".into()));
    }

    #[test]
    fn test_items_in_location_and_sorting() {
        let s = fixture();
        let ids: Vec<_> = items_in_location(&s, "r1").iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);

        let names: Vec<_> = locations_by_name(&s).iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["attic", "Basement", "Garage"]);
    }
}
