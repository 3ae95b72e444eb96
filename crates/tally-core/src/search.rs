//! # Search
//!
//! Term filtering and name grouping over a [`Snapshot`].
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  term "  DRILL "                                                        │
//! │     │ trim + lowercase                                                  │
//! │     ▼                                                                   │
//! │  "drill" ── empty? ──yes──▶ []   (search is opt-in, never a listing)    │
//! │     │ no                                                                │
//! │     ▼                                                                   │
//! │  filter: name contains OR comment contains (case-insensitive)           │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  group: IndexMap<lower(name) | "unnamed", Vec<Item>>  (first-seen order)│
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  stable sort by bucket size, descending                                 │
//! │     equal sizes keep first-seen order                                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function here is a pure projection: same snapshot and term in,
//! same result out. Nothing is memoized.

use indexmap::IndexMap;
use serde::Serialize;

use crate::types::{Item, Snapshot};

/// Bucket key for items without a name.
pub const UNNAMED_KEY: &str = "unnamed";

/// Items sharing a normalized name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub key: String,
    pub items: Vec<Item>,
}

impl Bucket {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Buckets ordered by descending size, ties in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupedResult {
    pub buckets: Vec<Bucket>,
}

impl GroupedResult {
    /// Number of items across all buckets.
    pub fn total(&self) -> usize {
        self.buckets.iter().map(Bucket::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Bucket keys in display order.
    pub fn keys(&self) -> Vec<&str> {
        self.buckets.iter().map(|b| b.key.as_str()).collect()
    }
}

/// Normalizes a search term. An empty return means "no search".
pub fn normalize_term(term: &str) -> String {
    term.trim().to_lowercase()
}

/// Items whose name or comment contains the term, in snapshot order.
pub fn filter<'a>(snapshot: &'a Snapshot, term: &str) -> Vec<&'a Item> {
    let needle = normalize_term(term);
    if needle.is_empty() {
        return Vec::new();
    }

    let contains = |field: &Option<String>| {
        field
            .as_deref()
            .is_some_and(|value| value.to_lowercase().contains(&needle))
    };

    snapshot
        .items
        .iter()
        .filter(|item| contains(&item.name) || contains(&item.comment))
        .collect()
}

/// Group key for an item.
pub fn group_key(item: &Item) -> String {
    match &item.name {
        Some(name) => name.to_lowercase(),
        None => UNNAMED_KEY.to_string(),
    }
}

/// Partitions items by [`group_key`] and orders the buckets.
pub fn group_by_name<'a>(items: impl IntoIterator<Item = &'a Item>) -> GroupedResult {
    let mut groups: IndexMap<String, Vec<Item>> = IndexMap::new();
    for item in items {
        groups.entry(group_key(item)).or_default().push(item.clone());
    }

    let mut buckets: Vec<Bucket> = groups
        .into_iter()
        .map(|(key, items)| Bucket { key, items })
        .collect();

    // `sort_by` is stable: equal-sized buckets stay in first-seen order
    buckets.sort_by(|a, b| b.len().cmp(&a.len()));

    GroupedResult { buckets }
}

/// Filter then group.
pub fn search(snapshot: &Snapshot, term: &str) -> GroupedResult {
    group_by_name(filter(snapshot, term))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Quality;

    fn item(id: &str, name: Option<&str>, comment: Option<&str>) -> Item {
        Item {
            id: id.to_string(),
            code: format!("code-{id}"),
            name: name.map(String::from),
            location_id: None,
            quality: Quality::default(),
            comment: comment.map(String::from),
            created_at: None,
        }
    }

    fn snapshot(items: Vec<Item>) -> Snapshot {
        Snapshot {
            items,
            ..Snapshot::empty()
        }
    }

    #[test]
    fn test_empty_term_returns_nothing() {
        let s = snapshot(vec![item("1", Some("Drill"), None)]);
        assert!(search(&s, "").is_empty());
        assert!(search(&s, "   ").is_empty());
    }

    #[test]
    fn test_matches_name_or_comment_case_insensitive() {
        let s = snapshot(vec![
            item("1", Some("Cordless DRILL"), None),
            item("2", Some("Hammer"), Some("next to the drill bits")),
            item("3", Some("Saw"), None),
            item("4", None, None),
        ]);
        let hits: Vec<_> = filter(&s, " Drill ").iter().map(|i| i.id.as_str()).collect();
        assert_eq!(hits, vec!["1", "2"]);
    }

    #[test]
    fn test_item_without_name_or_comment_never_matches() {
        let s = snapshot(vec![item("1", None, None)]);
        assert!(filter(&s, "unnamed").is_empty());
        assert!(filter(&s, "code").is_empty());
    }

    #[test]
    fn test_grouping_orders_by_size_then_first_seen() {
        let items = vec![
            item("1", Some("A"), None),
            item("2", Some("B"), None),
            item("3", Some("a"), None),
            item("4", Some("C"), None),
            item("5", None, None),
        ];
        let grouped = group_by_name(&items);
        assert_eq!(grouped.keys(), vec!["a", "b", "c", "unnamed"]);
        assert_eq!(grouped.buckets[0].len(), 2);
    }

    #[test]
    fn test_equal_buckets_keep_first_seen_order() {
        let items = vec![
            item("1", Some("Zeta"), None),
            item("2", Some("Alpha"), None),
            item("3", Some("Mid"), None),
        ];
        let grouped = group_by_name(&items);
        assert_eq!(grouped.keys(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_bucket_totals_match_filter() {
        let s = snapshot(vec![
            item("1", Some("Box"), Some("red")),
            item("2", Some("box"), Some("blue")),
            item("3", None, Some("red box")),
            item("4", Some("Crate"), Some("boxy")),
            item("5", Some("Shelf"), None),
        ]);
        for term in ["box", "red", "x", "shelf", "nothing", ""] {
            assert_eq!(search(&s, term).total(), filter(&s, term).len(), "term {term:?}");
        }
    }

    #[test]
    fn test_search_is_idempotent() {
        let s = snapshot(vec![item("1", Some("Lamp"), None), item("2", Some("lamp"), None)]);
        assert_eq!(search(&s, "lamp"), search(&s, "lamp"));
        assert!(search(&s, "desk").is_empty());
        assert_eq!(search(&s, "LAMP").total(), 2);
    }
}
