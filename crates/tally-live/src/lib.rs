//! # tally-live: Live Inventory for Tally
//!
//! Mirrors the document store, keeps derived counts current, and owns the
//! write path.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Live Inventory                                  │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      InventoryView                               │  │
//! │  │                                                                  │  │
//! │  │  counts() → Cached | Live      search(term)      stats()         │  │
//! │  │  location_detail(id)           location_label(item)              │  │
//! │  └───────────────┬───────────────────────────────┬──────────────────┘  │
//! │                  │                               │                      │
//! │                  ▼                               ▼                      │
//! │  ┌────────────────────────────┐   ┌────────────────────────────────┐   │
//! │  │        LiveMirror          │   │        AggregateCache          │   │
//! │  │                            │   │                                │   │
//! │  │ One pump per collection    │   │ Last counts under one key in   │   │
//! │  │ Whole-collection replace   │   │ the key-value store            │   │
//! │  │ Release = no more emission │   │ Never fails                    │   │
//! │  └─────────────┬──────────────┘   └───────────────┬────────────────┘   │
//! │                │                                  │                     │
//! │                ▼                                  ▼                     │
//! │         trait DocumentStore                trait KeyValueStore          │
//! │                ▲                                                        │
//! │                │                                                        │
//! │  ┌─────────────┴──────────────┐                                         │
//! │  │     InventoryService       │  create/delete location, mint,          │
//! │  │     (write path)           │  find by code, assign                   │
//! │  └────────────────────────────┘                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`store`] - Store traits and the SQLite / in-memory adapters
//! - [`mirror`] - `LiveMirror` and its handle
//! - [`cache`] - `AggregateCache`
//! - [`view`] - `InventoryView`
//! - [`service`] - `InventoryService`
//! - [`config`] - `TallyConfig`
//! - [`error`] - Error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tally_live::{AggregateCache, InventoryView, TallyConfig};
//!
//! let config = TallyConfig::load_or_default(None);
//! let db = Arc::new(Database::new(DbConfig::new(config.database_path())).await?);
//!
//! let view = InventoryView::open(db.clone(), Some(AggregateCache::new(db))).await?;
//! let counts = view.counts(); // cached numbers right away
//! view.wait_until_live().await?;
//! let counts = view.counts(); // live from here on
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cache;
pub mod config;
pub mod error;
pub mod mirror;
pub mod service;
pub mod store;
pub mod view;

// =============================================================================
// Re-exports
// =============================================================================

pub use cache::{AggregateCache, DEFAULT_CACHE_KEY};
pub use config::TallyConfig;
pub use error::{LiveError, LiveResult};
pub use mirror::{LiveMirror, MirrorHandle, SnapshotFeed};
pub use service::{InventoryService, MintedItem};
pub use store::{DocumentStore, KeyValueStore, MemoryDocumentStore, MemoryKvStore, RecordFeed};
pub use view::{InventoryView, LocationCounts, Provenance};
