//! # tally-core: Pure Domain Logic for Tally
//!
//! Tally tracks physical items by sticking a unique scannable code on each
//! one, pinning codes to named locations, and letting people search the
//! resulting inventory. This crate holds everything about that which can be
//! expressed without I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Tally Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                apps/cli (or any other front end)                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌──────────────┬──────────────┴───────────┬─────────────────────┐     │
//! │  │  tally-live  │        tally-print       │     tally-scan      │     │
//! │  │ mirror/cache │   compositor (raster)    │   decode session    │     │
//! │  └──────┬───────┴──────────────┬───────────┴─────────────────────┘     │
//! │         │                      │                                        │
//! │  ┌──────▼──────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  types  │ │ record  │ │ search  │ │aggregate│ │ layout  │  │   │
//! │  │   │  Item   │ │ Fields  │ │ filter  │ │ counts  │ │  plan   │  │   │
//! │  │   │Snapshot │ │ Filter  │ │ groups  │ │ stats   │ │ DrawOp  │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Item, Location, Quality, Snapshot)
//! - [`record`] - Opaque store records and their decoding
//! - [`minter`] - Fresh item codes
//! - [`search`] - Term filtering and stable name grouping
//! - [`aggregate`] - Per-location counts, statistics, labels
//! - [`layout`] - Print sheet geometry (what goes where on the canvas)
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::{search, Snapshot};
//!
//! let snapshot = Snapshot::empty();
//! let groups = search::search(&snapshot, "drill");
//! assert!(groups.is_empty());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregate;
pub mod error;
pub mod layout;
pub mod minter;
pub mod record;
pub mod search;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use aggregate::{AggregateCounts, InventoryStats};
pub use error::{CoreError, CoreResult, ValidationError};
pub use record::{FieldFilter, Fields, Record};
pub use search::{Bucket, GroupedResult};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Collection holding one document per minted code.
pub const ITEMS_COLLECTION: &str = "items";

/// Collection holding one document per location.
pub const LOCATIONS_COLLECTION: &str = "locations";

/// Quality assumed when a record carries none.
pub const DEFAULT_QUALITY: u8 = 5;

/// Lowest accepted quality rating.
pub const MIN_QUALITY: u8 = 1;

/// Highest accepted quality rating.
pub const MAX_QUALITY: u8 = 5;
