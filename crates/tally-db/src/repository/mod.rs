//! # Repository Module
//!
//! Database repository implementations for Tally.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  tally-live (DocumentStore / KeyValueStore adapters)                   │
//! │       │                                                                 │
//! │       │  db.documents().find("items", &FieldFilter::eq("code", c))     │
//! │       ▼                                                                 │
//! │  DocumentRepository                   KvRepository                     │
//! │  ├── create / update / delete         ├── get                          │
//! │  ├── get / list / find / count        ├── set                          │
//! │  └── watch (change feed)              └── remove                       │
//! │       │                                     │                           │
//! │       ▼                                     ▼                           │
//! │  documents table                      kv_entries table                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod document;
pub mod kv;
