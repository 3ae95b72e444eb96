//! # Database Handle
//!
//! Opens the SQLite store that backs both collections and the key-value
//! table, and hands out repositories over it.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            Database                                     │
//! │                                                                         │
//! │  DbConfig::new(path) / DbConfig::in_memory()                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← open pool + run migrations              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌──────────────────────────────┐   ┌──────────────────────────────┐   │
//! │  │          SqlitePool          │   │       Watcher registry       │   │
//! │  │  documents │ kv_entries      │   │  "items"     → [tx, tx]      │   │
//! │  │                              │   │  "locations" → [tx]          │   │
//! │  │                              │   │  (shared by every clone)     │   │
//! │  └──────────────────────────────┘   └──────────────────────────────┘   │
//! │       │                                        ▲                        │
//! │       ▼                                        │ after each write       │
//! │  db.documents() ───────────────────────────────┘                        │
//! │  db.kv()                                                                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! File databases run in WAL mode so a change feed re-reading a collection
//! never blocks the writer that triggered it. An in-memory database lives
//! on exactly one connection that is never recycled; it disappears with the
//! pool.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::document::{DocumentRepository, WatcherRegistry};
use crate::repository::kv::KvRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Where the store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    Memory,
}

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/tally.db").max_connections(5);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub location: StoreLocation,

    /// Pool size. Always 1 for in-memory stores.
    pub max_connections: u32,

    /// How long to wait for a free connection.
    pub acquire_timeout: Duration,

    /// How long SQLite retries a locked database before giving up.
    pub busy_timeout: Duration,

    /// Apply pending migrations on open.
    pub run_migrations: bool,
}

impl DbConfig {
    /// File-backed store. The file is created if missing.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            location: StoreLocation::File(path.into()),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// Throwaway store for tests and demos.
    pub fn in_memory() -> Self {
        DbConfig {
            location: StoreLocation::Memory,
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// File path, if file-backed.
    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            StoreLocation::File(path) => Some(path),
            StoreLocation::Memory => None,
        }
    }

    fn connect_options(&self) -> SqliteConnectOptions {
        let base = SqliteConnectOptions::new().busy_timeout(self.busy_timeout);
        match &self.location {
            StoreLocation::File(path) => base
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal),
            StoreLocation::Memory => base.in_memory(true),
        }
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        let options = SqlitePoolOptions::new().acquire_timeout(self.acquire_timeout);
        match self.location {
            StoreLocation::File(_) => options.max_connections(self.max_connections.max(1)),
            // the data lives on the connection; never let the pool drop it
            StoreLocation::Memory => options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None),
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access.
///
/// Cheap to clone. All clones share the pool and the watcher registry, so a
/// write through any clone reaches every change feed.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,

    /// Change feed subscribers, keyed by collection.
    watchers: WatcherRegistry,
}

impl Database {
    /// Opens the store and applies migrations (unless disabled).
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        match config.path() {
            Some(path) => info!(path = %path.display(), "Opening database"),
            None => info!("Opening in-memory database"),
        }

        let pool = config
            .pool_options()
            .connect_with(config.connect_options())
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!(max_connections = config.max_connections, "Pool ready");

        let db = Database {
            pool,
            watchers: WatcherRegistry::default(),
        };

        if config.run_migrations {
            migrations::run_migrations(&db.pool).await?;
        }

        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Repository over the `items` / `locations` documents.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let id = db.documents().create("locations", &fields).await?;
    /// ```
    pub fn documents(&self) -> DocumentRepository {
        DocumentRepository::new(self.pool.clone(), self.watchers.clone())
    }

    /// Repository over `kv_entries`.
    pub fn kv(&self) -> KvRepository {
        KvRepository::new(self.pool.clone())
    }

    /// Closes the pool. Open change feeds stay open but receive nothing more.
    pub async fn close(&self) {
        info!("Closing database");
        self.pool.close().await;
    }

    /// True if a trivial query succeeds.
    pub async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.ping().await);

        let (total, applied) = migrations::migration_status(db.pool()).await.unwrap();
        assert_eq!(total, applied);
    }

    #[tokio::test]
    async fn test_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tally.db");

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        db.kv().set("k", "v").await.unwrap();
        db.close().await;
        assert!(!db.ping().await);

        let reopened = Database::new(DbConfig::new(&path)).await.unwrap();
        assert_eq!(reopened.kv().get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_config() {
        let config = DbConfig::new("/tmp/test.db").max_connections(10);
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.path(), Some(Path::new("/tmp/test.db")));
        assert_eq!(DbConfig::in_memory().path(), None);
    }
}
