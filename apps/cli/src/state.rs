//! # Application Context
//!
//! What every command gets: the effective config, the database, and the
//! write-path service built on it. The live view is opened on demand since
//! only read commands need it.
//!
//! ```text
//!   TallyConfig ──▶ Database (SQLite)
//!                     ├── as DocumentStore ──▶ InventoryService
//!                     │                    └─▶ InventoryView (on demand)
//!                     └── as KeyValueStore ──▶ AggregateCache
//! ```

use std::sync::Arc;
use std::time::Duration;

use tally_core::{Location, Snapshot};
use tally_db::{Database, DbConfig};
use tally_live::{
    AggregateCache, DocumentStore, InventoryService, InventoryView, KeyValueStore, TallyConfig,
};
use tracing::{debug, info};

use crate::error::{CliError, CliResult};

/// How long to wait for the first full snapshot.
const LIVE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct AppContext {
    pub config: TallyConfig,
    pub db: Database,
    pub service: InventoryService,
}

impl AppContext {
    /// Connects to the configured database and runs migrations.
    pub async fn open(config: TallyConfig) -> CliResult<Self> {
        let path = config.database_path().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::new(
            DbConfig::new(path.clone()).max_connections(config.store.max_connections),
        )
        .await?;
        info!(?path, "Database ready");

        Ok(Self::with_database(config, db))
    }

    /// Wraps an already open database.
    pub fn with_database(config: TallyConfig, db: Database) -> Self {
        let store: Arc<dyn DocumentStore> = Arc::new(db.clone());
        Self {
            config,
            db,
            service: InventoryService::new(store),
        }
    }

    /// The aggregate cache, if enabled.
    pub fn cache(&self) -> Option<AggregateCache> {
        let kv: Arc<dyn KeyValueStore> = Arc::new(self.db.clone());
        self.config
            .cache_key()
            .map(|key| AggregateCache::with_key(kv, key))
    }

    /// Opens the live view without waiting for data.
    pub async fn open_view(&self) -> CliResult<InventoryView> {
        let store: Arc<dyn DocumentStore> = Arc::new(self.db.clone());
        Ok(InventoryView::open(store, self.cache()).await?)
    }

    /// Opens the live view and waits for both collections.
    pub async fn live_view(&self) -> CliResult<(InventoryView, Arc<Snapshot>)> {
        let view = self.open_view().await?;
        let snapshot = tokio::time::timeout(LIVE_TIMEOUT, view.wait_until_live())
            .await
            .map_err(|_| CliError::Timeout("inventory"))??;
        debug!(revision = snapshot.revision, "View is live");
        Ok((view, snapshot))
    }
}

/// Finds a location by id, then by case-insensitive name.
pub fn resolve_location(snapshot: &Snapshot, needle: &str) -> CliResult<Location> {
    let needle = needle.trim();
    if let Some(location) = snapshot.location(needle) {
        return Ok(location.clone());
    }

    let mut by_name = snapshot
        .locations
        .iter()
        .filter(|l| l.name.eq_ignore_ascii_case(needle));
    match (by_name.next(), by_name.next()) {
        (Some(location), None) => Ok(location.clone()),
        (Some(_), Some(_)) => Err(CliError::Invalid(format!(
            "more than one location is named '{needle}', use its id"
        ))),
        (None, _) => Err(CliError::not_found("location", needle)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(id: &str, name: &str) -> Location {
        Location {
            id: id.into(),
            name: name.into(),
            created_at: None,
        }
    }

    fn snapshot(locations: Vec<Location>) -> Snapshot {
        Snapshot {
            locations,
            ..Snapshot::default()
        }
    }

    #[test]
    fn test_resolve_by_id_then_name() {
        let snap = snapshot(vec![location("l1", "Garage"), location("l2", "Attic")]);
        assert_eq!(resolve_location(&snap, "l2").unwrap().name, "Attic");
        assert_eq!(resolve_location(&snap, " garage ").unwrap().id, "l1");
        assert!(matches!(
            resolve_location(&snap, "Cellar").unwrap_err(),
            CliError::NotFound { .. }
        ));
    }

    #[test]
    fn test_ambiguous_name_rejected() {
        let snap = snapshot(vec![location("l1", "Box"), location("l2", "box")]);
        assert!(matches!(
            resolve_location(&snap, "BOX").unwrap_err(),
            CliError::Invalid(_)
        ));
    }
}
