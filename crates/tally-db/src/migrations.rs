//! # Schema Migrations
//!
//! The schema ships inside the binary (`sqlx::migrate!`) and is brought up
//! to date every time a [`Database`](crate::Database) opens.
//!
//! ```text
//!   migrations/sqlite/
//!   └── 001_documents.sql   documents (collection, id, fields JSON, seq)
//!                           kv_entries (key, value)
//! ```
//!
//! Applied migrations are tracked in `_sqlx_migrations` by checksum, so an
//! edited migration fails loudly. Schema changes go in a new numbered file.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies whatever has not been applied yet.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    debug!(embedded = MIGRATOR.migrations.len(), "Checking schema");
    MIGRATOR.run(pool).await?;
    info!("Schema up to date");
    Ok(())
}

/// `(embedded, applied)` migration counts.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success")
        .fetch_optional(pool)
        .await?
        .unwrap_or(0);

    Ok((MIGRATOR.migrations.len(), applied as usize))
}
