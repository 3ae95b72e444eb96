//! # Key-Value Repository
//!
//! String values under string keys. Used for small advisory data such as
//! the cached per-location counts; nothing authoritative lives here.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

/// Repository for key-value entries.
#[derive(Debug, Clone)]
pub struct KvRepository {
    pool: SqlitePool,
}

impl KvRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Reads a value.
    pub async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM kv_entries WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    /// Writes a value, replacing any previous one (last write wins).
    pub async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO kv_entries (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        debug!(key, bytes = value.len(), "Key-value entry written");
        Ok(())
    }

    /// Removes a value. Returns true if one existed.
    pub async fn remove(&self, key: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM kv_entries WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_set_get_overwrite_remove() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let kv = db.kv();

        assert!(kv.get("counts").await.unwrap().is_none());

        kv.set("counts", r#"{"r1":3}"#).await.unwrap();
        assert_eq!(kv.get("counts").await.unwrap().as_deref(), Some(r#"{"r1":3}"#));

        kv.set("counts", "{}").await.unwrap();
        assert_eq!(kv.get("counts").await.unwrap().as_deref(), Some("{}"));

        assert!(kv.remove("counts").await.unwrap());
        assert!(!kv.remove("counts").await.unwrap());
    }
}
