//! # Database Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  sqlx::Error ───────┐        serde_json::Error (encode / decode)       │
//! │  MigrateError ──────┤                    │                              │
//! │                     ▼                    ▼                              │
//! │               DbError (this module) ◀────┘                              │
//! │                     │                                                   │
//! │                     ▼                                                   │
//! │               LiveError (tally-live): NotFound kept, rest → Store       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Document not found.
    ///
    /// ## When This Occurs
    /// - Updating a document id that was never created
    /// - Updating a document that another writer deleted
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A document id was generated twice.
    #[error("Document id already taken: {0}")]
    DuplicateId(String),

    /// Stored JSON does not parse, or is not an object.
    ///
    /// ## When This Occurs
    /// - The file was edited by hand
    /// - A future schema wrote a shape this build cannot read
    #[error("Corrupt document {id}: {reason}")]
    CorruptDocument { id: String, reason: String },

    /// Fields could not be encoded for storage.
    #[error("Cannot encode document: {0}")]
    Encode(String),

    /// The database could not be opened, or the pool is closed.
    ///
    /// ## When This Occurs
    /// - Parent directory missing or not writable
    /// - `Database::close` was called earlier
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// No connection became free within the acquire timeout.
    #[error("Timed out waiting for a database connection")]
    PoolTimedOut,

    /// Any other SQL failure.
    #[error("Query failed: {0}")]
    QueryFailed(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn corrupt(id: impl Into<String>, reason: impl Into<String>) -> Self {
        DbError::CorruptDocument {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if retrying the same call might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, DbError::PoolTimedOut | DbError::DuplicateId(_))
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DbError::DuplicateId(db_err.message().to_string())
            }
            sqlx::Error::Database(db_err) if db_err.is_check_violation() => {
                DbError::Encode(db_err.message().to_string())
            }
            sqlx::Error::PoolTimedOut => DbError::PoolTimedOut,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".into()),
            other => DbError::QueryFailed(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Encode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            DbError::not_found("locations", "r1").to_string(),
            "locations not found: r1"
        );
        assert!(DbError::corrupt("d1", "not an object")
            .to_string()
            .contains("d1"));
    }

    #[test]
    fn test_transient() {
        assert!(DbError::PoolTimedOut.is_transient());
        assert!(!DbError::not_found("items", "x").is_transient());
    }

    #[test]
    fn test_pool_closed_is_connection_failure() {
        let err: DbError = sqlx::Error::PoolClosed.into();
        assert!(matches!(err, DbError::ConnectionFailed(_)));
    }
}
