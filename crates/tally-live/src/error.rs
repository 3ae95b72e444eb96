//! # Live Error Types
//!
//! Errors raised by the mirror, the write path and configuration.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Live Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │     Store       │  │      Domain             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Store          │  │  Validation             │ │
//! │  │  ConfigLoad...  │  │  NotFound       │  │  Core                   │ │
//! │  │  ConfigSave...  │  │  WriteFailed    │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │   Lifecycle     │  │  Serialization  │                              │
//! │  │                 │  │                 │                              │
//! │  │  Released       │  │  Serialization  │                              │
//! │  │  ChannelError   │  │                 │                              │
//! │  └─────────────────┘  └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tally_core::{CoreError, ValidationError};
use tally_db::DbError;
use thiserror::Error;

/// Result type alias for live operations.
pub type LiveResult<T> = Result<T, LiveError>;

/// Errors from the live inventory layer.
#[derive(Debug, Error)]
pub enum LiveError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Store Errors
    // =========================================================================
    /// The document store could not be reached or answered with an error.
    #[error("Store error: {0}")]
    Store(String),

    /// A document the caller referred to does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A write was rejected or failed. Never retried automatically.
    ///
    /// ## When This Occurs
    /// - Store unavailable during create/update/delete
    /// - The store refused the document
    #[error("{operation} failed: {reason}")]
    WriteFailed { operation: String, reason: String },

    // =========================================================================
    // Domain Errors
    // =========================================================================
    /// User input rejected before anything was written.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Domain rule violated.
    #[error(transparent)]
    Core(#[from] CoreError),

    // =========================================================================
    // Lifecycle Errors
    // =========================================================================
    /// The mirror or view has been released.
    #[error("Live view has been released")]
    Released,

    /// Channel send/receive failed.
    #[error("Channel error: {0}")]
    ChannelError(String),

    /// JSON encoding or decoding failed.
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl LiveError {
    /// Creates a write failure.
    pub fn write_failed(operation: impl Into<String>, reason: impl ToString) -> Self {
        LiveError::WriteFailed {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        LiveError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<DbError> for LiveError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => LiveError::NotFound { entity, id },
            other => LiveError::Store(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for LiveError {
    fn from(err: serde_json::Error) -> Self {
        LiveError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for LiveError {
    fn from(err: std::io::Error) -> Self {
        LiveError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for LiveError {
    fn from(err: toml::de::Error) -> Self {
        LiveError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for LiveError {
    fn from(err: toml::ser::Error) -> Self {
        LiveError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl LiveError {
    /// Returns true if repeating the same call could succeed.
    ///
    /// Nothing in this crate retries; this is for callers that want to.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LiveError::Store(_) | LiveError::WriteFailed { .. } | LiveError::ChannelError(_)
        )
    }

    /// Returns true if the error came from what the user typed.
    pub fn is_validation(&self) -> bool {
        matches!(self, LiveError::Validation(_))
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            LiveError::InvalidConfig(_)
                | LiveError::ConfigLoadFailed(_)
                | LiveError::ConfigSaveFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_not_found_maps_to_not_found() {
        let err: LiveError = DbError::not_found("items", "abc").into();
        assert!(matches!(err, LiveError::NotFound { ref id, .. } if id == "abc"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_categories() {
        assert!(LiveError::write_failed("create location", "offline").is_retryable());
        assert!(LiveError::Validation(ValidationError::Required {
            field: "name".into()
        })
        .is_validation());
        assert!(LiveError::InvalidConfig("x".into()).is_config_error());
        assert!(!LiveError::Released.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = LiveError::write_failed("assign item", "disk full");
        assert_eq!(err.to_string(), "assign item failed: disk full");
    }
}
