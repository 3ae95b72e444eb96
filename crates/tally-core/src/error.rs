//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Domain failures (bad record, bad batch size)   │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tally-db     DbError     - SQLite failures                            │
//! │  tally-live   LiveError   - store / write path failures                │
//! │  tally-print  PrintError  - composition failures                       │
//! │  tally-scan   ScanError   - capture failures                           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → LiveError → CLI message           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No item carries the given code.
    ///
    /// ## When This Occurs
    /// - A scanned code was never minted through this system
    /// - The code was typed by hand and contains a typo (lookups are exact)
    #[error("No item with code: {0}")]
    ItemNotFound(String),

    /// Location id does not resolve.
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    /// A store record could not be decoded into a domain type.
    ///
    /// ## When This Occurs
    /// - An item document has no `code` field
    /// - A field has the wrong JSON type (e.g. `quality: "high"`)
    ///
    /// Snapshots skip such records instead of failing.
    #[error("Invalid {collection} record {id}: {reason}")]
    InvalidRecord {
        collection: String,
        id: String,
        reason: String,
    },

    /// The print compositor only lays out single reprints or full sheets.
    ///
    /// ## Accepted Sizes
    /// ```text
    /// 1 code  → reprint sheet
    /// 9 codes → 3×3 batch sheet
    /// other   → InvalidBatchSize
    /// ```
    #[error("Cannot lay out {len} codes: expected 1 or 9")]
    InvalidBatchSize { len: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidRecord error.
    pub fn invalid_record(
        collection: impl Into<String>,
        id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CoreError::InvalidRecord {
            collection: collection.into(),
            id: id.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before anything is written.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InvalidBatchSize { len: 4 };
        assert_eq!(err.to_string(), "Cannot lay out 4 codes: expected 1 or 9");

        let err = CoreError::invalid_record("items", "doc-1", "missing code");
        assert_eq!(err.to_string(), "Invalid items record doc-1: missing code");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::OutOfRange {
            field: "quality".to_string(),
            min: 1,
            max: 5,
        };
        assert_eq!(err.to_string(), "quality must be between 1 and 5");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
