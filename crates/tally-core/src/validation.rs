//! # Validation Module
//!
//! Input validation for everything that gets written to the store.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Front end (CLI args, form inputs)                            │
//! │  └── Type parsing                                                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Write path (tally-live InventoryService)                     │
//! │  └── THIS MODULE: trimming, required fields, ranges                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Readers                                                      │
//! │  └── Decoding clamps quality and skips malformed records               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Optional text fields follow one rule: trimmed-empty means "not set".

use crate::error::ValidationError;
use crate::types::Quality;
use crate::{MAX_QUALITY, MIN_QUALITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted location name.
pub const MAX_LOCATION_NAME_LEN: usize = 100;

/// Longest accepted item name.
pub const MAX_ITEM_NAME_LEN: usize = 200;

/// Longest accepted comment.
pub const MAX_COMMENT_LEN: usize = 1000;

/// Longest accepted search term.
pub const MAX_SEARCH_TERM_LEN: usize = 100;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a location name.
///
/// ## Rules
/// - Trimmed before anything else
/// - Must not be empty
/// - At most 100 characters
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_location_name;
///
/// assert_eq!(validate_location_name("  Garage ").unwrap(), "Garage");
/// assert!(validate_location_name("   ").is_err());
/// ```
pub fn validate_location_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    check_len("name", name, MAX_LOCATION_NAME_LEN)?;
    Ok(name.to_string())
}

/// Validates an optional item name. Blank becomes `None`.
pub fn validate_item_name(name: Option<&str>) -> ValidationResult<Option<String>> {
    optional_text("name", name, MAX_ITEM_NAME_LEN)
}

/// Validates an optional comment. Blank becomes `None`.
pub fn validate_comment(comment: Option<&str>) -> ValidationResult<Option<String>> {
    optional_text("comment", comment, MAX_COMMENT_LEN)
}

/// Validates an optional location reference. Blank becomes `None`.
pub fn validate_location_ref(location_id: Option<&str>) -> ValidationResult<Option<String>> {
    Ok(location_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from))
}

/// Validates a code used for lookup.
///
/// Codes are matched exactly, so nothing is trimmed or case-folded; only
/// an entirely blank input is rejected.
pub fn validate_code(code: &str) -> ValidationResult<()> {
    if code.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }
    Ok(())
}

/// Validates a search term.
///
/// ## Returns
/// The trimmed term. Empty is allowed and means "no search".
pub fn validate_search_term(term: &str) -> ValidationResult<String> {
    let term = term.trim();
    check_len("term", term, MAX_SEARCH_TERM_LEN)?;
    Ok(term.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quality rating supplied by a user.
///
/// Unlike reads, which clamp, writes reject anything outside `1..=5`.
pub fn validate_quality(value: i64) -> ValidationResult<Quality> {
    u8::try_from(value)
        .ok()
        .and_then(Quality::new)
        .ok_or_else(|| ValidationError::OutOfRange {
            field: "quality".to_string(),
            min: MIN_QUALITY as i64,
            max: MAX_QUALITY as i64,
        })
}

// =============================================================================
// Helpers
// =============================================================================

fn check_len(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

fn optional_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<Option<String>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => {
            check_len(field, v, max)?;
            Ok(Some(v.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_name() {
        assert_eq!(validate_location_name(" Kitchen ").unwrap(), "Kitchen");
        assert!(matches!(
            validate_location_name(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_location_name(&"x".repeat(101)),
            Err(ValidationError::TooLong { max: 100, .. })
        ));
    }

    #[test]
    fn test_optional_text_blank_is_none() {
        assert_eq!(validate_item_name(None).unwrap(), None);
        assert_eq!(validate_item_name(Some("   ")).unwrap(), None);
        assert_eq!(validate_item_name(Some(" Drill ")).unwrap().as_deref(), Some("Drill"));
        assert_eq!(validate_comment(Some("")).unwrap(), None);
        assert_eq!(validate_location_ref(Some(" ")).unwrap(), None);
        assert_eq!(validate_location_ref(Some("r1")).unwrap().as_deref(), Some("r1"));
    }

    #[test]
    fn test_quality_range() {
        assert!(validate_quality(0).is_err());
        assert!(validate_quality(6).is_err());
        assert!(validate_quality(-3).is_err());
        assert_eq!(validate_quality(1).unwrap().value(), 1);
        assert_eq!(validate_quality(5).unwrap().value(), 5);
    }

    #[test]
    fn test_code_and_term() {
        assert!(validate_code("").is_err());
        assert!(validate_code("abc").is_ok());
        assert_eq!(validate_search_term("  lamp ").unwrap(), "lamp");
        assert!(validate_search_term(&"q".repeat(101)).is_err());
    }
}
