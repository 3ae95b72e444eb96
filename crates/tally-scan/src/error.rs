//! # Scan Error Types

use thiserror::Error;

/// Result type alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors from a scan session or its capture engine.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The user (or platform) refused camera access.
    ///
    /// ## When This Occurs
    /// - Permission prompt dismissed or denied
    /// - Camera blocked by policy
    #[error("Camera permission denied: {0}")]
    PermissionDenied(String),

    /// No camera could be opened.
    #[error("Capture unavailable: {0}")]
    CaptureUnavailable(String),

    /// `start()` called while a run is already in progress.
    #[error("Scan session is already active")]
    AlreadyActive,

    /// A control request was made with no active run.
    #[error("Scan session is not active")]
    NotActive,

    /// The camera does not expose the requested capability.
    #[error("Capability not supported: {capability}")]
    Unsupported { capability: &'static str },

    /// The engine refused a constraint change.
    #[error("Constraint rejected: {0}")]
    ConstraintRejected(String),
}

impl ScanError {
    /// True if calling `start()` again may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ScanError::PermissionDenied(_)
                | ScanError::CaptureUnavailable(_)
                | ScanError::AlreadyActive
                | ScanError::NotActive
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert!(ScanError::PermissionDenied("denied".into()).is_recoverable());
        assert!(!ScanError::Unsupported { capability: "torch" }.is_recoverable());
        assert_eq!(
            ScanError::Unsupported { capability: "zoom" }.to_string(),
            "Capability not supported: zoom"
        );
    }
}
