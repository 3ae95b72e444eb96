//! # Print Error Types

use tally_core::CoreError;
use thiserror::Error;

/// Result type alias for print operations.
pub type PrintResult<T> = Result<T, PrintError>;

/// Errors produced while composing a sheet.
#[derive(Debug, Error)]
pub enum PrintError {
    /// The code list cannot be laid out (wrong length).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The rasterizer could not turn a text into a code image.
    #[error("Cannot rasterize code: {0}")]
    Rasterize(String),

    /// One cell of the sheet failed; the whole sheet is abandoned.
    ///
    /// ## When This Occurs
    /// - The code is too long for the symbol format
    /// - A custom rasterizer returned an error
    #[error("Rendering code #{index} ({code}) failed: {reason}")]
    RenderFailed {
        index: usize,
        code: String,
        reason: String,
    },

    /// PNG encoding failed.
    #[error("Encoding failed: {0}")]
    Encode(String),

    /// Writing the sheet to disk failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for PrintError {
    fn from(err: image::ImageError) -> Self {
        PrintError::Encode(err.to_string())
    }
}

impl From<qrcode::types::QrError> for PrintError {
    fn from(err: qrcode::types::QrError) -> Self {
        PrintError::Rasterize(err.to_string())
    }
}

impl PrintError {
    /// True if the input itself was unusable, as opposed to a failure while
    /// drawing or writing.
    pub fn is_input_error(&self) -> bool {
        matches!(self, PrintError::Core(_) | PrintError::Rasterize(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = PrintError::RenderFailed {
            index: 4,
            code: "abc".into(),
            reason: "boom".into(),
        };
        assert_eq!(err.to_string(), "Rendering code #4 (abc) failed: boom");

        let err: PrintError = CoreError::InvalidBatchSize { len: 2 }.into();
        assert!(err.is_input_error());
    }
}
