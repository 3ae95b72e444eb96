//! # CLI Error Type
//!
//! Everything a command can fail with, mapped to a short machine-readable
//! code and a process exit status.
//!
//! ```text
//!   LiveError ──┐
//!   PrintError ─┼──▶ CliError ──▶ "error [NOT_FOUND]: ..."  exit 3
//!   DbError ────┤
//!   io::Error ──┘
//! ```

use std::fmt;

use tally_core::CoreError;
use tally_db::DbError;
use tally_live::LiveError;
use tally_print::PrintError;
use thiserror::Error;

/// Result type alias for commands.
pub type CliResult<T> = Result<T, CliError>;

/// Machine-readable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    StoreError,
    ConfigError,
    PrintError,
    Internal,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::StoreError => "STORE_ERROR",
            ErrorCode::ConfigError => "CONFIG_ERROR",
            ErrorCode::PrintError => "PRINT_ERROR",
            ErrorCode::Internal => "INTERNAL",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Live(#[from] LiveError),

    #[error(transparent)]
    Print(#[from] PrintError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Timed out waiting for {0}")]
    Timeout(&'static str),
}

impl CliError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CliError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            CliError::NotFound { .. } => ErrorCode::NotFound,
            CliError::Invalid(_) => ErrorCode::ValidationError,
            CliError::Live(e) => match e {
                LiveError::NotFound { .. } | LiveError::Core(CoreError::ItemNotFound(_)) => {
                    ErrorCode::NotFound
                }
                LiveError::Core(CoreError::LocationNotFound(_)) => ErrorCode::NotFound,
                e if e.is_validation() => ErrorCode::ValidationError,
                e if e.is_config_error() => ErrorCode::ConfigError,
                _ => ErrorCode::StoreError,
            },
            CliError::Print(e) if e.is_input_error() => ErrorCode::ValidationError,
            CliError::Print(_) => ErrorCode::PrintError,
            CliError::Db(DbError::NotFound { .. }) => ErrorCode::NotFound,
            CliError::Db(_) => ErrorCode::StoreError,
            CliError::Io(_) | CliError::Json(_) | CliError::Timeout(_) => ErrorCode::Internal,
        }
    }

    /// Process exit status for this error.
    pub fn exit_status(&self) -> u8 {
        match self.code() {
            ErrorCode::ValidationError => 2,
            ErrorCode::NotFound => 3,
            ErrorCode::ConfigError => 4,
            ErrorCode::StoreError => 5,
            ErrorCode::PrintError => 6,
            ErrorCode::Internal => 1,
        }
    }
}
