//! Error types for taskbuddy
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, unknown task or user, duplicate email)
//! - 3: Authentication failed (bad credential, no session)
//! - 4: Operation failed (storage unavailable, lock timeout)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the tb CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const AUTH_FAILED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for taskbuddy operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Authentication failures (exit code 3)
    #[error("Invalid credential for {0}")]
    InvalidCredential(String),

    #[error("Not logged in")]
    NotAuthenticated,

    // Operation failures (exit code 4)
    #[error("Storage unavailable for '{key}': {reason}")]
    StorageUnavailable { key: String, reason: String },

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::DuplicateEmail(_)
            | Error::UserNotFound(_)
            | Error::NotFound(_)
            | Error::InvalidArgument(_)
            | Error::InvalidConfig(_) => exit_codes::USER_ERROR,

            Error::InvalidCredential(_) | Error::NotAuthenticated => exit_codes::AUTH_FAILED,

            Error::StorageUnavailable { .. }
            | Error::LockFailed(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlSerialize(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Stable machine-readable name for the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Error::DuplicateEmail(_) => "duplicate_email",
            Error::UserNotFound(_) => "user_not_found",
            Error::NotFound(_) => "not_found",
            Error::InvalidArgument(_) => "invalid_argument",
            Error::InvalidConfig(_) => "invalid_config",
            Error::InvalidCredential(_) => "invalid_credential",
            Error::NotAuthenticated => "not_authenticated",
            Error::StorageUnavailable { .. } | Error::LockFailed(_) => "storage_unavailable",
            Error::Io(_)
            | Error::Json(_)
            | Error::TomlSerialize(_)
            | Error::OperationFailed(_) => "operation_failed",
        }
    }

    /// Structured details for JSON output
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::DuplicateEmail(email) => Some(serde_json::json!({ "email": email })),
            Error::UserNotFound(who) => Some(serde_json::json!({ "user": who })),
            Error::NotFound(id) => Some(serde_json::json!({ "id": id })),
            Error::StorageUnavailable { key, reason } => {
                Some(serde_json::json!({ "key": key, "reason": reason }))
            }
            Error::LockFailed(path) => Some(serde_json::json!({ "path": path })),
            Error::InvalidConfig(message) | Error::InvalidArgument(message) => {
                Some(serde_json::json!({ "message": message }))
            }
            _ => None,
        }
    }

    pub(crate) fn storage(key: &str, reason: impl std::fmt::Display) -> Self {
        Error::StorageUnavailable {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for taskbuddy operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub message: String,
    pub code: i32,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            message: err.to_string(),
            code: err.exit_code(),
            kind: err.kind(),
            details: err.details(),
        }
    }
}
