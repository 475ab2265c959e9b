//! Application error type shared by every layer.
//!
//! Each variant carries a human-readable message plus structured `details`
//! so callers (the CLI, tests, log lines) can report the precise reason an
//! operation was refused.

use serde_json::{Value, json};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Empty or malformed input; nothing was mutated.
    #[error("{message}")]
    Validation { message: String, details: Value },

    #[error("{message}")]
    NotFound { message: String, details: Value },

    /// The link existed but its TTL has elapsed.
    #[error("{message}")]
    Expired { message: String, details: Value },

    /// The link existed but its click limit is used up.
    #[error("{message}")]
    LimitExceeded { message: String, details: Value },

    /// The data file exists but does not parse.
    #[error("{message}")]
    CorruptStore { message: String, details: Value },

    /// Reading or writing the data file failed.
    #[error("{message}")]
    Storage { message: String, details: Value },

    /// Every code of the configured length is taken.
    #[error("{message}")]
    CapacityExceeded { message: String, details: Value },

    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn expired(message: impl Into<String>, details: Value) -> Self {
        Self::Expired {
            message: message.into(),
            details,
        }
    }
    pub fn limit_exceeded(message: impl Into<String>, details: Value) -> Self {
        Self::LimitExceeded {
            message: message.into(),
            details,
        }
    }
    pub fn corrupt_store(message: impl Into<String>, details: Value) -> Self {
        Self::CorruptStore {
            message: message.into(),
            details,
        }
    }
    pub fn storage(message: impl Into<String>, details: Value) -> Self {
        Self::Storage {
            message: message.into(),
            details,
        }
    }
    pub fn capacity_exceeded(message: impl Into<String>, details: Value) -> Self {
        Self::CapacityExceeded {
            message: message.into(),
            details,
        }
    }
    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// Stable machine-readable identifier for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "invalid_input",
            AppError::NotFound { .. } => "not_found",
            AppError::Expired { .. } => "expired",
            AppError::LimitExceeded { .. } => "limit_exceeded",
            AppError::CorruptStore { .. } => "corrupt_store",
            AppError::Storage { .. } => "storage_error",
            AppError::CapacityExceeded { .. } => "capacity_exceeded",
            AppError::Internal { .. } => "internal_error",
        }
    }

    /// Structured context attached when the error was raised.
    pub fn details(&self) -> &Value {
        match self {
            AppError::Validation { details, .. }
            | AppError::NotFound { details, .. }
            | AppError::Expired { details, .. }
            | AppError::LimitExceeded { details, .. }
            | AppError::CorruptStore { details, .. }
            | AppError::Storage { details, .. }
            | AppError::CapacityExceeded { details, .. }
            | AppError::Internal { details, .. } => details,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::storage(
            "Link store I/O error",
            json!({ "kind": e.kind().to_string(), "reason": e.to_string() }),
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::corrupt_store(
            "Link store file is malformed",
            json!({ "line": e.line(), "column": e.column(), "reason": e.to_string() }),
        )
    }
}
