//! Error types for rmon
//!
//! Library code uses `crate::error::Result<T>` which returns `RmonError`.
//! The binary uses `anyhow::Result<T>` and maps errors to exit codes at the
//! CLI boundary (see `exit_codes`).
//!
//! ## Where errors can occur
//!
//! Only the edges of the system fail: the HTTP data source, the token store,
//! the config file and user input parsing. The filtering, faceting and
//! pagination engine in `resources` is total over its inputs and never
//! returns an error. A failed fetch surfaces as `SourceUnavailable`; the
//! caller renders an empty catalog plus a notice.
//!
//! ## Retry Awareness
//!
//! Errors implement `IsRetryable`. `ExponentialBackoffPolicy` in `src/retry.rs`
//! only retries `Network`, `Io`, `Retryable` and server-side (5xx) `Api`
//! errors. Auth and validation failures fail immediately.

use thiserror::Error;

/// Main error type for rmon
#[derive(Error, Debug)]
pub enum RmonError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API error: HTTP {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Data source unavailable: {source_name} - {message}")]
    SourceUnavailable {
        source_name: String,
        message: String,
    },

    #[error("Validation error: {field} - {reason}")]
    Validation { field: String, reason: String },

    #[error("Retryable error (attempt {attempt}/{max_attempts}): {reason}")]
    Retryable {
        attempt: u32,
        max_attempts: u32,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, RmonError>;

impl RmonError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        RmonError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn unavailable(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        RmonError::SourceUnavailable {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// HTTP status carried by the error, if it came from an API response
    pub fn status(&self) -> Option<u16> {
        match self {
            RmonError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RmonError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => RmonError::Api {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None if err.is_decode() => RmonError::unavailable("response", err.to_string()),
            None => RmonError::Network(err.to_string()),
        }
    }
}

/// Trait for determining if an error is retryable
///
/// Used by `ExponentialBackoffPolicy` to decide whether a failed request
/// should be attempted again.
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for RmonError {
    fn is_retryable(&self) -> bool {
        match self {
            RmonError::Retryable { .. } | RmonError::Network(_) | RmonError::Io(_) => true,
            RmonError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
