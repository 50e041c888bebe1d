//! Error types for Carvoyant operations.
//!
//! Every argument check performed before a request leaves the process lands in
//! [`Error::Validation`]; transport failures are converted from `reqwest` and
//! non-2xx responses are only mapped to errors when a caller opts in.

use thiserror::Error;

/// Main error type for Carvoyant operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A caller-supplied argument failed validation
    #[error("{0}")]
    Validation(String),

    /// The response carried no action with the requested name
    #[error("No action found for name: {0}")]
    ActionNotFound(String),

    /// A timestamp string did not match the wire format
    #[error("{0}")]
    InvalidTimestamp(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid endpoint
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Operation timed out
    #[error("Timeout waiting for Carvoyant: {0}")]
    Timeout(String),

    /// Carvoyant is unavailable
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Failed to parse a JSON payload
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request (authentication or authorization)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Bad request with details
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Conflict error
    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Specialized result type for Carvoyant operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::ActionNotFound(_) => "ACTION_NOT_FOUND",
            Self::InvalidTimestamp(_) => "INVALID_TIMESTAMP",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
            Self::HttpError(_) => "HTTP_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::ParseError(_) => "PARSE_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Conflict(_) => "CONFLICT",
        }
    }

    /// Returns true for errors raised before any network activity.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::ActionNotFound(_) | Self::InvalidTimestamp(_)
        )
    }

    /// Returns true if this error should be logged as a serious error.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        matches!(
            self,
            Self::ConfigError(_) | Self::ServiceUnavailable(_) | Self::Timeout(_)
        )
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::ServiceUnavailable(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ConfigError(err.to_string())
    }
}
