//! Error types used throughout the client

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// HTTP status that signals an expired or rejected access token.
pub const STATUS_UNAUTHORIZED: u16 = 401;

/// Main error type for AssetDesk client operations
///
/// `Clone` is required: a single refresh outcome is delivered to every
/// caller queued behind it.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum ClientError {
    /// Transport-level failure (connect, timeout, broken body stream).
    #[error("Network error: {0}")]
    Network(String),

    /// A success response whose body could not be decoded.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Non-2xx response with the server-supplied detail, if any.
    #[error("API error ({status}): {}", .message.as_deref().unwrap_or("no details"))]
    Api {
        /// HTTP status code
        status: u16,
        /// `detail` / `message` field from the response body
        message: Option<String>,
    },

    /// The refresh endpoint rejected the refresh token or could not be reached.
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    /// No usable credentials for an operation that requires them.
    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    /// Invalid client configuration (base URL, timeouts, storage backend).
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse grouping of [`ClientError`] used for logging and metrics labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Session-related failures (401, refresh failure, missing credentials)
    Authentication,
    /// 4xx responses other than 401
    Client,
    /// 5xx responses
    Server,
    /// Transport failures
    Network,
    /// Malformed success payloads
    Decode,
    /// Local misconfiguration
    Config,
}

impl ClientError {
    /// Build an API error from a status code and optional message.
    pub fn api(status: u16, message: Option<String>) -> Self {
        Self::Api { status, message }
    }

    /// Whether this error is an expired-token response from the server.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status, .. } if *status == STATUS_UNAUTHORIZED)
    }

    /// HTTP status carried by the error, if it came from a response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get the error category for this error
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Api { status, .. } if *status == STATUS_UNAUTHORIZED => {
                ErrorCategory::Authentication
            }
            Self::Api { status, .. } if *status >= 500 => ErrorCategory::Server,
            Self::Api { .. } => ErrorCategory::Client,
            Self::RefreshFailed(_) | Self::Unauthenticated(_) => ErrorCategory::Authentication,
            Self::Network(_) => ErrorCategory::Network,
            Self::Parse(_) => ErrorCategory::Decode,
            Self::Config(_) => ErrorCategory::Config,
        }
    }
}

/// Convert a `ClientError` into a stable label suitable for logging.
#[must_use]
pub fn error_label(error: &ClientError) -> &'static str {
    match error {
        ClientError::Network(_) => "network",
        ClientError::Parse(_) => "parse",
        ClientError::Api { .. } => "api",
        ClientError::RefreshFailed(_) => "refresh_failed",
        ClientError::Unauthenticated(_) => "unauthenticated",
        ClientError::Config(_) => "config",
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Result type alias for AssetDesk client operations
pub type Result<T> = std::result::Result<T, ClientError>;
