//! Error types for API calls.
//!
//! Every failure that crosses the HTTP adapter is an [`ApiError`]. The variant
//! encodes the classification the adapter already applied, so callers can
//! downgrade whitelisted not-found responses to "no data" without re-parsing
//! status codes.

use thiserror::Error;

use crate::constants::messages;

/// Coarse error category used for user-facing feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Connectivity,
    Authentication,
    NotFound,
    Server,
    Other,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// No response reached us: connect failure, timeout, or broken body.
    #[error("Network error: {0}")]
    Connectivity(String),

    #[error("Authentication failed (status {status})")]
    Authentication { status: u16 },

    /// `silent` is set when the request path is on the optional-data
    /// whitelist and no notification was raised.
    #[error("Not found: {message}")]
    NotFound { message: String, silent: bool },

    #[error("Server error (status {status}): {message}")]
    Server { status: u16, message: String },

    #[error("Request failed (status {status}): {message}")]
    Status { status: u16, message: String },

    /// A 2xx envelope carrying `success: false`.
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Live channel error: {0}")]
    Channel(String),

    #[error("Client setup failed: {0}")]
    Setup(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Builds the error for a non-2xx status, the way the adapter classifies it.
    pub fn from_status(status: u16, server_message: Option<String>, silent: bool) -> Self {
        match status {
            401 | 403 => Self::Authentication { status },
            404 => Self::NotFound {
                message: server_message.unwrap_or_else(|| messages::NOT_FOUND.to_string()),
                silent,
            },
            500 => Self::Server {
                status,
                message: server_message.unwrap_or_else(|| messages::SERVER_ERROR.to_string()),
            },
            _ => Self::Status {
                status,
                message: server_message.unwrap_or_else(|| messages::REQUEST_FAILED.to_string()),
            },
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Connectivity(_) | Self::Channel(_) => ErrorKind::Connectivity,
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Server { .. } => ErrorKind::Server,
            Self::Status { status, .. } if *status >= 500 => ErrorKind::Server,
            Self::Status { .. }
            | Self::Rejected(_)
            | Self::Decode(_)
            | Self::Url(_)
            | Self::Setup(_) => ErrorKind::Other,
        }
    }

    /// HTTP status carried by the failure, when a response was received.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { status }
            | Self::Server { status, .. }
            | Self::Status { status, .. } => Some(*status),
            Self::NotFound { .. } => Some(404),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether the adapter suppressed user-visible feedback for this error.
    #[must_use]
    pub const fn is_silent(&self) -> bool {
        matches!(self, Self::NotFound { silent: true, .. })
    }

    /// Message shown to the user for this failure.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Connectivity(_) | Self::Channel(_) => messages::NETWORK_FAILED.to_string(),
            Self::Authentication { .. } => messages::AUTH_FAILED.to_string(),
            Self::NotFound { .. } => messages::NOT_FOUND.to_string(),
            Self::Server { .. } => messages::SERVER_ERROR.to_string(),
            Self::Status { message, .. } | Self::Rejected(message) => message.clone(),
            Self::Decode(_) | Self::Url(_) => messages::UNEXPECTED_RESPONSE.to_string(),
            Self::Setup(message) => message.clone(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
