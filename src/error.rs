//! Error taxonomy for the API-access layer.
//!
//! DESIGN
//! ======
//! Every failure a caller can observe from the HTTP client or a facade is an
//! [`ApiError`]. Authentication failures (401) are a distinct variant because
//! the transport has already cleared the credential and notified the session
//! observer by the time the caller sees them; callers only need to render.

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

use crate::store::StoreError;

/// Grepable code plus retry classification, shared by all error enums.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

// =============================================================================
// DECODE
// =============================================================================

/// A response body did not match the schema expected at the facade boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to decode response from {path}: {message}")]
pub struct DecodeError {
    /// Request path that produced the body (e.g. `/auth/me`).
    pub path: String,
    /// Parser or validation message.
    pub message: String,
}

impl DecodeError {
    #[must_use]
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { path: path.into(), message: message.into() }
    }
}

// =============================================================================
// API
// =============================================================================

/// Errors produced by the HTTP client and the API facades.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The configured base URL is not an absolute http(s) URL.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),

    /// The request did not complete (connection refused, reset, DNS, ...).
    #[error("request failed: {0}")]
    Network(String),

    /// The request exceeded the client timeout.
    #[error("request timed out")]
    Timeout,

    /// The server rejected the credential (HTTP 401).
    #[error("not authenticated")]
    Unauthorized,

    /// The server returned a non-success status other than 401.
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body did not match the expected schema.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The credential store could not be read or written.
    #[error("credential store failed: {0}")]
    Storage(#[from] StoreError),
}

impl ApiError {
    /// Classify a transport-level `reqwest` failure.
    pub(crate) fn from_transport(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            return Self::Timeout;
        }
        Self::Network(error.to_string())
    }

    /// HTTP status carried by this error, if the server answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl ErrorCode for ApiError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidBaseUrl(_) => "E_INVALID_BASE_URL",
            Self::ClientBuild(_) => "E_CLIENT_BUILD",
            Self::Network(_) => "E_NETWORK",
            Self::Timeout => "E_TIMEOUT",
            Self::Unauthorized => "E_UNAUTHORIZED",
            Self::Status { .. } => "E_STATUS",
            Self::Decode(_) => "E_DECODE",
            Self::Storage(_) => "E_STORAGE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout | Self::Status { status: 429 | 500..=599, .. }
        )
    }
}
