//! Structured errors produced by the HTTP adapter and durable storage.
//!
//! Every failure a store can observe is an [`ApiError`] tagged with an
//! [`ErrorKind`]. Stores collapse it to a display string for their `error`
//! field, but callers that need to branch (session expiry, for one) match on
//! the kind instead of the message text.

use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

/// Coarse classification of an API failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 401/403: missing, expired, or insufficient credentials.
    Unauthorized,
    /// 400/409/422: the backend rejected the request contents.
    Validation,
    /// The request never produced an HTTP response.
    Network,
    /// Any other failure, including undecodable bodies.
    Unknown,
}

impl ErrorKind {
    /// Classify an HTTP error status.
    #[must_use]
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Unauthorized,
            StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                Self::Validation
            }
            _ => Self::Unknown,
        }
    }
}

/// Error returned by every network-backed store operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// Classification used for control flow.
    pub kind: ErrorKind,
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
    /// Human-readable `message` supplied by the backend, if any.
    pub message: Option<String>,
}

impl ApiError {
    /// Error for a response with a non-success status.
    #[must_use]
    pub fn http(status: StatusCode, message: Option<String>) -> Self {
        Self {
            kind: ErrorKind::from_status(status),
            status: Some(status.as_u16()),
            message,
        }
    }

    /// Error for a request that failed before a response arrived.
    #[must_use]
    pub const fn network() -> Self {
        Self {
            kind: ErrorKind::Network,
            status: None,
            message: None,
        }
    }

    /// Error with no more specific classification.
    #[must_use]
    pub const fn unknown() -> Self {
        Self {
            kind: ErrorKind::Unknown,
            status: None,
            message: None,
        }
    }

    /// Error for a success response whose body did not match the envelope.
    #[must_use]
    pub fn decode(status: StatusCode) -> Self {
        Self {
            kind: ErrorKind::Unknown,
            status: Some(status.as_u16()),
            message: None,
        }
    }

    /// The string a store records: the backend message, or `fallback`.
    #[must_use]
    pub fn describe(&self, fallback: &str) -> String {
        self.message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(fallback)
            .to_owned()
    }

    /// Whether this failure means the session is no longer valid.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self.kind, ErrorKind::Unauthorized)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} API error", self.kind)?;
        if let Some(status) = self.status {
            write!(f, " ({status})")?;
        }
        write!(f, ": {}", self.message.as_deref().unwrap_or("no message"))
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::http(status, None),
            None if err.is_decode() || err.is_builder() => Self::unknown(),
            None => Self::network(),
        }
    }
}

/// Errors from the durable session storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("session storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file is not a valid JSON object.
    #[error("session storage is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// The in-memory lock was poisoned by a panicking writer.
    #[error("session storage lock poisoned")]
    Poisoned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(ErrorKind::from_status(StatusCode::UNAUTHORIZED), ErrorKind::Unauthorized);
        assert_eq!(ErrorKind::from_status(StatusCode::FORBIDDEN), ErrorKind::Unauthorized);
        assert_eq!(ErrorKind::from_status(StatusCode::CONFLICT), ErrorKind::Validation);
        assert_eq!(
            ErrorKind::from_status(StatusCode::UNPROCESSABLE_ENTITY),
            ErrorKind::Validation
        );
        assert_eq!(
            ErrorKind::from_status(StatusCode::INTERNAL_SERVER_ERROR),
            ErrorKind::Unknown
        );
    }

    #[test]
    fn test_describe_prefers_server_message() {
        let err = ApiError::http(StatusCode::CONFLICT, Some("Insufficient stock".to_string()));
        assert_eq!(err.describe("Failed to add item"), "Insufficient stock");

        let err = ApiError::http(StatusCode::BAD_GATEWAY, None);
        assert_eq!(err.describe("Failed to add item"), "Failed to add item");

        let err = ApiError::http(StatusCode::BAD_REQUEST, Some("  ".to_string()));
        assert_eq!(err.describe("Bad input"), "Bad input");
    }

    #[test]
    fn test_network_error_uses_fallback() {
        let err = ApiError::network();
        assert_eq!(err.kind, ErrorKind::Network);
        assert_eq!(err.describe("Failed to fetch cart"), "Failed to fetch cart");
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_display() {
        let err = ApiError::http(StatusCode::UNAUTHORIZED, Some("Token expired".to_string()));
        assert_eq!(err.to_string(), "Unauthorized API error (401): Token expired");
        assert_eq!(ApiError::network().to_string(), "Network API error: no message");
    }
}
