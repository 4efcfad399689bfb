//! Backend error types

use thiserror::Error;

/// Failure of an identity or calendar call
#[derive(Debug, Error)]
#[error("{message}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Network, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Auth, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Rejected, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::ServerError, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Unknown, message)
    }

    /// Classify a non-success HTTP status from a provider
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 | 403 => Self::auth(format!("Authentication failed: {body}")),
            400..=499 => Self::rejected(format!("Request rejected ({status}): {body}")),
            500..=599 => Self::server_error(format!("Server error ({status}): {body}")),
            _ => Self::unknown(format!("HTTP {status}: {body}")),
        }
    }

    /// Classify a transport failure from reqwest
    pub fn from_transport(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::network(format!("Request timeout: {e}"))
        } else if e.is_connect() {
            Self::network(format!("Connection failed: {e}"))
        } else {
            Self::unknown(format!("Request failed: {e}"))
        }
    }
}

/// Error classification, used for logging only. Nothing is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// Timeouts and connection failures
    Network,
    /// Credential missing, expired or refused (401, 403)
    Auth,
    /// Provider refused the request contents (other 4xx)
    Rejected,
    /// Provider failure (5xx)
    ServerError,
    Unknown,
}
