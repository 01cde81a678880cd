//! # Backend Error Types Module
//!
//! Error taxonomy for calls against the backend API. Transport failures are
//! generic and retriable for reads, domain rejections carry the backend's own
//! message and reach the user verbatim, protocol errors mean the two sides
//! disagree about the wire format.

/// Failures of a backend API call.
#[derive(Debug, Clone)]
pub enum BackendError {
    /// Backend unreachable or the connection failed mid-request
    Transport(String),
    /// The request ran past the configured deadline
    Timeout(String),
    /// The backend understood the request and refused it
    Domain(String),
    /// A response body that could not be decoded
    Protocol(String),
}

impl BackendError {
    /// Transport-level failures may be retried for idempotent reads.
    /// Mutating calls are never retried regardless of this flag.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BackendError::Transport(_) | BackendError::Timeout(_)
        )
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::Transport(msg) => write!(f, "Transport error: {msg}"),
            BackendError::Timeout(msg) => write!(f, "Timeout error: {msg}"),
            BackendError::Domain(msg) => write!(f, "Domain rejection: {msg}"),
            BackendError::Protocol(msg) => write!(f, "Protocol error: {msg}"),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BackendError::Timeout(err.to_string())
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}
