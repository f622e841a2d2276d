//! API session error types.

use ecoswap_storage::StorageError;
use thiserror::Error;

/// Failure to exchange a request with the server at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Could not reach the server
    #[error("Connection failed: {0}")]
    Connect(String),

    /// No response within the configured timeout
    #[error("Request timed out")]
    Timeout,

    /// The request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Any other HTTP client failure
    #[error("HTTP error: {0}")]
    Other(String),
}

impl TransportError {
    /// Returns true if sending the same request again may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, TransportError::Connect(_) | TransportError::Timeout)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if e.is_builder() {
            TransportError::InvalidRequest(e.to_string())
        } else {
            TransportError::Other(e.to_string())
        }
    }
}

/// A non-success HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpFailure {
    pub status: u16,
    pub body: String,
}

impl HttpFailure {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// The `error` (or `message`) field of a JSON error body.
    pub fn server_message(&self) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(&self.body).ok()?;
        ["error", "message"]
            .iter()
            .find_map(|field| value.get(field).and_then(|v| v.as_str()))
            .map(str::to_string)
    }
}

impl std::fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.server_message() {
            Some(message) => write!(f, "HTTP {}: {}", self.status, message),
            None if self.body.is_empty() => write!(f, "HTTP {}", self.status),
            None => write!(f, "HTTP {}: {}", self.status, self.body),
        }
    }
}

/// Why a token refresh did not produce a new access token.
///
/// Cloned to every request queued behind the refresh.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshFailure {
    /// The refresh endpoint answered with an error status
    #[error("Refresh rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The refresh call never got a response
    #[error("Refresh request failed: {0}")]
    Network(TransportError),

    /// The response carried no usable access token
    #[error("Malformed refresh response: {0}")]
    MalformedResponse(String),

    /// The refresh call exceeded the configured timeout
    #[error("Refresh timed out")]
    TimedOut,

    /// The new token could not be persisted
    #[error("Could not store refreshed token: {0}")]
    Storage(String),

    /// The caller driving the refresh was dropped before it finished
    #[error("Refresh abandoned")]
    Abandoned,

    /// Logout ended the session while the refresh was in flight
    #[error("Session was cleared during refresh")]
    SessionCleared,
}

impl RefreshFailure {
    /// Returns true if another refresh attempt may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            RefreshFailure::Network(e) => e.is_transient(),
            RefreshFailure::TimedOut | RefreshFailure::Abandoned => true,
            RefreshFailure::Rejected { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns true if the session no longer holds credentials.
    pub fn clears_session(&self) -> bool {
        !matches!(self, RefreshFailure::Abandoned)
    }
}

/// Error returned to callers of the API client.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never got a response
    #[error("Network error: {0}")]
    Network(#[from] TransportError),

    /// `401` that refresh could not fix
    #[error("Unauthorized: {0}")]
    Unauthorized(HttpFailure),

    /// Any other non-success status
    #[error("Request failed: {0}")]
    Status(HttpFailure),

    /// Token refresh failed; the session has been torn down
    #[error("Token refresh failed: {0}")]
    RefreshFailed(#[from] RefreshFailure),

    /// A success response that does not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid state transition in the session FSM
    #[error("Invalid session state transition: {0}")]
    InvalidStateTransition(String),
}

impl ApiError {
    /// HTTP status of the failed response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized(failure) | ApiError::Status(failure) => Some(failure.status),
            ApiError::RefreshFailed(RefreshFailure::Rejected { status, .. }) => Some(*status),
            _ => None,
        }
    }

    /// The server's own error message, for display.
    pub fn server_message(&self) -> Option<String> {
        match self {
            ApiError::Unauthorized(failure) | ApiError::Status(failure) => {
                failure.server_message()
            }
            ApiError::RefreshFailed(RefreshFailure::Rejected { message, .. }) => {
                Some(message.clone())
            }
            _ => None,
        }
    }

    /// Returns true if the user has to sign in again.
    pub fn requires_login(&self) -> bool {
        match self {
            ApiError::Unauthorized(_) => true,
            ApiError::RefreshFailed(failure) => failure.clears_session(),
            _ => false,
        }
    }

    /// Returns true if this error is transient and the operation can be retried.
    ///
    /// Transient errors include:
    /// - Connection failures and timeouts
    /// - 5xx server errors
    /// - A refresh abandoned by another caller
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Network(e) => e.is_transient(),
            ApiError::Status(failure) => failure.status >= 500,
            ApiError::RefreshFailed(RefreshFailure::Abandoned) => true,
            _ => false,
        }
    }
}

/// Result type alias using ApiError.
pub type ApiResult<T> = Result<T, ApiError>;
