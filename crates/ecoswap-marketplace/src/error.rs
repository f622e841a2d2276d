//! Error types for marketplace calls.

use ecoswap_session::ApiError;
use thiserror::Error;

/// Errors returned by the marketplace wrappers.
#[derive(Error, Debug)]
pub enum MarketplaceError {
    /// The request failed in the session layer or was answered with an error.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A value outside one of the fixed vocabularies.
    #[error("Invalid {field}: {value:?} (expected one of: {expected})")]
    InvalidValue {
        field: &'static str,
        value: String,
        expected: String,
    },

    /// A request body that cannot be sent as-is.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The server answered 2xx with a body missing expected fields.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MarketplaceError {
    /// Whether the caller has to sign in again before retrying.
    pub fn requires_login(&self) -> bool {
        matches!(self, MarketplaceError::Api(e) if e.requires_login())
    }
}

/// Result type alias using MarketplaceError.
pub type MarketplaceResult<T> = Result<T, MarketplaceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use ecoswap_session::HttpFailure;

    #[test]
    fn test_requires_login_follows_api_error() {
        let err = MarketplaceError::from(ApiError::Unauthorized(HttpFailure::new(401, "")));
        assert!(err.requires_login());

        let err = MarketplaceError::from(ApiError::Status(HttpFailure::new(404, "")));
        assert!(!err.requires_login());

        let err = MarketplaceError::InvalidRequest("empty".into());
        assert!(!err.requires_login());
    }

    #[test]
    fn test_api_error_display_is_transparent() {
        let err = MarketplaceError::from(ApiError::Status(HttpFailure::new(
            400,
            r#"{"error": "Missing title"}"#,
        )));
        assert!(err.to_string().contains("Missing title"));
    }
}
