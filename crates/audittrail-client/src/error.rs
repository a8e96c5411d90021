//! Error types for the AuditTrail client

use audittrail_model::ModelError;
use thiserror::Error;

/// Errors returned by client operations
///
/// `Clone` so a shared in-flight read can hand one failure to every waiter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Server answered 401; the stored token has been cleared
    #[error("Unauthorized")]
    Unauthorized,

    /// 4xx with a structured body
    #[error("{message}")]
    Validation {
        /// HTTP status
        status: u16,
        /// Server-supplied message
        message: String,
    },

    /// 5xx, or any failure status without a JSON body
    #[error("{message}")]
    Server {
        /// HTTP status
        status: u16,
        /// Server-supplied or synthesized message
        message: String,
    },

    /// Request never produced a response
    #[error("Network error: {0}")]
    Transport(String),

    /// Response body did not match the expected shape
    #[error("Invalid response: {0}")]
    Decode(String),

    /// Read on a query key whose id is empty
    #[error("Query '{0}' is disabled")]
    Disabled(String),

    /// Local precondition failed before sending
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Bad configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Token store could not be read or written
    #[error("Token storage error: {0}")]
    Storage(String),
}

impl ApiError {
    /// Classify a failure status
    #[must_use]
    pub fn from_status(status: u16, message: String, structured: bool) -> Self {
        match status {
            401 => ApiError::Unauthorized,
            400..=499 if structured => ApiError::Validation { status, message },
            _ => ApiError::Server { status, message },
        }
    }

    /// HTTP status, when the server answered
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::Validation { status, .. } | ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if this is an authentication failure
    #[inline]
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    /// Check if the request was rejected locally, before any network call
    #[inline]
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(self, ApiError::Model(_) | ApiError::Disabled(_) | ApiError::Config(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Storage(err.to_string())
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use audittrail_model::CaseStatus;

    #[test]
    fn unauthorized_message() {
        assert_eq!(ApiError::Unauthorized.to_string(), "Unauthorized");
    }

    #[test]
    fn status_classification() {
        assert!(matches!(
            ApiError::from_status(422, "bad".into(), true),
            ApiError::Validation { status: 422, .. }
        ));
        assert!(matches!(
            ApiError::from_status(404, "Request failed with status 404".into(), false),
            ApiError::Server { status: 404, .. }
        ));
        assert!(matches!(
            ApiError::from_status(500, "boom".into(), true),
            ApiError::Server { status: 500, .. }
        ));
        assert_eq!(ApiError::from_status(401, String::new(), true), ApiError::Unauthorized);
    }

    #[test]
    fn model_errors_are_local() {
        let err: ApiError = ModelError::invalid_transition(CaseStatus::Closed, CaseStatus::Active).into();
        assert!(err.is_local());
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "Cannot transition from 'closed' to 'active'");
    }
}
