//! Error types for directory operations.

use thiserror::Error;

/// Data access error type.
#[derive(Error, Debug)]
pub enum DataError {
    /// HTTP request error (connection, TLS, timeouts)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The REST API returned a non-success status
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A uniqueness constraint would be violated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}

impl DataError {
    /// Returns true if this error is transient and the operation can be retried.
    pub fn is_transient(&self) -> bool {
        match self {
            DataError::Http(e) => {
                if e.is_connect() || e.is_timeout() {
                    return true;
                }
                if let Some(status) = e.status() {
                    return status.is_server_error();
                }
                false
            }
            DataError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Result type for directory operations.
pub type DataResult<T> = Result<T, DataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_is_transient() {
        let err = DataError::Api {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert!(err.is_transient());
    }

    #[test]
    fn test_client_error_is_not_transient() {
        let err = DataError::Api {
            status: 409,
            message: "duplicate".to_string(),
        };
        assert!(!err.is_transient());
    }

    #[test]
    fn test_conflict_is_not_transient() {
        assert!(!DataError::Conflict("name taken".to_string()).is_transient());
    }
}
