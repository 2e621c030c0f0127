//! Authentication error types.

use crew_directory::DataError;
use thiserror::Error;

/// Authentication error type.
#[derive(Error, Debug)]
pub enum AuthError {
    /// No employee record matched a sign-in identifier (zero or ambiguous
    /// matches)
    #[error("No employee found for identifier: {0}")]
    EmployeeNotFound(String),

    /// The identity provider rejected the credentials
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Token refresh failed
    #[error("Token refresh failed: {0}")]
    TokenRefresh(String),

    /// No active session
    #[error("Not signed in")]
    NotSignedIn,

    /// Invalid transition in the session lifecycle FSM
    #[error("Invalid session state transition: {0}")]
    State(String),

    /// Employee directory error
    #[error("Directory error: {0}")]
    Directory(#[from] DataError),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AuthError {
    /// Returns true if this error is transient and the operation can be
    /// retried.
    pub fn is_transient(&self) -> bool {
        match self {
            AuthError::Http(e) => {
                if e.is_connect() || e.is_timeout() {
                    return true;
                }
                if let Some(status) = e.status() {
                    return status.is_server_error();
                }
                false
            }
            AuthError::Directory(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_credentials_is_not_transient() {
        assert!(!AuthError::InvalidCredentials("bad password".to_string()).is_transient());
    }

    #[test]
    fn test_not_found_is_not_transient() {
        assert!(!AuthError::EmployeeNotFound("Jane Doe".to_string()).is_transient());
    }

    #[test]
    fn test_directory_server_error_is_transient() {
        let err = AuthError::Directory(DataError::Api {
            status: 502,
            message: "bad gateway".to_string(),
        });
        assert!(err.is_transient());
    }
}
