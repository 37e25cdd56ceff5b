//! Error types for backend access.

use thiserror::Error;

/// Errors raised while talking to the monitoring backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend rejected the login or the token was missing.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The backend answered with a non-success HTTP status.
    #[error("Backend returned status {status} for {resource}")]
    Status { status: u16, resource: String },

    /// HTTP request failed before a response was received.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Connection to the backend could not be established.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The request hit the client timeout.
    #[error("Request timed out")]
    Timeout,

    /// The response body was not the expected JSON shape.
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BackendError::Timeout
        } else if err.is_connect() {
            BackendError::Connection(err.to_string())
        } else if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else {
            BackendError::Http(err.to_string())
        }
    }
}
