//! Dynatrace client errors

use thiserror::Error;

/// Errors that can occur when interacting with the Dynatrace API
#[derive(Debug, Error)]
pub enum DynatraceError {
    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Dynatrace API returned a non-success status
    #[error("Dynatrace API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body or error message
        message: String,
    },

    /// Authentication failed (invalid token, missing scope, etc.)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Response was well-formed but did not carry the expected data
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
