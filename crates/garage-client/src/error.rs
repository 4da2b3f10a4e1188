//! Garage client errors

use thiserror::Error;

/// Errors that can occur when interacting with the Garage Admin API
#[derive(Debug, Error)]
pub enum GarageError {
    /// Transport failure (connect, timeout, TLS, body read)
    #[error("{operation}: HTTP error: {source}")]
    Http {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Garage answered with a non-2xx status; the body is kept verbatim
    #[error("{operation}: Garage API error ({status}): {body}")]
    Api {
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// Garage answered 404
    #[error("{operation}: not found: {body}")]
    NotFound {
        operation: &'static str,
        body: String,
    },

    /// Response body could not be decoded
    #[error("{operation}: serialization error: {source}")]
    Serialization {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Authentication failed (invalid or expired admin token)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Invalid request (e.g., missing required fields)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl GarageError {
    /// True when the external system reported the object as absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Name of the operation that failed, when known.
    #[must_use]
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            Self::Http { operation, .. }
            | Self::Api { operation, .. }
            | Self::NotFound { operation, .. }
            | Self::Serialization { operation, .. } => Some(operation),
            Self::Authentication(_) | Self::InvalidRequest(_) => None,
        }
    }
}
