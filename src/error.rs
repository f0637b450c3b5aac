//! Error types for the panel client.

use thiserror::Error;

/// Client error type.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server answered with a non-success status.
    #[error("API error ({status}): {}", message.as_deref().unwrap_or("no message"))]
    Api {
        /// HTTP status code.
        status: u16,
        /// `error` field of the response body, when the body carried one.
        message: Option<String>,
    },

    /// Body parsed but lacks the expected shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl Error {
    /// Message supplied by the server, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Api {
                message: Some(message),
                ..
            } => {
                let message = message.trim();
                (!message.is_empty()).then_some(message)
            }
            _ => None,
        }
    }
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;
