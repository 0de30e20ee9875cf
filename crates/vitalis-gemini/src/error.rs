//! Backend error types.

use thiserror::Error;

/// Errors that can occur when calling the generative backend.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// HTTP request failed before a response arrived.
    #[error("http request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The model answered without any text part.
    #[error("response contained no text")]
    EmptyResponse,

    /// The response did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
