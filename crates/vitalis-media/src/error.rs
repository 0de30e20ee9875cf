//! Media handler error types.

use thiserror::Error;
use vitalis_gemini::GeminiError;

/// Errors raised while turning an uploaded artifact into text or an action.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The document could not be opened or parsed.
    #[error("unreadable document: {0}")]
    UnreadableDocument(String),

    /// The image API answered with a non-success status.
    #[error("image generation failed (status {status}): {body}")]
    RemoteGeneration { status: u16, body: String },

    /// The backend reported the uploaded file as failed.
    #[error("remote processing failed for {name}")]
    RemoteProcessingFailed { name: String },

    #[error("file {name} still processing after {polls} polls")]
    PollLimitExceeded { name: String, polls: u32 },

    #[error("invalid video job transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("audio capture failed: {0}")]
    Capture(String),

    #[error("generative service error: {0}")]
    Service(#[from] GeminiError),

    #[error("image request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_error_display() {
        let err = MediaError::RemoteGeneration {
            status: 401,
            body: "unauthorized".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "image generation failed (status 401): unauthorized"
        );

        let err = MediaError::RemoteProcessingFailed {
            name: "files/abc".to_string(),
        };
        assert_eq!(err.to_string(), "remote processing failed for files/abc");

        let err = MediaError::PollLimitExceeded {
            name: "files/abc".to_string(),
            polls: 3,
        };
        assert_eq!(err.to_string(), "file files/abc still processing after 3 polls");
    }

    #[test]
    fn test_media_error_from_gemini_error() {
        let err: MediaError = GeminiError::EmptyResponse.into();
        assert!(matches!(err, MediaError::Service(GeminiError::EmptyResponse)));
    }
}
