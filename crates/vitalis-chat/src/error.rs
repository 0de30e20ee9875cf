//! Error types for conversational sessions.

use vitalis_gemini::GeminiError;

/// Errors from the session layer.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("input cannot be empty")]
    EmptyInput,
    /// The generative backend failed; the session was left unmodified.
    #[error("generative service error: {0}")]
    Service(#[from] GeminiError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(ChatError::EmptyInput.to_string(), "input cannot be empty");

        let err = ChatError::from(GeminiError::Api {
            status: 429,
            message: "quota".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "generative service error: api error (status 429): quota"
        );
    }

    #[test]
    fn test_chat_error_from_gemini_error() {
        let err: ChatError = GeminiError::EmptyResponse.into();
        assert!(matches!(err, ChatError::Service(GeminiError::EmptyResponse)));
    }
}
