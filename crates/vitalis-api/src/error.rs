//! API error types and JSON error response formatting.
//!
//! Every failure is rendered as `{"error": <message>, "code": <code>}` with a
//! status chosen by what went wrong, not where.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use vitalis_chat::ChatError;
use vitalis_media::MediaError;

use crate::dispatch::DispatchError;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable error message.
    pub error: String,
    /// Machine-readable error code (e.g., "invalid_argument").
    pub code: String,
}

#[derive(Debug)]
pub enum ApiError {
    /// 400 - missing or invalid input.
    BadRequest(String),
    /// 422 - the uploaded document could not be read.
    UnprocessableEntity(String),
    /// 502 - a remote service failed.
    BadGateway(String),
    /// 504 - gave up waiting on a remote service.
    GatewayTimeout(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "invalid_argument", msg),
            ApiError::UnprocessableEntity(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "unreadable_document", msg)
            }
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "upstream_error", msg),
            ApiError::GatewayTimeout(msg) => (StatusCode::GATEWAY_TIMEOUT, "upstream_timeout", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), code, error = %message, "Request failed");
        }

        let body = ErrorBody {
            error: message,
            code: code.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        let message = err.to_string();
        match err {
            DispatchError::InvalidArgument(_) | DispatchError::Chat(ChatError::EmptyInput) => {
                ApiError::BadRequest(message)
            }
            DispatchError::Chat(ChatError::Service(_)) => ApiError::BadGateway(message),
            DispatchError::Media(media) => match media {
                MediaError::UnreadableDocument(_) => ApiError::UnprocessableEntity(message),
                MediaError::RemoteGeneration { .. }
                | MediaError::RemoteProcessingFailed { .. }
                | MediaError::Service(_)
                | MediaError::Http(_) => ApiError::BadGateway(message),
                MediaError::PollLimitExceeded { .. } => ApiError::GatewayTimeout(message),
                MediaError::InvalidTransition { .. }
                | MediaError::Capture(_)
                | MediaError::Io(_) => ApiError::Internal(message),
            },
        }
    }
}
