//! Vitalis API crate - axum HTTP server, route handlers, request dispatch.
//!
//! Exposes one endpoint per input modality (text, voice, PDF, image, audio,
//! video) plus the persona endpoints, and a liveness check.

pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use dispatch::{AssistReply, AssistRequest, DispatchError, Dispatcher, MediaHandlers, SupportRequest};
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
