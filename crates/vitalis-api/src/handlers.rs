//! Route handler functions for all API endpoints.
//!
//! Handlers only translate HTTP into `AssistRequest`s; the dispatcher does
//! the work.

use std::path::PathBuf;

use axum::extract::multipart::Multipart;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use vitalis_media::save_upload;

use crate::dispatch::{required, AssistReply, AssistRequest, SupportRequest};
use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request bodies
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct TextBody {
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PromptBody {
    pub prompt: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SupportBody {
    pub support_type: Option<String>,
    pub text: Option<String>,
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    /// Personas with a live conversation session.
    pub sessions: Vec<String>,
}

// =============================================================================
// Helpers
// =============================================================================

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e.body_text())))
}

async fn run(state: &AppState, request: AssistRequest) -> Result<Json<AssistReply>, ApiError> {
    Ok(Json(state.dispatcher.dispatch(request).await?))
}

/// Save the multipart `file` field into the uploads directory.
async fn receive_file(state: &AppState, mut multipart: Multipart) -> Result<PathBuf, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;
        let path = save_upload(&state.uploads_dir, &file_name, &data)
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        tracing::info!(path = %path.display(), size_bytes = data.len(), "Received upload");
        return Ok(path);
    }
    Err(ApiError::BadRequest("Missing 'file' upload".to_string()))
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let sessions = state
        .dispatcher
        .registry()
        .live_personas()
        .into_iter()
        .map(|p| p.key().to_string())
        .collect();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        sessions,
    })
}

/// POST /text
pub async fn text(
    State(state): State<AppState>,
    body: Result<Json<TextBody>, JsonRejection>,
) -> Result<Json<AssistReply>, ApiError> {
    let body = json_body(body)?;
    let text = required("text", body.text.as_deref())?;
    run(&state, AssistRequest::Text { text }).await
}

/// POST /voice
pub async fn voice(State(state): State<AppState>) -> Result<Json<AssistReply>, ApiError> {
    run(&state, AssistRequest::Voice).await
}

/// POST /pdf
pub async fn pdf(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AssistReply>, ApiError> {
    let path = receive_file(&state, multipart).await?;
    run(&state, AssistRequest::Pdf { path }).await
}

/// POST /image
pub async fn image(
    State(state): State<AppState>,
    body: Result<Json<PromptBody>, JsonRejection>,
) -> Result<Json<AssistReply>, ApiError> {
    let body = json_body(body)?;
    let prompt = required("prompt", body.prompt.as_deref())?;
    run(&state, AssistRequest::Image { prompt }).await
}

/// POST /audio
pub async fn audio(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AssistReply>, ApiError> {
    let path = receive_file(&state, multipart).await?;
    run(&state, AssistRequest::Audio { path }).await
}

/// POST /video
pub async fn video(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AssistReply>, ApiError> {
    let path = receive_file(&state, multipart).await?;
    run(&state, AssistRequest::Video { path }).await
}

/// POST /health
pub async fn support(
    State(state): State<AppState>,
    body: Result<Json<SupportBody>, JsonRejection>,
) -> Result<Json<AssistReply>, ApiError> {
    let body = json_body(body)?;
    let request = SupportRequest::parse(body.support_type.as_deref(), body.text.as_deref())?;
    run(&state, AssistRequest::Support(request)).await
}

/// POST /financial
pub async fn financial(
    State(state): State<AppState>,
    body: Result<Json<TextBody>, JsonRejection>,
) -> Result<Json<AssistReply>, ApiError> {
    let body = json_body(body)?;
    let text = required("text", body.text.as_deref())?;
    run(&state, AssistRequest::Financial { text }).await
}

/// POST /personalized
pub async fn personalized(
    State(state): State<AppState>,
    body: Result<Json<TextBody>, JsonRejection>,
) -> Result<Json<AssistReply>, ApiError> {
    let body = json_body(body)?;
    let text = required("text", body.text.as_deref())?;
    run(&state, AssistRequest::Personalized { text }).await
}
