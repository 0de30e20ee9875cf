//! Gemini REST client.
//!
//! Implements `GenerativeBackend` with `reqwest`: `generateContent` for chat
//! and one-shot prompts, the resumable upload protocol for media files, and
//! file status lookups for the video poller.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::json;
use vitalis_core::config::GeminiConfig;

use crate::error::GeminiError;
use crate::wire::{
    conversation_contents, Content, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig, Part, RemoteFile, UploadResponse,
};
use crate::{ChatRequest, FilePrompt, GenerativeBackend, InlinePrompt};

/// Client for the Gemini REST API.
pub struct GeminiClient {
    http: Client,
    base_url: String,
    api_key: String,
    chat_model: String,
    generation: GenerationConfig,
}

impl GeminiClient {
    /// Build a client from configuration.
    pub fn new(config: &GeminiConfig) -> Result<Self, GeminiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        if config.api_key.is_empty() {
            tracing::warn!("Gemini API key is empty; backend requests will be rejected");
        }

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            chat_model: config.chat_model.clone(),
            generation: GenerationConfig::from(config),
        })
    }

    fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/{}:generateContent",
            self.base_url,
            model_resource(model)
        )
    }

    async fn generate(
        &self,
        model: &str,
        body: &GenerateContentRequest,
        timeout: Option<Duration>,
    ) -> Result<String, GeminiError> {
        let mut req = self
            .http
            .post(self.generate_url(model))
            .query(&[("key", &self.api_key)])
            .json(body);

        if let Some(timeout) = timeout {
            req = req.timeout(timeout);
        }

        let response = check_status(req.send().await?).await?;
        let decoded: GenerateContentResponse = response.json().await?;
        decoded.text().ok_or(GeminiError::EmptyResponse)
    }
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    async fn send_message(&self, request: ChatRequest<'_>) -> Result<String, GeminiError> {
        let body = GenerateContentRequest {
            system_instruction: request.system_instruction.map(Content::instruction),
            contents: conversation_contents(request.history, request.input),
            generation_config: Some(self.generation.clone()),
        };
        tracing::debug!(
            model = %self.chat_model,
            history_turns = request.history.len(),
            "Sending chat message"
        );
        self.generate(&self.chat_model, &body, None).await
    }

    async fn upload_file(&self, path: &Path) -> Result<RemoteFile, GeminiError> {
        let bytes = tokio::fs::read(path).await?;
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        tracing::info!(
            file = %path.display(),
            mime = %mime_type,
            size_bytes = bytes.len(),
            "Uploading file"
        );

        // Step 1: open a resumable upload session.
        let start = self
            .http
            .post(format!("{}/upload/v1beta/files", self.base_url))
            .query(&[("key", &self.api_key)])
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type.as_str())
            .json(&json!({ "file": { "display_name": display_name } }))
            .send()
            .await?;
        let start = check_status(start).await?;

        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| GeminiError::Decode("missing x-goog-upload-url header".to_string()))?
            .to_string();

        // Step 2: send the bytes and finalize.
        let finished = self
            .http
            .post(upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await?;
        let uploaded: UploadResponse = check_status(finished).await?.json().await?;

        tracing::info!(name = %uploaded.file.name, uri = %uploaded.file.uri, "Completed upload");
        Ok(uploaded.file)
    }

    async fn get_file(&self, name: &str) -> Result<RemoteFile, GeminiError> {
        let response = self
            .http
            .get(format!("{}/v1beta/{}", self.base_url, name))
            .query(&[("key", &self.api_key)])
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    async fn generate_from_file(&self, request: FilePrompt<'_>) -> Result<String, GeminiError> {
        let body = GenerateContentRequest {
            system_instruction: None,
            contents: vec![Content::user(vec![
                Part::text(request.prompt),
                Part::file(request.file),
            ])],
            generation_config: Some(self.generation.clone()),
        };
        let model = request.model.unwrap_or(&self.chat_model);
        self.generate(model, &body, request.timeout).await
    }

    async fn generate_from_inline(
        &self,
        request: InlinePrompt<'_>,
    ) -> Result<String, GeminiError> {
        let body = GenerateContentRequest {
            system_instruction: None,
            contents: vec![Content::user(vec![
                Part::text(request.prompt),
                Part::inline(request.mime_type, request.data),
            ])],
            generation_config: Some(self.generation.clone()),
        };
        self.generate(&self.chat_model, &body, None).await
    }
}

/// Turn a non-success response into `GeminiError::Api`.
async fn check_status(response: Response) -> Result<Response, GeminiError> {
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        return Err(GeminiError::Api { status, message });
    }
    Ok(response)
}

/// Normalize a model id to its resource path (`models/<id>`).
fn model_resource(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}
