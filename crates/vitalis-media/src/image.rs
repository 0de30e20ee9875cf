//! Prompt-to-image generation through a REST endpoint.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use vitalis_core::config::ImageConfig;

use crate::error::MediaError;

/// Acknowledgment returned to the caller once an image is written.
pub const SUCCESS_MESSAGE: &str = "Image generated successfully.";

/// Raw answer of the image endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReply {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Transport to the image generation endpoint.
#[async_trait]
pub trait ImageApi: Send + Sync {
    async fn generate(&self, prompt: &str, image_size: &str) -> Result<ImageReply, MediaError>;
}

/// Shows a generated image to the local user.
pub trait ImageViewer: Send + Sync {
    fn show(&self, path: &Path) -> Result<(), MediaError>;
}

// =============================================================================
// Generator
// =============================================================================

pub struct ImageGenerator {
    api: Arc<dyn ImageApi>,
    viewer: Option<Arc<dyn ImageViewer>>,
    image_size: String,
    output_path: PathBuf,
}

impl ImageGenerator {
    pub fn new(
        api: Arc<dyn ImageApi>,
        viewer: Option<Arc<dyn ImageViewer>>,
        config: &ImageConfig,
    ) -> Self {
        Self {
            api,
            viewer,
            image_size: config.image_size.clone(),
            output_path: PathBuf::from(&config.output_path),
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Generate an image for `prompt`, write it and display it.
    ///
    /// Only a 200 reply writes the file; anything else fails with the
    /// endpoint's status and body.
    pub async fn generate(&self, prompt: &str) -> Result<PathBuf, MediaError> {
        let reply = self.api.generate(prompt, &self.image_size).await?;
        if reply.status != 200 {
            let body = String::from_utf8_lossy(&reply.body).into_owned();
            tracing::warn!(status = reply.status, "Image endpoint rejected the request");
            return Err(MediaError::RemoteGeneration {
                status: reply.status,
                body,
            });
        }

        tokio::fs::write(&self.output_path, &reply.body).await?;
        tracing::info!(
            path = %self.output_path.display(),
            size_bytes = reply.body.len(),
            "Wrote generated image"
        );

        if let Some(viewer) = &self.viewer {
            if let Err(e) = viewer.show(&self.output_path) {
                tracing::warn!(error = %e, "Could not display generated image");
            }
        }
        Ok(self.output_path.clone())
    }
}

// =============================================================================
// Production collaborators
// =============================================================================

/// `ImageApi` over HTTP with bearer authentication.
pub struct HttpImageApi {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpImageApi {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl ImageApi for HttpImageApi {
    async fn generate(&self, prompt: &str, image_size: &str) -> Result<ImageReply, MediaError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&json!({ "prompt": prompt, "image_size": image_size }))
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok(ImageReply { status, body })
    }
}

/// Opens images with an external opener command.
///
/// Defaults to the platform's opener (`xdg-open`, `open`, or `cmd /C start`).
/// Each spawned opener is awaited on a background task so it never lingers
/// as a zombie.
#[derive(Debug, Clone)]
pub struct SystemViewer {
    program: String,
    args: Vec<String>,
}

impl Default for SystemViewer {
    fn default() -> Self {
        let (program, args): (&str, &[&str]) = if cfg!(target_os = "windows") {
            ("cmd", &["/C", "start", ""])
        } else if cfg!(target_os = "macos") {
            ("open", &[])
        } else {
            ("xdg-open", &[])
        };
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl SystemViewer {
    /// Use `program <path>` instead of the platform opener.
    pub fn with_opener(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }
}

impl ImageViewer for SystemViewer {
    fn show(&self, path: &Path) -> Result<(), MediaError> {
        let mut child = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(std::process::Stdio::null())
            .spawn()?;
        let program = self.program.clone();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if !status.success() => {
                    tracing::debug!(program = %program, %status, "Image opener exited with failure")
                }
                Ok(_) => {}
                Err(e) => tracing::debug!(program = %program, error = %e, "Image opener wait failed"),
            }
        });
        Ok(())
    }
}
