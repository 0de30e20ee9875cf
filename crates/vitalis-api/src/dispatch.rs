//! Request dispatch: one entry point per input modality.
//!
//! Each `AssistRequest` is routed to its handler and, for conversational
//! inputs, into the persona session that owns it. Input validation happens
//! here so nothing malformed reaches a session.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use vitalis_chat::{ChatError, SessionRegistry};
use vitalis_core::{Persona, SupportType};
use vitalis_media::image::SUCCESS_MESSAGE;
use vitalis_media::{
    AudioSummarizer, ImageGenerator, MediaError, PdfExtractor, VideoAnalyzer, VoiceCapture,
};

// =============================================================================
// Requests
// =============================================================================

/// A validated request for the multi-type support endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportRequest {
    pub support_type: SupportType,
    pub text: String,
}

impl SupportRequest {
    /// Validate raw fields. The support type is checked first.
    pub fn parse(support_type: Option<&str>, text: Option<&str>) -> Result<Self, DispatchError> {
        let support_type = support_type
            .unwrap_or_default()
            .parse::<SupportType>()
            .map_err(|_| DispatchError::InvalidArgument("Invalid support type".to_string()))?;
        let text = required("text", text)?;
        Ok(Self { support_type, text })
    }
}

/// Inbound request, one variant per endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum AssistRequest {
    Text { text: String },
    Voice,
    Pdf { path: PathBuf },
    Image { prompt: String },
    Audio { path: PathBuf },
    Video { path: PathBuf },
    Support(SupportRequest),
    Financial { text: String },
    Personalized { text: String },
}

impl AssistRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            AssistRequest::Text { .. } => "text",
            AssistRequest::Voice => "voice",
            AssistRequest::Pdf { .. } => "pdf",
            AssistRequest::Image { .. } => "image",
            AssistRequest::Audio { .. } => "audio",
            AssistRequest::Video { .. } => "video",
            AssistRequest::Support(_) => "support",
            AssistRequest::Financial { .. } => "financial",
            AssistRequest::Personalized { .. } => "personalized",
        }
    }
}

/// Value of a required field, unchanged. Blank values count as missing.
pub fn required(field: &str, value: Option<&str>) -> Result<String, DispatchError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.to_string()),
        _ => Err(DispatchError::InvalidArgument(format!(
            "Missing required field '{}'",
            field
        ))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssistReply {
    pub response: String,
}

impl AssistReply {
    fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Chat(#[from] ChatError),
    #[error(transparent)]
    Media(#[from] MediaError),
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Media collaborators used by the dispatcher.
pub struct MediaHandlers {
    pub pdf: PdfExtractor,
    pub voice: VoiceCapture,
    pub audio: AudioSummarizer,
    pub image: ImageGenerator,
    pub video: VideoAnalyzer,
}

pub struct Dispatcher {
    registry: Arc<SessionRegistry>,
    media: MediaHandlers,
}

impl Dispatcher {
    pub fn new(registry: Arc<SessionRegistry>, media: MediaHandlers) -> Self {
        Self { registry, media }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub async fn dispatch(&self, request: AssistRequest) -> Result<AssistReply, DispatchError> {
        let kind = request.kind();
        tracing::info!(kind, "Dispatching request");

        let reply = match request {
            AssistRequest::Text { text } => self.converse(Persona::Default, &text).await?,
            AssistRequest::Voice => {
                let input = self.media.voice.listen().await;
                self.converse(Persona::Default, input.text()).await?
            }
            AssistRequest::Pdf { path } => {
                let text = self.media.pdf.extract(path).await?;
                self.converse(Persona::Default, &text).await?
            }
            AssistRequest::Image { prompt } => {
                self.media.image.generate(&prompt).await?;
                AssistReply::new(SUCCESS_MESSAGE)
            }
            AssistRequest::Audio { path } => {
                AssistReply::new(self.media.audio.summarize(&path).await?)
            }
            AssistRequest::Video { path } => {
                AssistReply::new(self.media.video.describe(&path).await?)
            }
            AssistRequest::Support(support) => {
                self.converse(support.support_type.persona(), &support.text)
                    .await?
            }
            AssistRequest::Financial { text } => self.converse(Persona::Financial, &text).await?,
            AssistRequest::Personalized { text } => {
                self.converse(Persona::Personalized, &text).await?
            }
        };
        Ok(reply)
    }

    async fn converse(&self, persona: Persona, input: &str) -> Result<AssistReply, DispatchError> {
        let output = self.registry.send_to(persona, input).await?;
        Ok(AssistReply::new(output))
    }
}
