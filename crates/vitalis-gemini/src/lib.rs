//! Vitalis Gemini crate - generative backend abstraction and REST client.
//!
//! Defines the `GenerativeBackend` trait every session and media handler
//! talks to, the `GeminiClient` that implements it over the Gemini REST API,
//! and a `ScriptedBackend` for tests that need deterministic replies.

pub mod client;
pub mod error;
pub mod mock;
pub mod wire;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use vitalis_core::Turn;

pub use client::GeminiClient;
pub use error::GeminiError;
pub use mock::{BackendCall, ScriptedBackend};
pub use wire::{FileState, RemoteFile};

// =============================================================================
// Request types
// =============================================================================

/// A message sent into a multi-turn conversation.
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    /// Persona instruction fixed at session creation.
    pub system_instruction: Option<&'a str>,
    /// Prior turns, oldest first.
    pub history: &'a [Turn],
    pub input: &'a str,
}

/// One-shot generation over an uploaded file.
#[derive(Debug, Clone, Copy)]
pub struct FilePrompt<'a> {
    /// Model override; the backend's chat model is used when `None`.
    pub model: Option<&'a str>,
    pub prompt: &'a str,
    pub file: &'a RemoteFile,
    /// Per-request timeout overriding the client default.
    pub timeout: Option<Duration>,
}

/// One-shot generation over bytes sent inline with the request.
#[derive(Debug, Clone, Copy)]
pub struct InlinePrompt<'a> {
    pub prompt: &'a str,
    pub mime_type: &'a str,
    pub data: &'a [u8],
}

// =============================================================================
// Trait
// =============================================================================

/// Generative-AI backend consumed by sessions and media handlers.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Send `input` into a conversation and return the model's reply.
    async fn send_message(&self, request: ChatRequest<'_>) -> Result<String, GeminiError>;

    /// Upload a local file for use in later generation requests.
    async fn upload_file(&self, path: &Path) -> Result<RemoteFile, GeminiError>;

    /// Fetch the current processing state of an uploaded file.
    async fn get_file(&self, name: &str) -> Result<RemoteFile, GeminiError>;

    /// Generate text from a prompt plus an uploaded file reference.
    async fn generate_from_file(&self, request: FilePrompt<'_>) -> Result<String, GeminiError>;

    /// Generate text from a prompt plus inline bytes.
    async fn generate_from_inline(&self, request: InlinePrompt<'_>)
        -> Result<String, GeminiError>;
}
