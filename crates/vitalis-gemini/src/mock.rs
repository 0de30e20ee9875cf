//! Scripted backend for tests.
//!
//! Replies and file states are queued up front; every call is recorded so
//! tests can assert on exactly what reached the backend.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::GeminiError;
use crate::wire::{FileState, RemoteFile};
use crate::{ChatRequest, FilePrompt, GenerativeBackend, InlinePrompt};

/// A call observed by `ScriptedBackend`.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    SendMessage {
        system_instruction: Option<String>,
        history_len: usize,
        input: String,
    },
    UploadFile {
        path: PathBuf,
    },
    GetFile {
        name: String,
    },
    GenerateFromFile {
        model: Option<String>,
        prompt: String,
        file_name: String,
        timeout: Option<Duration>,
    },
    GenerateFromInline {
        prompt: String,
        mime_type: String,
        bytes: usize,
    },
}

/// Deterministic `GenerativeBackend`.
///
/// With nothing queued, chat replies echo the input (`"echo: <input>"`),
/// generation replies echo the prompt (`"generated: <prompt>"`), and file
/// lookups report `ACTIVE`.
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String, GeminiError>>>,
    file_states: Mutex<VecDeque<FileState>>,
    calls: Mutex<Vec<BackendCall>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    pub fn push_reply(&self, text: impl Into<String>) {
        lock(&self.replies).push_back(Ok(text.into()));
    }

    /// Queue a failure.
    pub fn push_error(&self, error: GeminiError) {
        lock(&self.replies).push_back(Err(error));
    }

    /// Queue the states returned by successive `get_file` calls.
    pub fn with_file_states(self, states: impl IntoIterator<Item = FileState>) -> Self {
        lock(&self.file_states).extend(states);
        self
    }

    /// All calls observed so far.
    pub fn calls(&self) -> Vec<BackendCall> {
        lock(&self.calls).clone()
    }

    fn record(&self, call: BackendCall) {
        lock(&self.calls).push(call);
    }

    fn next_reply(&self, fallback: String) -> Result<String, GeminiError> {
        lock(&self.replies).pop_front().unwrap_or(Ok(fallback))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

fn remote_file(name: &str, state: FileState) -> RemoteFile {
    RemoteFile {
        name: name.to_string(),
        uri: format!("https://mock.invalid/{}", name),
        mime_type: "application/octet-stream".to_string(),
        state,
    }
}

#[async_trait]
impl GenerativeBackend for ScriptedBackend {
    async fn send_message(&self, request: ChatRequest<'_>) -> Result<String, GeminiError> {
        self.record(BackendCall::SendMessage {
            system_instruction: request.system_instruction.map(str::to_string),
            history_len: request.history.len(),
            input: request.input.to_string(),
        });
        self.next_reply(format!("echo: {}", request.input))
    }

    async fn upload_file(&self, path: &Path) -> Result<RemoteFile, GeminiError> {
        self.record(BackendCall::UploadFile {
            path: path.to_path_buf(),
        });
        let stem = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut file = remote_file(&format!("files/{}", stem), FileState::Processing);
        if let Some(mime) = mime_guess::from_path(path).first() {
            file.mime_type = mime.essence_str().to_string();
        }
        Ok(file)
    }

    async fn get_file(&self, name: &str) -> Result<RemoteFile, GeminiError> {
        self.record(BackendCall::GetFile {
            name: name.to_string(),
        });
        let state = lock(&self.file_states)
            .pop_front()
            .unwrap_or(FileState::Active);
        Ok(remote_file(name, state))
    }

    async fn generate_from_file(&self, request: FilePrompt<'_>) -> Result<String, GeminiError> {
        self.record(BackendCall::GenerateFromFile {
            model: request.model.map(str::to_string),
            prompt: request.prompt.to_string(),
            file_name: request.file.name.clone(),
            timeout: request.timeout,
        });
        self.next_reply(format!("generated: {}", request.prompt))
    }

    async fn generate_from_inline(
        &self,
        request: InlinePrompt<'_>,
    ) -> Result<String, GeminiError> {
        self.record(BackendCall::GenerateFromInline {
            prompt: request.prompt.to_string(),
            mime_type: request.mime_type.to_string(),
            bytes: request.data.len(),
        });
        self.next_reply(format!("generated: {}", request.prompt))
    }
}
