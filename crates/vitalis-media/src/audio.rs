//! One-shot audio summaries.

use std::path::Path;
use std::sync::Arc;

use vitalis_chat::ProgressReporter;
use vitalis_gemini::{FilePrompt, GenerativeBackend};

use crate::error::MediaError;

/// Uploads an audio file and asks for a brief summary of it.
pub struct AudioSummarizer {
    backend: Arc<dyn GenerativeBackend>,
    progress: ProgressReporter,
    prompt: String,
}

impl AudioSummarizer {
    pub fn new(
        backend: Arc<dyn GenerativeBackend>,
        progress: ProgressReporter,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            progress,
            prompt: prompt.into(),
        }
    }

    /// Summarize the audio at `path`. Records no conversation turn.
    pub async fn summarize(&self, path: &Path) -> Result<String, MediaError> {
        let file = self.backend.upload_file(path).await?;
        tracing::info!(name = %file.name, "Summarizing audio");

        let request = FilePrompt {
            model: None,
            prompt: &self.prompt,
            file: &file,
            timeout: None,
        };
        let summary = self
            .progress
            .track("audio", self.backend.generate_from_file(request))
            .await?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use vitalis_core::config::AudioConfig;
    use vitalis_gemini::{BackendCall, ScriptedBackend};

    #[tokio::test]
    async fn test_upload_then_single_generation() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_reply("A short voicemail about lunch.");
        let prompt = AudioConfig::default().prompt;
        let summarizer =
            AudioSummarizer::new(backend.clone(), ProgressReporter::disabled(), prompt.clone());

        let summary = summarizer.summarize(Path::new("/tmp/memo.mp3")).await.unwrap();
        assert_eq!(summary, "A short voicemail about lunch.");

        let calls = backend.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0],
            BackendCall::UploadFile {
                path: PathBuf::from("/tmp/memo.mp3")
            }
        );
        assert_eq!(
            calls[1],
            BackendCall::GenerateFromFile {
                model: None,
                prompt,
                file_name: "files/memo.mp3".to_string(),
                timeout: None,
            }
        );
    }

    #[test]
    fn test_default_prompt() {
        assert_eq!(
            AudioConfig::default().prompt,
            "Listen carefully to the following audio file. Provide a brief summary."
        );
    }
}
