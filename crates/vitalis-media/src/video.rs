//! Video analysis: upload, poll until the backend has processed the file,
//! then ask for a description.
//!
//! Job lifecycle:
//! - Uploading -> Processing | Ready | Failed (state reported by the upload)
//! - Processing -> Processing | Ready | Failed (state reported by each poll)
//!
//! Ready and Failed are terminal.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use vitalis_chat::ProgressReporter;
use vitalis_core::config::VideoConfig;
use vitalis_gemini::{FilePrompt, FileState, GenerativeBackend, RemoteFile};

use crate::error::MediaError;

// =============================================================================
// State machine
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoJobState {
    Uploading,
    Processing,
    Ready,
    Failed,
}

impl fmt::Display for VideoJobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoJobState::Uploading => write!(f, "Uploading"),
            VideoJobState::Processing => write!(f, "Processing"),
            VideoJobState::Ready => write!(f, "Ready"),
            VideoJobState::Failed => write!(f, "Failed"),
        }
    }
}

impl VideoJobState {
    pub fn can_transition_to(&self, target: &VideoJobState) -> bool {
        matches!(
            (self, target),
            (
                VideoJobState::Uploading | VideoJobState::Processing,
                VideoJobState::Processing | VideoJobState::Ready | VideoJobState::Failed
            )
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, VideoJobState::Ready | VideoJobState::Failed)
    }
}

impl From<FileState> for VideoJobState {
    /// Only an explicit `PROCESSING` keeps the job waiting and only `FAILED`
    /// fails it; any other reported state is usable.
    fn from(state: FileState) -> Self {
        match state {
            FileState::Processing => VideoJobState::Processing,
            FileState::Failed => VideoJobState::Failed,
            FileState::Active | FileState::StateUnspecified => VideoJobState::Ready,
        }
    }
}

/// One uploaded video moving through the lifecycle.
#[derive(Debug)]
pub struct VideoJob {
    state: VideoJobState,
    file: Option<RemoteFile>,
    polls: u32,
}

impl Default for VideoJob {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoJob {
    pub fn new() -> Self {
        Self {
            state: VideoJobState::Uploading,
            file: None,
            polls: 0,
        }
    }

    pub fn state(&self) -> VideoJobState {
        self.state
    }

    pub fn polls(&self) -> u32 {
        self.polls
    }

    pub fn file(&self) -> Option<&RemoteFile> {
        self.file.as_ref()
    }

    /// Apply the file status reported by the backend.
    pub fn observe(&mut self, file: RemoteFile) -> Result<VideoJobState, MediaError> {
        let target = VideoJobState::from(file.state);
        if !self.state.can_transition_to(&target) {
            return Err(MediaError::InvalidTransition {
                from: self.state.to_string(),
                to: target.to_string(),
            });
        }
        tracing::debug!(name = %file.name, state = %target, "Video job: {} -> {}", self.state, target);
        if self.state == VideoJobState::Processing {
            self.polls += 1;
        }
        self.state = target;
        self.file = Some(file);
        Ok(target)
    }
}

// =============================================================================
// Sleeper
// =============================================================================

/// Waits between status polls.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

// =============================================================================
// Analyzer
// =============================================================================

/// Drives a `VideoJob` to a terminal state and describes the result.
pub struct VideoAnalyzer {
    backend: Arc<dyn GenerativeBackend>,
    sleeper: Arc<dyn Sleeper>,
    progress: ProgressReporter,
    model: String,
    prompt: String,
    poll_interval: Duration,
    max_polls: Option<u32>,
    describe_timeout: Duration,
}

impl VideoAnalyzer {
    pub fn new(
        backend: Arc<dyn GenerativeBackend>,
        sleeper: Arc<dyn Sleeper>,
        progress: ProgressReporter,
        model: impl Into<String>,
        config: &VideoConfig,
    ) -> Self {
        Self {
            backend,
            sleeper,
            progress,
            model: model.into(),
            prompt: config.prompt.clone(),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            max_polls: config.max_polls,
            describe_timeout: Duration::from_secs(config.describe_timeout_secs),
        }
    }

    /// Upload the video at `path`, wait for processing, and describe it.
    pub async fn describe(&self, path: &Path) -> Result<String, MediaError> {
        let mut job = VideoJob::new();
        let uploaded = self.backend.upload_file(path).await?;
        let name = uploaded.name.clone();
        tracing::info!(name = %name, "Uploaded video");

        let mut state = job.observe(uploaded)?;
        while state == VideoJobState::Processing {
            if let Some(max) = self.max_polls {
                if job.polls() >= max {
                    return Err(MediaError::PollLimitExceeded { name, polls: max });
                }
            }
            self.sleeper.sleep(self.poll_interval).await;
            state = job.observe(self.backend.get_file(&name).await?)?;
        }

        let file = match (state, job.file()) {
            (VideoJobState::Ready, Some(file)) => file,
            _ => {
                tracing::warn!(name = %name, polls = job.polls(), "Video processing failed");
                return Err(MediaError::RemoteProcessingFailed { name });
            }
        };

        tracing::info!(name = %name, polls = job.polls(), "Video ready, requesting description");
        let request = FilePrompt {
            model: Some(&self.model),
            prompt: &self.prompt,
            file,
            timeout: Some(self.describe_timeout),
        };
        let description = self
            .progress
            .track("video", self.backend.generate_from_file(request))
            .await?;
        Ok(description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use vitalis_gemini::{BackendCall, ScriptedBackend};

    #[derive(Default)]
    struct RecordingSleeper {
        waits: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.waits.lock().unwrap().push(duration);
        }
    }

    fn analyzer(
        backend: Arc<ScriptedBackend>,
        sleeper: Arc<RecordingSleeper>,
        config: VideoConfig,
    ) -> VideoAnalyzer {
        VideoAnalyzer::new(
            backend,
            sleeper,
            ProgressReporter::disabled(),
            "models/gemini-1.5-pro-latest",
            &config,
        )
    }

    fn file(state: FileState) -> RemoteFile {
        RemoteFile {
            name: "files/v".to_string(),
            uri: String::new(),
            mime_type: "video/mp4".to_string(),
            state,
        }
    }

    #[test]
    fn test_valid_transitions() {
        use VideoJobState::*;
        for from in [Uploading, Processing] {
            for to in [Processing, Ready, Failed] {
                assert!(from.can_transition_to(&to), "{} -> {}", from, to);
            }
        }
        for from in [Ready, Failed] {
            assert!(from.is_terminal());
            for to in [Uploading, Processing, Ready, Failed] {
                assert!(!from.can_transition_to(&to), "{} -> {}", from, to);
            }
        }
        assert!(!Processing.can_transition_to(&Uploading));
    }

    #[test]
    fn test_file_state_mapping() {
        assert_eq!(VideoJobState::from(FileState::Processing), VideoJobState::Processing);
        assert_eq!(VideoJobState::from(FileState::Active), VideoJobState::Ready);
        assert_eq!(VideoJobState::from(FileState::Failed), VideoJobState::Failed);
        assert_eq!(
            VideoJobState::from(FileState::StateUnspecified),
            VideoJobState::Ready
        );
    }

    #[test]
    fn test_job_counts_polls_and_rejects_after_terminal() {
        let mut job = VideoJob::new();
        job.observe(file(FileState::Processing)).unwrap();
        assert_eq!(job.polls(), 0);
        job.observe(file(FileState::Processing)).unwrap();
        job.observe(file(FileState::Active)).unwrap();
        assert_eq!(job.polls(), 2);
        assert_eq!(job.state(), VideoJobState::Ready);

        let err = job.observe(file(FileState::Processing)).unwrap_err();
        assert!(matches!(err, MediaError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_two_waits_then_one_description() {
        // Upload reports PROCESSING, then the polls report PROCESSING and ACTIVE.
        let backend = Arc::new(
            ScriptedBackend::new().with_file_states([FileState::Processing, FileState::Active]),
        );
        backend.push_reply("A dog runs on a beach.");
        let sleeper = Arc::new(RecordingSleeper::default());
        let analyzer = analyzer(backend.clone(), sleeper.clone(), VideoConfig::default());

        let text = analyzer.describe(Path::new("/tmp/v.mp4")).await.unwrap();
        assert_eq!(text, "A dog runs on a beach.");
        assert_eq!(
            *sleeper.waits.lock().unwrap(),
            vec![Duration::from_secs(10); 2]
        );

        let describes: Vec<_> = backend
            .calls()
            .into_iter()
            .filter(|c| matches!(c, BackendCall::GenerateFromFile { .. }))
            .collect();
        assert_eq!(
            describes,
            vec![BackendCall::GenerateFromFile {
                model: Some("models/gemini-1.5-pro-latest".to_string()),
                prompt: "Describe this video.".to_string(),
                file_name: "files/v.mp4".to_string(),
                timeout: Some(Duration::from_secs(600)),
            }]
        );
    }

    #[tokio::test]
    async fn test_failed_state_skips_description() {
        let backend = Arc::new(
            ScriptedBackend::new().with_file_states([FileState::Processing, FileState::Failed]),
        );
        let sleeper = Arc::new(RecordingSleeper::default());
        let analyzer = analyzer(backend.clone(), sleeper.clone(), VideoConfig::default());

        let err = analyzer.describe(Path::new("/tmp/v.mp4")).await.unwrap_err();
        assert!(matches!(err, MediaError::RemoteProcessingFailed { .. }));
        assert_eq!(sleeper.waits.lock().unwrap().len(), 2);
        assert!(!backend
            .calls()
            .iter()
            .any(|c| matches!(c, BackendCall::GenerateFromFile { .. })));
    }

    #[tokio::test]
    async fn test_poll_limit() {
        let backend = Arc::new(ScriptedBackend::new().with_file_states([FileState::Processing; 5]));
        let sleeper = Arc::new(RecordingSleeper::default());
        let config = VideoConfig {
            max_polls: Some(2),
            ..VideoConfig::default()
        };
        let analyzer = analyzer(backend, sleeper.clone(), config);

        let err = analyzer.describe(Path::new("/tmp/v.mp4")).await.unwrap_err();
        assert!(matches!(err, MediaError::PollLimitExceeded { polls: 2, .. }));
        assert_eq!(sleeper.waits.lock().unwrap().len(), 2);
    }
}
