//! One-shot voice input: calibrate, capture one utterance, transcribe.
//!
//! Recognition problems never fail a request. They are downgraded to fixed
//! sentinel sentences that flow into the conversation like any other input.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use vitalis_core::config::VoiceConfig;
use vitalis_gemini::{GenerativeBackend, InlinePrompt};

use crate::error::MediaError;

pub const NOT_UNDERSTOOD: &str = "Sorry, I did not understand that.";
pub const SERVICE_UNAVAILABLE: &str =
    "Sorry, there was an error with the speech recognition service.";

/// Length of one energy frame.
const FRAME_MS: u32 = 30;

// =============================================================================
// Result
// =============================================================================

/// Outcome of one listen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceInput {
    Recognized(String),
    NotUnderstood,
    ServiceUnavailable,
}

impl VoiceInput {
    /// Text forwarded to the conversation.
    pub fn text(&self) -> &str {
        match self {
            VoiceInput::Recognized(text) => text,
            VoiceInput::NotUnderstood => NOT_UNDERSTOOD,
            VoiceInput::ServiceUnavailable => SERVICE_UNAVAILABLE,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            VoiceInput::Recognized(text) => text,
            other => other.text().to_string(),
        }
    }
}

// =============================================================================
// Traits
// =============================================================================

/// Records 16-bit mono PCM.
#[async_trait]
pub trait Microphone: Send + Sync {
    fn sample_rate(&self) -> u32;

    async fn record(&self, duration: Duration) -> Result<Vec<i16>, MediaError>;
}

/// Speech-to-text engine.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe PCM samples. An empty string means nothing was recognized.
    async fn transcribe(&self, samples: &[i16], sample_rate: u32) -> Result<String, MediaError>;
}

// =============================================================================
// Capture
// =============================================================================

/// Calibrated single-utterance capture.
pub struct VoiceCapture {
    microphone: Arc<dyn Microphone>,
    transcriber: Arc<dyn Transcriber>,
    calibration: Duration,
    phrase_limit: Duration,
    energy_ratio: f32,
    min_energy: f32,
}

impl VoiceCapture {
    pub fn new(
        microphone: Arc<dyn Microphone>,
        transcriber: Arc<dyn Transcriber>,
        config: &VoiceConfig,
    ) -> Self {
        Self {
            microphone,
            transcriber,
            calibration: Duration::from_millis(config.calibration_ms),
            phrase_limit: Duration::from_secs(u64::from(config.phrase_limit_secs)),
            energy_ratio: config.energy_ratio,
            min_energy: config.min_energy,
        }
    }

    /// Listen for one utterance.
    pub async fn listen(&self) -> VoiceInput {
        match self.try_listen().await {
            Ok(input) => input,
            Err(e) => {
                tracing::warn!(error = %e, "Speech recognition unavailable");
                VoiceInput::ServiceUnavailable
            }
        }
    }

    async fn try_listen(&self) -> Result<VoiceInput, MediaError> {
        let rate = self.microphone.sample_rate();

        let ambient = self.microphone.record(self.calibration).await?;
        let threshold = (rms(&ambient) * self.energy_ratio).max(self.min_energy);
        tracing::debug!(threshold, "Calibrated for ambient noise");

        let recording = self.microphone.record(self.phrase_limit).await?;
        let Some(utterance) = trim_silence(&recording, frame_len(rate), threshold) else {
            tracing::info!("No speech above the ambient threshold");
            return Ok(VoiceInput::NotUnderstood);
        };

        let transcript = self.transcriber.transcribe(utterance, rate).await?;
        let transcript = transcript.trim();
        if transcript.is_empty() {
            return Ok(VoiceInput::NotUnderstood);
        }
        tracing::info!(chars = transcript.len(), "Recognized speech");
        Ok(VoiceInput::Recognized(transcript.to_string()))
    }
}

fn frame_len(sample_rate: u32) -> usize {
    ((sample_rate * FRAME_MS) / 1000).max(1) as usize
}

/// Root-mean-square amplitude.
fn rms(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
    (sum / samples.len() as f64).sqrt() as f32
}

/// Strip leading and trailing frames whose energy is below `threshold`.
fn trim_silence(samples: &[i16], frame: usize, threshold: f32) -> Option<&[i16]> {
    let frames: Vec<&[i16]> = samples.chunks(frame).collect();
    let loud = |f: &&[i16]| rms(f) >= threshold;
    let first = frames.iter().position(loud)?;
    let last = frames.iter().rposition(loud)?;
    let start = first * frame;
    let end = ((last + 1) * frame).min(samples.len());
    Some(&samples[start..end])
}

// =============================================================================
// Production collaborators
// =============================================================================

/// Transcriber that sends the utterance inline to the generative backend.
pub struct GeminiTranscriber {
    backend: Arc<dyn GenerativeBackend>,
    prompt: String,
}

impl GeminiTranscriber {
    pub fn new(backend: Arc<dyn GenerativeBackend>, prompt: impl Into<String>) -> Self {
        Self {
            backend,
            prompt: prompt.into(),
        }
    }
}

#[async_trait]
impl Transcriber for GeminiTranscriber {
    async fn transcribe(&self, samples: &[i16], sample_rate: u32) -> Result<String, MediaError> {
        let wav = encode_wav(samples, sample_rate);
        let text = self
            .backend
            .generate_from_inline(InlinePrompt {
                prompt: &self.prompt,
                mime_type: "audio/wav",
                data: &wav,
            })
            .await?;
        Ok(text)
    }
}

/// Encode 16-bit mono PCM as a WAV file.
pub fn encode_wav(samples: &[i16], sample_rate: u32) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&1u16.to_le_bytes()); // mono
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use vitalis_gemini::{BackendCall, ScriptedBackend};

    const RATE: u32 = 16_000;

    /// Plays back queued recordings.
    struct ScriptedMicrophone {
        recordings: Mutex<VecDeque<Result<Vec<i16>, MediaError>>>,
    }

    impl ScriptedMicrophone {
        fn new(recordings: Vec<Result<Vec<i16>, MediaError>>) -> Self {
            Self {
                recordings: Mutex::new(recordings.into()),
            }
        }
    }

    #[async_trait]
    impl Microphone for ScriptedMicrophone {
        fn sample_rate(&self) -> u32 {
            RATE
        }

        async fn record(&self, _duration: Duration) -> Result<Vec<i16>, MediaError> {
            self.recordings
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    struct FixedTranscriber(Result<&'static str, ()>);

    #[async_trait]
    impl Transcriber for FixedTranscriber {
        async fn transcribe(&self, samples: &[i16], _rate: u32) -> Result<String, MediaError> {
            assert!(!samples.is_empty());
            match self.0 {
                Ok(text) => Ok(text.to_string()),
                Err(()) => Err(MediaError::Capture("engine offline".to_string())),
            }
        }
    }

    fn quiet(n: usize) -> Vec<i16> {
        vec![20; n]
    }

    fn loud(n: usize) -> Vec<i16> {
        (0..n).map(|i| if i % 2 == 0 { 8000 } else { -8000 }).collect()
    }

    fn capture(
        recordings: Vec<Result<Vec<i16>, MediaError>>,
        transcriber: FixedTranscriber,
    ) -> VoiceCapture {
        VoiceCapture::new(
            Arc::new(ScriptedMicrophone::new(recordings)),
            Arc::new(transcriber),
            &VoiceConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_recognized_speech() {
        let utterance = [quiet(960), loud(4800), quiet(960)].concat();
        let voice = capture(
            vec![Ok(quiet(16_000)), Ok(utterance)],
            FixedTranscriber(Ok("  I feel tired  ")),
        );
        assert_eq!(
            voice.listen().await,
            VoiceInput::Recognized("I feel tired".to_string())
        );
    }

    #[tokio::test]
    async fn test_silence_is_not_understood() {
        let voice = capture(
            vec![Ok(quiet(16_000)), Ok(quiet(32_000))],
            FixedTranscriber(Ok("unused")),
        );
        let input = voice.listen().await;
        assert_eq!(input, VoiceInput::NotUnderstood);
        assert_eq!(input.text(), "Sorry, I did not understand that.");
    }

    #[tokio::test]
    async fn test_empty_transcript_is_not_understood() {
        let voice = capture(
            vec![Ok(quiet(16_000)), Ok(loud(4800))],
            FixedTranscriber(Ok("")),
        );
        assert_eq!(voice.listen().await, VoiceInput::NotUnderstood);
    }

    #[tokio::test]
    async fn test_engine_failure_is_service_unavailable() {
        let voice = capture(
            vec![Ok(quiet(16_000)), Ok(loud(4800))],
            FixedTranscriber(Err(())),
        );
        let input = voice.listen().await;
        assert_eq!(input, VoiceInput::ServiceUnavailable);
        assert_eq!(
            input.into_text(),
            "Sorry, there was an error with the speech recognition service."
        );
    }

    #[tokio::test]
    async fn test_microphone_failure_is_service_unavailable() {
        let voice = capture(
            vec![Err(MediaError::Capture("no device".to_string()))],
            FixedTranscriber(Ok("unused")),
        );
        assert_eq!(voice.listen().await, VoiceInput::ServiceUnavailable);
    }

    #[test]
    fn test_trim_silence_keeps_loud_frames() {
        let samples = [quiet(480), loud(480), quiet(480)].concat();
        let trimmed = trim_silence(&samples, 480, 300.0).unwrap();
        assert_eq!(trimmed.len(), 480);
        assert_eq!(trimmed[0], 8000);
        assert!(trim_silence(&quiet(960), 480, 300.0).is_none());
    }

    #[test]
    fn test_encode_wav_header() {
        let wav = encode_wav(&[1, -1], RATE);
        assert_eq!(wav.len(), 48);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]), RATE);
        assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]), 4);
    }

    #[tokio::test]
    async fn test_gemini_transcriber_sends_wav_inline() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_reply("hello there");
        let transcriber = GeminiTranscriber::new(backend.clone(), "Transcribe this.");

        let text = transcriber.transcribe(&loud(100), RATE).await.unwrap();
        assert_eq!(text, "hello there");
        assert_eq!(
            backend.calls(),
            vec![BackendCall::GenerateFromInline {
                prompt: "Transcribe this.".to_string(),
                mime_type: "audio/wav".to_string(),
                bytes: 244,
            }]
        );
    }
}
