use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, VitalisError};

/// Top-level configuration for the Vitalis service.
///
/// Loaded from `~/.vitalis/config.toml` by default. Each section corresponds
/// to one collaborator or cross-cutting concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VitalisConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub progress: ProgressConfig,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub video: VideoConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
}

impl VitalisConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: VitalisConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject values that would make a component spin or never progress.
    pub fn validate(&self) -> Result<()> {
        if self.progress.interval_ms == 0 {
            return Err(VitalisError::Config(
                "progress.interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.video.poll_interval_secs == 0 {
            return Err(VitalisError::Config(
                "video.poll_interval_secs must be greater than 0".to_string(),
            ));
        }
        if self.video.max_polls == Some(0) {
            return Err(VitalisError::Config(
                "video.max_polls must be greater than 0 when set".to_string(),
            ));
        }
        if self.voice.sample_rate == 0 {
            return Err(VitalisError::Config(
                "voice.sample_rate must be greater than 0".to_string(),
            ));
        }
        if !["spinner", "log", "off"].contains(&self.progress.style.as_str()) {
            return Err(VitalisError::Config(format!(
                "progress.style must be one of: spinner, log, off (got '{}')",
                self.progress.style
            )));
        }
        Ok(())
    }
}

/// Server-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Directory uploaded PDF/audio/video files are written to.
    pub uploads_dir: String,
    /// Maximum request body size in megabytes.
    pub body_limit_mb: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            log_level: "info".to_string(),
            uploads_dir: std::env::temp_dir().to_string_lossy().into_owned(),
            body_limit_mb: 64,
        }
    }
}

/// Generative backend connection and sampling parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key. `GEMINI_API_KEY` in the environment takes precedence.
    pub api_key: String,
    pub base_url: String,
    /// Model used by every conversation session and the audio summarizer.
    pub chat_model: String,
    /// Model used to describe processed videos.
    pub video_model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub response_mime_type: String,
    /// Default HTTP timeout for backend calls, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            chat_model: "gemini-1.5-flash".to_string(),
            video_model: "models/gemini-1.5-pro-latest".to_string(),
            temperature: 1.0,
            top_p: 0.95,
            top_k: 64,
            max_output_tokens: 8192,
            response_mime_type: "text/plain".to_string(),
            request_timeout_secs: 120,
        }
    }
}

/// Console progress reporting while a backend call is in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// "spinner", "log", or "off".
    pub style: String,
    /// Interval between progress signals in milliseconds.
    pub interval_ms: u64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            style: "spinner".to_string(),
            interval_ms: 100,
        }
    }
}

/// Image generation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub endpoint: String,
    pub image_size: String,
    /// File the generated image is written to.
    pub output_path: String,
    /// Open the generated image with the platform viewer.
    pub display: bool,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.gemini.ai/image/generate".to_string(),
            image_size: "512x512".to_string(),
            output_path: "generated_image.png".to_string(),
            display: true,
        }
    }
}

/// Audio summarization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub prompt: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            prompt: "Listen carefully to the following audio file. Provide a brief summary."
                .to_string(),
        }
    }
}

/// Video analysis polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub prompt: String,
    /// Seconds to wait between status polls.
    pub poll_interval_secs: u64,
    /// Give up after this many polls. Unset means poll until a terminal state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_polls: Option<u32>,
    /// Timeout for the description request, in seconds.
    pub describe_timeout_secs: u64,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            prompt: "Describe this video.".to_string(),
            poll_interval_secs: 10,
            max_polls: None,
            describe_timeout_secs: 600,
        }
    }
}

/// Microphone capture and transcription.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Input device name substring, or "default" for the system default.
    pub device_name: String,
    /// Sample rate the capture is resampled to.
    pub sample_rate: u32,
    /// Ambient noise sample length used for calibration.
    pub calibration_ms: u64,
    /// Maximum utterance length in seconds.
    pub phrase_limit_secs: u32,
    /// Speech threshold as a multiple of ambient RMS energy.
    pub energy_ratio: f32,
    /// Lower bound on the speech threshold.
    pub min_energy: f32,
    pub transcription_prompt: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            device_name: "default".to_string(),
            sample_rate: 16_000,
            calibration_ms: 1000,
            phrase_limit_secs: 8,
            energy_ratio: 1.5,
            min_energy: 300.0,
            transcription_prompt:
                "Transcribe the speech in this recording. Reply with the transcript only, or with nothing if no words are spoken."
                    .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = VitalisConfig::default();
        assert_eq!(config.general.host, "0.0.0.0");
        assert_eq!(config.general.port, 5000);
        assert_eq!(config.gemini.chat_model, "gemini-1.5-flash");
        assert_eq!(config.gemini.video_model, "models/gemini-1.5-pro-latest");
        assert_eq!(config.gemini.top_k, 64);
        assert_eq!(config.gemini.max_output_tokens, 8192);
        assert_eq!(config.progress.interval_ms, 100);
        assert_eq!(config.image.image_size, "512x512");
        assert_eq!(config.image.output_path, "generated_image.png");
        assert_eq!(config.video.poll_interval_secs, 10);
        assert_eq!(config.video.describe_timeout_secs, 600);
        assert!(config.video.max_polls.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let content = r#"
[general]
port = 8080

[video]
max_polls = 30
"#;
        let file = create_temp_config(content);
        let config = VitalisConfig::load(file.path()).unwrap();
        assert_eq!(config.general.port, 8080);
        assert_eq!(config.general.host, "0.0.0.0");
        assert_eq!(config.video.max_polls, Some(30));
        assert_eq!(config.video.poll_interval_secs, 10);
        assert_eq!(config.gemini.chat_model, "gemini-1.5-flash");
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = VitalisConfig::load_or_default(Path::new("/nonexistent/config.toml"));
        assert_eq!(config.general.port, 5000);
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("this is {{ not valid TOML");
        assert!(VitalisConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_load_rejects_zero_poll_interval() {
        let file = create_temp_config("[video]\npoll_interval_secs = 0\n");
        let err = VitalisConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("poll_interval_secs"));
    }

    #[test]
    fn test_load_or_default_falls_back_on_invalid_values() {
        let file = create_temp_config("[progress]\nstyle = \"fireworks\"\n");
        let config = VitalisConfig::load_or_default(file.path());
        assert_eq!(config.progress.style, "spinner");
    }

    #[test]
    fn test_voice_device_override() {
        let file = create_temp_config("[voice]\ndevice_name = \"USB Headset\"\n");
        let config = VitalisConfig::load(file.path()).unwrap();
        assert_eq!(config.voice.device_name, "USB Headset");
        assert_eq!(config.voice.sample_rate, 16_000);
    }

    #[test]
    fn test_validate_rejects_zero_max_polls() {
        let mut config = VitalisConfig::default();
        config.video.max_polls = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");

        let mut config = VitalisConfig::default();
        config.general.port = 6001;
        config.video.max_polls = Some(12);
        config.save(&path).unwrap();

        let reloaded = VitalisConfig::load(&path).unwrap();
        assert_eq!(reloaded.general.port, 6001);
        assert_eq!(reloaded.video.max_polls, Some(12));
        assert_eq!(reloaded.voice.device_name, "default");
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let file = create_temp_config("");
        let config = VitalisConfig::load(file.path()).unwrap();
        assert_eq!(config.general.port, 5000);
        assert_eq!(config.audio.prompt, AudioConfig::default().prompt);
        assert_eq!(config.voice.sample_rate, 16_000);
    }
}
