//! Microphone capture via cpal.
//!
//! Opens the configured input device at its preferred format, buffers the
//! stream for the requested duration, then downmixes and resamples to mono
//! 16-bit PCM at the configured rate.

use std::time::Duration;

use async_trait::async_trait;
use vitalis_core::config::VoiceConfig;

use crate::error::MediaError;
use crate::voice::Microphone;

/// Microphone backed by a cpal input stream.
#[derive(Debug, Clone)]
pub struct CpalMicrophone {
    /// Substring of the input device name, or "default".
    device_name: String,
    sample_rate: u32,
}

impl CpalMicrophone {
    pub fn from_config(config: &VoiceConfig) -> Self {
        Self {
            device_name: config.device_name.clone(),
            sample_rate: config.sample_rate,
        }
    }
}

#[async_trait]
impl Microphone for CpalMicrophone {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    async fn record(&self, duration: Duration) -> Result<Vec<i16>, MediaError> {
        let mic = self.clone();
        // The stream lives and dies on one blocking thread; cpal streams are not Send everywhere.
        tokio::task::spawn_blocking(move || mic.capture(duration))
            .await
            .map_err(|e| MediaError::Capture(format!("capture task failed: {}", e)))?
    }
}

impl CpalMicrophone {
    #[cfg(feature = "microphone")]
    fn capture(&self, duration: Duration) -> Result<Vec<i16>, MediaError> {
        use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
        use std::sync::{Arc, Mutex};

        let host = cpal::default_host();
        let device = if self.device_name == "default" {
            host.default_input_device()
                .ok_or_else(|| MediaError::Capture("No default input device found".into()))?
        } else {
            let wanted = self.device_name.to_lowercase();
            host.input_devices()
                .map_err(|e| MediaError::Capture(format!("Failed to enumerate devices: {}", e)))?
                .find(|d| {
                    d.name()
                        .map(|n| n.to_lowercase().contains(&wanted))
                        .unwrap_or(false)
                })
                .ok_or_else(|| {
                    MediaError::Capture(format!("Audio device '{}' not found", self.device_name))
                })?
        };

        let stream_config = device
            .default_input_config()
            .map_err(|e| MediaError::Capture(format!("No usable input config: {}", e)))?
            .config();
        let device_rate = stream_config.sample_rate.0;
        let channels = stream_config.channels;
        tracing::debug!(
            device = %device.name().unwrap_or_else(|_| "unknown".to_string()),
            device_rate,
            channels,
            "Recording from input device"
        );

        let buffer: Arc<Mutex<Vec<f32>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buffer);
        let stream = device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let mono = downmix(data, channels);
                    sink.lock().unwrap_or_else(|e| e.into_inner()).extend(mono);
                },
                |err| tracing::error!(error = %err, "Audio stream error"),
                None,
            )
            .map_err(|e| MediaError::Capture(format!("Failed to build audio stream: {}", e)))?;
        stream
            .play()
            .map_err(|e| MediaError::Capture(format!("Failed to start audio stream: {}", e)))?;

        std::thread::sleep(duration);
        drop(stream);

        let mono = std::mem::take(&mut *buffer.lock().unwrap_or_else(|e| e.into_inner()));
        Ok(finish(&mono, device_rate, self.sample_rate, duration))
    }

    #[cfg(not(feature = "microphone"))]
    fn capture(&self, _duration: Duration) -> Result<Vec<i16>, MediaError> {
        Err(MediaError::Capture(
            "built without the `microphone` feature".to_string(),
        ))
    }
}

// =============================================================================
// Sample conversion
// =============================================================================

/// Average interleaved channels into one.
fn downmix(data: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }
    let ch = channels as usize;
    data.chunks_exact(ch)
        .map(|frame| frame.iter().sum::<f32>() / ch as f32)
        .collect()
}

/// Linear-interpolation resample.
fn resample(mono: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || mono.is_empty() {
        return mono.to_vec();
    }
    let ratio = f64::from(from_rate) / f64::from(to_rate);
    let out_len = (mono.len() as f64 / ratio).ceil() as usize;
    let last = mono.len() - 1;
    (0..out_len)
        .map(|i| {
            let src = i as f64 * ratio;
            let idx0 = (src.floor() as usize).min(last);
            let idx1 = (idx0 + 1).min(last);
            let frac = (src - idx0 as f64) as f32;
            mono[idx0] * (1.0 - frac) + mono[idx1] * frac
        })
        .collect()
}

fn to_pcm16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|s| (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16)
        .collect()
}

/// Resample to `target_rate`, cap at `duration` and convert to PCM.
fn finish(mono: &[f32], device_rate: u32, target_rate: u32, duration: Duration) -> Vec<i16> {
    let resampled = resample(mono, device_rate, target_rate);
    let wanted = (u128::from(target_rate) * duration.as_millis() / 1000) as usize;
    to_pcm16(&resampled[..resampled.len().min(wanted)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downmix_averages_channels() {
        assert_eq!(downmix(&[0.25, 0.75, -1.0, 1.0], 2), vec![0.5, 0.0]);
        assert_eq!(downmix(&[0.5, 0.25], 1), vec![0.5, 0.25]);
    }

    #[test]
    fn test_resample_halves_rate() {
        let out = resample(&[0.0, 0.5, 1.0, 0.5], 32_000, 16_000);
        assert_eq!(out, vec![0.0, 1.0]);
        assert_eq!(resample(&[0.1, 0.2], 16_000, 16_000), vec![0.1, 0.2]);
        assert!(resample(&[], 48_000, 16_000).is_empty());
    }

    #[test]
    fn test_to_pcm16_clamps() {
        assert_eq!(to_pcm16(&[0.0, 1.0, -2.0]), vec![0, i16::MAX, -i16::MAX]);
    }

    #[test]
    fn test_finish_caps_to_duration() {
        let mono = vec![0.5; 48_000];
        let pcm = finish(&mono, 48_000, 16_000, Duration::from_millis(500));
        assert_eq!(pcm.len(), 8_000);
        assert!(pcm.iter().all(|&s| s == (0.5 * f32::from(i16::MAX)) as i16));
    }

    #[cfg(not(feature = "microphone"))]
    #[tokio::test]
    async fn test_record_without_backend_is_capture_error() {
        let mic = CpalMicrophone::from_config(&VoiceConfig::default());
        let err = mic.record(Duration::from_millis(10)).await.unwrap_err();
        assert!(matches!(err, MediaError::Capture(_)));
    }
}
