//! Vitalis media crate - turns uploaded artifacts into text or actions.
//!
//! PDF extraction, one-shot voice capture, audio summaries, image generation
//! and the video processing poller. Every external system sits behind a
//! trait so handlers can be exercised without hardware or network.

pub mod audio;
pub mod error;
pub mod image;
pub mod microphone;
pub mod pdf;
pub mod upload;
pub mod video;
pub mod voice;

pub use audio::AudioSummarizer;
pub use error::MediaError;
pub use image::{HttpImageApi, ImageApi, ImageGenerator, ImageReply, ImageViewer, SystemViewer};
pub use microphone::CpalMicrophone;
pub use pdf::{LopdfSource, PageSource, PdfExtractor};
pub use upload::{sanitize_file_name, save_upload};
pub use video::{Sleeper, TokioSleeper, VideoAnalyzer, VideoJob, VideoJobState};
pub use voice::{GeminiTranscriber, Microphone, Transcriber, VoiceCapture, VoiceInput};
