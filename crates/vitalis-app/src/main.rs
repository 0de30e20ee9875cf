//! Vitalis application binary - composition root.
//!
//! 1. Load `.env` and configuration
//! 2. Initialize logging
//! 3. Build the Gemini client, session registry and media handlers
//! 4. Start the axum REST API server

mod cli;

use std::sync::Arc;

use clap::Parser;
use vitalis_api::{create_router, AppState, Dispatcher, MediaHandlers};
use vitalis_chat::{ProgressReporter, SessionRegistry};
use vitalis_core::VitalisConfig;
use vitalis_gemini::{GeminiClient, GenerativeBackend};
use vitalis_media::{
    AudioSummarizer, CpalMicrophone, GeminiTranscriber, HttpImageApi, ImageGenerator,
    ImageViewer, PdfExtractor, SystemViewer, TokioSleeper, VideoAnalyzer, VoiceCapture,
};

use crate::cli::CliArgs;

/// Wire the production collaborators into a dispatcher.
fn build_dispatcher(config: &VitalisConfig) -> Result<Dispatcher, Box<dyn std::error::Error>> {
    let backend: Arc<dyn GenerativeBackend> = Arc::new(GeminiClient::new(&config.gemini)?);
    let progress = ProgressReporter::from_config(&config.progress);
    tracing::info!(model = %config.gemini.chat_model, progress = ?progress.mode(), "Gemini backend ready");

    let registry = Arc::new(SessionRegistry::new(Arc::clone(&backend), progress.clone()));

    let viewer = config
        .image
        .display
        .then(|| Arc::new(SystemViewer::default()) as Arc<dyn ImageViewer>);

    let media = MediaHandlers {
        pdf: PdfExtractor::default(),
        voice: VoiceCapture::new(
            Arc::new(CpalMicrophone::from_config(&config.voice)),
            Arc::new(GeminiTranscriber::new(
                Arc::clone(&backend),
                config.voice.transcription_prompt.clone(),
            )),
            &config.voice,
        ),
        audio: AudioSummarizer::new(
            Arc::clone(&backend),
            progress.clone(),
            config.audio.prompt.clone(),
        ),
        image: ImageGenerator::new(
            Arc::new(HttpImageApi::new(
                config.image.endpoint.clone(),
                config.gemini.api_key.clone(),
            )),
            viewer,
            &config.image,
        ),
        video: VideoAnalyzer::new(
            Arc::clone(&backend),
            Arc::new(TokioSleeper),
            progress,
            config.gemini.video_model.clone(),
            &config.video,
        ),
    };

    Ok(Dispatcher::new(registry, media))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();
    let dotenv = dotenvy::dotenv();

    // Config is read before logging starts so the log level can come from it.
    let config_file = args.resolve_config_path();
    let (mut config, config_error) = match VitalisConfig::load(&config_file) {
        Ok(config) => (config, None),
        Err(e) => (VitalisConfig::default(), Some(e)),
    };

    // Tracing: RUST_LOG > --log-level > config.
    let log_level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .init();

    tracing::info!("Starting Vitalis v{}", env!("CARGO_PKG_VERSION"));
    if let Err(e) = dotenv {
        tracing::debug!(error = %e, ".env not loaded, using process environment");
    }
    match config_error {
        None => tracing::info!(path = %config_file.display(), "Configuration loaded"),
        Some(e) => tracing::warn!(
            path = %config_file.display(),
            error = %e,
            "Failed to load config, using defaults"
        ),
    }

    if let Ok(key) = std::env::var("GEMINI_API_KEY") {
        config.gemini.api_key = key;
    }
    if config.gemini.api_key.is_empty() {
        tracing::warn!("No Gemini API key configured; set GEMINI_API_KEY or gemini.api_key");
    }

    let host = args.resolve_host(&config.general.host);
    let port = args.resolve_port(config.general.port);

    let dispatcher = build_dispatcher(&config)?;
    let state = AppState::new(config, dispatcher);
    tracing::info!(dir = %state.uploads_dir.display(), "Uploads directory");

    let router = create_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "Failed to bind - is another instance running?");
            tracing::error!("Try: VITALIS_PORT={} vitalis", port.saturating_add(1));
            return Err(e.into());
        }
    };

    tracing::info!(addr = %addr, "API server listening");

    axum::serve(listener, router).await?;

    Ok(())
}
