//! Progress reporting around long-running backend calls.
//!
//! A `ProgressIndicator` owns a background task that emits an elapsed-time
//! signal every interval until it is stopped. `ProgressReporter::track`
//! scopes an indicator to a future so the task is joined on every exit path.

use std::future::Future;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use vitalis_core::config::ProgressConfig;

// =============================================================================
// Sinks
// =============================================================================

/// Receives the signals of a single indicator.
pub trait ProgressSink: Send + Sync {
    fn tick(&self, elapsed: Duration);

    fn finish(&self, _elapsed: Duration) {}
}

/// Console spinner showing the time spent waiting on the backend.
pub struct SpinnerSink {
    bar: ProgressBar,
}

impl SpinnerSink {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        Self { bar }
    }
}

impl Default for SpinnerSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for SpinnerSink {
    fn tick(&self, elapsed: Duration) {
        self.bar.set_message(format!(
            "Generating response... {:.3} seconds elapsed",
            elapsed.as_secs_f64()
        ));
        self.bar.tick();
    }

    fn finish(&self, _elapsed: Duration) {
        self.bar.finish_with_message("Response received.");
    }
}

/// Emits each signal as a trace event.
pub struct LogSink {
    label: String,
}

impl LogSink {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl ProgressSink for LogSink {
    fn tick(&self, elapsed: Duration) {
        tracing::trace!(
            label = %self.label,
            elapsed_ms = elapsed.as_millis() as u64,
            "Generating response"
        );
    }

    fn finish(&self, elapsed: Duration) {
        tracing::debug!(
            label = %self.label,
            elapsed_ms = elapsed.as_millis() as u64,
            "Response received"
        );
    }
}

pub struct NullSink;

impl ProgressSink for NullSink {
    fn tick(&self, _elapsed: Duration) {}
}

// =============================================================================
// Indicator
// =============================================================================

/// Background elapsed-time reporter for one in-flight call.
pub struct ProgressIndicator {
    running: Arc<AtomicBool>,
    wake: Arc<Notify>,
    started_at: Instant,
    handle: Option<JoinHandle<()>>,
}

impl ProgressIndicator {
    /// Spawn the reporting task. Must be called inside a Tokio runtime.
    pub fn start(sink: Box<dyn ProgressSink>, interval: Duration) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let wake = Arc::new(Notify::new());
        let started_at = Instant::now();

        let handle = tokio::spawn({
            let running = Arc::clone(&running);
            let wake = Arc::clone(&wake);
            async move {
                loop {
                    tokio::select! {
                        _ = wake.notified() => break,
                        _ = tokio::time::sleep(interval) => {}
                    }
                    if !running.load(Ordering::Acquire) {
                        break;
                    }
                    sink.tick(started_at.elapsed());
                }
                sink.finish(started_at.elapsed());
            }
        });

        Self {
            running,
            wake,
            started_at,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stop reporting and wait for the task to exit.
    ///
    /// No signal is emitted once this returns. Returns the elapsed time.
    pub async fn stop(mut self) -> Duration {
        self.running.store(false, Ordering::Release);
        self.wake.notify_one();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Progress task ended abnormally");
            }
        }
        self.started_at.elapsed()
    }
}

impl Drop for ProgressIndicator {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.running.store(false, Ordering::Release);
            handle.abort();
        }
    }
}

// =============================================================================
// Reporter
// =============================================================================

/// How progress is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    Spinner,
    Log,
    Off,
}

impl FromStr for ProgressMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spinner" => Ok(ProgressMode::Spinner),
            "log" => Ok(ProgressMode::Log),
            "off" => Ok(ProgressMode::Off),
            other => Err(format!("unknown progress style '{}'", other)),
        }
    }
}

/// Builds one indicator per tracked call.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    mode: ProgressMode,
    interval: Duration,
}

impl ProgressReporter {
    pub fn new(mode: ProgressMode, interval: Duration) -> Self {
        Self { mode, interval }
    }

    pub fn from_config(config: &ProgressConfig) -> Self {
        let mode = config.style.parse().unwrap_or_else(|e: String| {
            tracing::warn!(error = %e, "Falling back to log progress");
            ProgressMode::Log
        });
        Self::new(mode, Duration::from_millis(config.interval_ms.max(1)))
    }

    /// Reporter that emits nothing. Used by tests.
    pub fn disabled() -> Self {
        Self::new(ProgressMode::Off, Duration::from_millis(100))
    }

    pub fn mode(&self) -> ProgressMode {
        self.mode
    }

    fn sink(&self, label: &str) -> Box<dyn ProgressSink> {
        match self.mode {
            ProgressMode::Spinner => Box::new(SpinnerSink::new()),
            ProgressMode::Log => Box::new(LogSink::new(label)),
            ProgressMode::Off => Box::new(NullSink),
        }
    }

    /// Run `fut` with an indicator active for its whole duration.
    pub async fn track<F, T>(&self, label: &str, fut: F) -> T
    where
        F: Future<Output = T>,
    {
        let indicator = ProgressIndicator::start(self.sink(label), self.interval);
        let output = fut.await;
        let elapsed = indicator.stop().await;
        tracing::debug!(label, elapsed_ms = elapsed.as_millis() as u64, "Backend call finished");
        output
    }
}
