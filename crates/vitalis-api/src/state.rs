//! Application state shared across all route handlers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use vitalis_core::VitalisConfig;

use crate::dispatch::Dispatcher;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<VitalisConfig>,
    pub dispatcher: Arc<Dispatcher>,
    /// Directory uploaded files are written to.
    pub uploads_dir: PathBuf,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: VitalisConfig, dispatcher: Dispatcher) -> Self {
        let uploads_dir = PathBuf::from(&config.general.uploads_dir);
        Self {
            config: Arc::new(config),
            dispatcher: Arc::new(dispatcher),
            uploads_dir,
            start_time: Instant::now(),
        }
    }
}
