//! Conversational sessions for Vitalis.
//!
//! Provides the persona session registry, the per-session conversation state,
//! and the progress indicator that runs alongside each backend call.

pub mod error;
pub mod persona;
pub mod progress;
pub mod registry;
pub mod session;

pub use error::ChatError;
pub use progress::{ProgressIndicator, ProgressMode, ProgressReporter, ProgressSink};
pub use registry::SessionRegistry;
pub use session::{ConversationSession, SessionSnapshot};
