pub mod config;
pub mod error;
pub mod types;

pub use config::VitalisConfig;
pub use error::{Result, VitalisError};
pub use types::*;
