use thiserror::Error;

/// Top-level error type for the Vitalis system.
///
/// Subsystem crates define their own error types for backend and media
/// failures; this enum covers configuration, filesystem, and input
/// validation concerns shared by every crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VitalisError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for VitalisError {
    fn from(err: toml::de::Error) -> Self {
        VitalisError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for VitalisError {
    fn from(err: toml::ser::Error) -> Self {
        VitalisError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for VitalisError {
    fn from(err: serde_json::Error) -> Self {
        VitalisError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Vitalis operations.
pub type Result<T> = std::result::Result<T, VitalisError>;
