use thiserror::Error;

/// All the ways the inventory rules can push back
///
/// Absent freeze or expiration dates are never an error here; they degrade
/// to "never expires" instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Missing data: {0}")]
    MissingData(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Import failed at line {line}: {message}")]
    Import { line: usize, message: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
