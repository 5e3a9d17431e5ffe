//! Error types shared across the workspace

use thiserror::Error;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, CommonError>;

/// Errors raised while setting up logging
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Logging error: {0}")]
    Logging(String),
}

impl CommonError {
    /// Build a parse error for a named setting
    pub fn invalid_value(setting: &str, value: &str) -> Self {
        Self::Parse(format!("invalid value '{}' for {}", value, setting))
    }
}
