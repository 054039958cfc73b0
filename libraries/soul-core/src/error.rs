/// Core error types for Soul Mastering
use thiserror::Error;

/// Result type alias using `SoulError`
pub type Result<T> = std::result::Result<T, SoulError>;

/// Core error type for Soul Mastering
#[derive(Error, Debug)]
pub enum SoulError {
    /// Buffer contents or shape rejected before processing
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Parameter rejected at construction time
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SoulError {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
