/// Dynamics-specific errors
use soul_core::SoulError;
use thiserror::Error;

/// Result type alias using `DynamicsError`
pub type Result<T> = std::result::Result<T, DynamicsError>;

/// Dynamics processing error types
#[derive(Error, Debug)]
pub enum DynamicsError {
    /// Compressor parameter rejected at construction
    #[error("Invalid compressor configuration: {0}")]
    Configuration(String),

    /// Buffer rejected before processing (NaN/Inf samples, mismatched channel lengths)
    #[error("Invalid audio buffer: {0}")]
    InvalidInput(String),

    /// Buffer sample rate differs from the rate the coefficients were derived for
    #[error("Sample rate mismatch: compressor configured for {expected} Hz, buffer is {actual} Hz")]
    SampleRateMismatch { expected: u32, actual: u32 },
}

impl From<SoulError> for DynamicsError {
    fn from(err: SoulError) -> Self {
        match err {
            SoulError::Configuration(msg) => Self::Configuration(msg),
            SoulError::InvalidInput(msg) => Self::InvalidInput(msg),
            SoulError::Io(err) => Self::InvalidInput(err.to_string()),
        }
    }
}

impl From<DynamicsError> for SoulError {
    fn from(err: DynamicsError) -> Self {
        match err {
            DynamicsError::Configuration(msg) => SoulError::configuration(msg),
            other => SoulError::invalid_input(other.to_string()),
        }
    }
}
