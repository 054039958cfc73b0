//! Error types for loudness analysis

use soul_core::SoulError;
use thiserror::Error;

/// Result type for loudness operations
pub type Result<T> = std::result::Result<T, LoudnessError>;

/// Errors that can occur during loudness analysis
#[derive(Error, Debug)]
pub enum LoudnessError {
    /// Invalid sample rate
    #[error("Invalid sample rate: {0} Hz (must be greater than 0)")]
    InvalidSampleRate(u32),

    /// Target loudness is NaN or infinite
    #[error("Invalid target loudness: {0} LUFS (must be finite)")]
    InvalidTarget(f64),

    /// Loudness range window is not a positive duration
    #[error("Invalid analysis window: {0} s (must be finite and greater than 0)")]
    InvalidWindow(f64),

    /// Buffer rejected before analysis (NaN/Inf samples, mismatched channel lengths)
    #[error("Invalid audio buffer: {0}")]
    InvalidInput(String),

    /// Buffer sample rate differs from the rate the filters were designed for
    #[error("Sample rate mismatch: meter configured for {expected} Hz, buffer is {actual} Hz")]
    SampleRateMismatch { expected: u32, actual: u32 },
}

impl From<SoulError> for LoudnessError {
    fn from(err: SoulError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl From<LoudnessError> for SoulError {
    fn from(err: LoudnessError) -> Self {
        match err {
            LoudnessError::InvalidInput(msg) => SoulError::invalid_input(msg),
            other => SoulError::configuration(other.to_string()),
        }
    }
}
