/// Application error types
use soul_dynamics::DynamicsError;
use soul_loudness::LoudnessError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MasterError>;

#[derive(Debug, Error)]
pub enum MasterError {
    #[error("Input file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Metadata pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Unsupported WAV format: {0}")]
    UnsupportedFormat(String),

    #[error("Compression failed: {0}")]
    Dynamics(#[from] DynamicsError),

    #[error("Loudness processing failed: {0}")]
    Loudness(#[from] LoudnessError),

    #[error("Invalid audio: {0}")]
    Audio(#[from] soul_core::SoulError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
