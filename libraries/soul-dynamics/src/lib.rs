//! Soul Mastering Dynamics
//!
//! Offline dynamic range compression for whole in-memory buffers.
//!
//! This crate provides:
//! - `GainComputer`: static soft-knee gain curve (level dB -> gain reduction dB)
//! - `EnvelopeDetector`: centered moving-RMS level detector
//! - `Smoother`: attack/release smoothing with explicit per-channel state
//! - `Compressor`: per-channel orchestration plus before/after statistics
//!
//! # Architecture
//!
//! ```text
//! ┌─────────┐   ┌──────────┐   ┌──────────────┐   ┌──────────┐   ┌──────────┐
//! │ Channel │ ─►│ Envelope │ ─►│ GainComputer │ ─►│ Smoother │ ─►│ × linear │
//! └─────────┘   └──────────┘   └──────────────┘   └──────────┘   └──────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use soul_core::{AudioBuffer, SampleRate};
//! use soul_dynamics::{Compressor, CompressorConfig};
//!
//! let config = CompressorConfig::new(SampleRate::CD_QUALITY)
//!     .with_threshold(-20.0)
//!     .with_ratio(4.0);
//! let compressor = Compressor::new(config).unwrap();
//!
//! let input = AudioBuffer::mono(vec![0.8; 4410], SampleRate::CD_QUALITY);
//! let output = compressor.compress(&input).unwrap();
//! let stats = compressor.stats(&input, &output).unwrap();
//!
//! assert!(stats.compressed_rms_db < stats.original_rms_db);
//! ```

#![deny(unsafe_code)]

mod compressor;
mod envelope;
mod error;
mod gain_computer;
mod smoother;

pub use compressor::{compression_stats, CompressionStats, Compressor, CompressorConfig};
pub use envelope::{EnvelopeDetector, DEFAULT_ENVELOPE_WINDOW};
pub use error::{DynamicsError, Result};
pub use gain_computer::GainComputer;
pub use smoother::{Smoother, SmootherState};
