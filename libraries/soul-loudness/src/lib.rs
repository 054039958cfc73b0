//! Loudness measurement and normalization for Soul Mastering
//!
//! This crate provides:
//! - ITU-R BS.1770 integrated loudness (K-weighting, 400 ms blocks, two-stage gating)
//! - Loudness range over fixed, non-overlapping windows
//! - Loudness statistics against a target level
//! - Makeup-gain normalization with full-scale peak protection
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌───────────────┐     ┌──────────────┐
//! │ AudioBuffer │ ──► │ K-weighting  │ ──► │ Blocks + Gate │ ──► │ LUFS / LRA   │
//! └─────────────┘     └──────────────┘     └───────────────┘     └──────────────┘
//!                                                                       │
//!                                                                       ▼
//!                                                               ┌──────────────┐
//!                                                               │ Normalizer   │
//!                                                               └──────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use soul_core::{AudioBuffer, SampleRate};
//! use soul_loudness::{LoudnessConfig, Normalizer};
//!
//! let tone: Vec<f32> = (0..44_100 * 2)
//!     .map(|i| 0.1 * (2.0 * std::f32::consts::PI * 997.0 * i as f32 / 44_100.0).sin())
//!     .collect();
//! let buffer = AudioBuffer::mono(tone, SampleRate::CD_QUALITY);
//!
//! let normalizer = Normalizer::new(LoudnessConfig::new(SampleRate::CD_QUALITY, -16.0)?)?;
//! let result = normalizer.normalize_to_target(&buffer)?;
//!
//! let after = normalizer.meter().measure(&result.buffer)?;
//! assert!((after - (-16.0)).abs() < 0.1);
//! # Ok::<(), soul_loudness::LoudnessError>(())
//! ```

#![deny(unsafe_code)]

mod error;
mod k_weighting;
mod meter;
mod normalizer;
mod stats;

pub use error::{LoudnessError, Result};
pub use k_weighting::{Biquad, KWeighting};
pub use meter::{
    calculate_makeup_gain, LoudnessBlock, LoudnessConfig, LoudnessMeter, ABSOLUTE_GATE_LUFS,
    BLOCK_DURATION_SECS, BLOCK_OVERLAP, DEFAULT_LRA_WINDOW_SECS, RELATIVE_GATE_LU, SILENCE_LUFS,
};
pub use normalizer::{Normalized, Normalizer};
pub use stats::LoudnessStats;

/// Default normalization target (-16 LUFS, common for podcasts and spoken word)
pub const DEFAULT_TARGET_LUFS: f64 = -16.0;

/// EBU R128 broadcast reference level (-23 LUFS)
pub const EBU_R128_BROADCAST_LUFS: f64 = -23.0;

/// Common streaming platform reference level (-14 LUFS)
pub const STREAMING_LUFS: f64 = -14.0;
