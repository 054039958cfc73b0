//! Soul Mastering Core
//!
//! Platform-agnostic audio types, level conversions and error handling shared by the
//! dynamics and loudness crates.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Audio Types**: `AudioBuffer`, `AudioFormat`, `SampleRate`
//! - **Level Math**: dB/linear conversion with a finite silence floor (`db`)
//! - **Error Handling**: Unified `SoulError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use soul_core::{AudioBuffer, SampleRate};
//!
//! let left = vec![0.5_f32; 4];
//! let right = vec![-0.25_f32; 4];
//! let buffer = AudioBuffer::from_channels(vec![left, right], SampleRate::CD_QUALITY).unwrap();
//!
//! assert_eq!(buffer.channels(), 2);
//! assert_eq!(buffer.frames(), 4);
//! assert_eq!(buffer.samples[..2], [0.5, -0.25]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod db;
pub mod error;
pub mod types;

pub use error::{Result, SoulError};
pub use types::{AudioBuffer, AudioFormat, SampleRate};
