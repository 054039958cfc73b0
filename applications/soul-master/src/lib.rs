//! Soul Master Library
//!
//! Batch front end for the mastering chain: resolves compressor parameters (command
//! line, JSON analysis report, adaptive heuristics, defaults), reads WAV files, runs
//! compression and loudness normalization, and renders a report.
//!
//! This library exposes the components for testing purposes.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod wav;

// Re-export commonly used types for convenience
pub use config::{AnalysisConfig, ParameterOverrides, ResolvedParameters};
pub use error::{MasterError, Result};
pub use pipeline::{process_buffer, process_file, FileReport, ProcessOptions, ProcessingReport};

/// Log filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "soul_master=info,soul_loudness=warn,soul_dynamics=warn";

/// Log filter used with `--verbose`
pub const VERBOSE_LOG_FILTER: &str = "soul_master=debug,soul_loudness=debug,soul_dynamics=debug";
