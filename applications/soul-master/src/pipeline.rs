/// Processing pipeline
///
/// original stats -> compress -> compression stats -> (measure -> normalize) -> final
/// stats. The buffer-level part is independent of files so it can be driven from
/// tests or other front ends.
use crate::config::ResolvedParameters;
use crate::error::{MasterError, Result};
use crate::wav::{read_wav, write_wav};
use serde::Serialize;
use soul_core::AudioBuffer;
use soul_dynamics::{CompressionStats, Compressor};
use soul_loudness::{LoudnessConfig, LoudnessMeter, LoudnessStats, Normalizer, DEFAULT_TARGET_LUFS};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessOptions {
    pub parameters: ResolvedParameters,
    pub target_lufs: f64,
    pub normalize: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            parameters: ResolvedParameters::default(),
            target_lufs: DEFAULT_TARGET_LUFS,
            normalize: true,
        }
    }
}

/// Loudness normalization outcome
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizationReport {
    pub target_lufs: f64,
    /// Loudness of the compressed signal before makeup gain
    pub current_lufs: f64,
    pub requested_gain_db: f64,
    pub applied_gain_db: f64,
    pub peak_limited: bool,
    pub peak_before_limit: f32,
}

/// Everything measured while processing one buffer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingReport {
    pub sample_rate: u32,
    pub channels: usize,
    pub duration_secs: f64,
    pub parameters: ResolvedParameters,
    pub original: LoudnessStats,
    pub original_lra_lu: f64,
    pub compression: CompressionStats,
    pub normalization: Option<NormalizationReport>,
    #[serde(rename = "final")]
    pub final_stats: LoudnessStats,
    pub final_lra_lu: f64,
}

/// Report for one file, with its paths
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(flatten)]
    pub report: ProcessingReport,
}

/// Run the full chain on an in-memory buffer
pub fn process_buffer(
    buffer: &AudioBuffer,
    options: &ProcessOptions,
) -> Result<(AudioBuffer, ProcessingReport)> {
    buffer.validate()?;
    let sample_rate = buffer.sample_rate();

    let compressor = Compressor::new(options.parameters.compressor_config(sample_rate))?;
    let meter = LoudnessMeter::new(LoudnessConfig::new(sample_rate, options.target_lufs)?)?;

    let original = meter.loudness_stats(buffer)?;
    let original_lra_lu = meter.loudness_range(buffer)?;
    tracing::info!(
        lufs = original.integrated_lufs,
        peak_db = original.peak_db,
        lra = original_lra_lu,
        "original"
    );

    let compressed = compressor.compress(buffer)?;
    let compression = compressor.stats(buffer, &compressed)?;
    tracing::info!(
        range_before = compression.original_dynamic_range_db,
        range_after = compression.compressed_dynamic_range_db,
        "compressed"
    );

    let (output, normalization) = if options.normalize {
        let current_lufs = meter.measure(&compressed)?;
        let normalizer = Normalizer::from_meter(meter.clone());
        let normalized = normalizer.normalize(&compressed, Some(current_lufs))?;
        tracing::info!(
            current_lufs,
            gain_db = normalized.applied_gain_db,
            limited = normalized.peak_limited,
            "normalized"
        );

        let report = NormalizationReport {
            target_lufs: options.target_lufs,
            current_lufs,
            requested_gain_db: normalized.requested_gain_db,
            applied_gain_db: normalized.applied_gain_db,
            peak_limited: normalized.peak_limited,
            peak_before_limit: normalized.peak_before_limit,
        };
        (normalized.buffer, Some(report))
    } else {
        tracing::info!("skipping loudness normalization");
        (compressed, None)
    };

    let final_stats = meter.loudness_stats(&output)?;
    let final_lra_lu = meter.loudness_range(&output)?;

    let report = ProcessingReport {
        sample_rate: sample_rate.as_hz(),
        channels: buffer.channels(),
        duration_secs: buffer.duration_secs(),
        parameters: options.parameters,
        original,
        original_lra_lu,
        compression,
        normalization,
        final_stats,
        final_lra_lu,
    };
    Ok((output, report))
}

/// Read `input`, process it and write the result to `output`
///
/// The output directory is created if it does not exist.
pub fn process_file(input: &Path, output: &Path, options: &ProcessOptions) -> Result<FileReport> {
    if !input.exists() {
        return Err(MasterError::InputNotFound(input.to_path_buf()));
    }

    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
            tracing::info!(dir = %dir.display(), "created output directory");
        }
    }

    let buffer = read_wav(input)?;
    let (processed, report) = process_buffer(&buffer, options)?;
    write_wav(output, &processed)?;

    Ok(FileReport {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ParameterOverrides, ResolvedParameters};
    use soul_core::SampleRate;

    fn tone(amplitude: f32, seconds: f32) -> AudioBuffer {
        let n = (44_100.0 * seconds) as usize;
        let samples = (0..n)
            .map(|i| amplitude * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44_100.0).sin())
            .collect();
        AudioBuffer::mono(samples, SampleRate::CD_QUALITY)
    }

    #[test]
    fn full_chain_reaches_target() {
        let (output, report) = process_buffer(&tone(0.5, 4.0), &ProcessOptions::default()).unwrap();

        assert_eq!(output.len(), 4 * 44_100);
        assert!(report.compression.gain_reduction_db < 0.0);
        let normalization = report.normalization.unwrap();
        assert!(!normalization.peak_limited);
        assert!((report.final_stats.integrated_lufs - DEFAULT_TARGET_LUFS).abs() < 0.1);
    }

    #[test]
    fn no_normalize_returns_compressed_buffer() {
        let options = ProcessOptions {
            normalize: false,
            ..Default::default()
        };
        let input = tone(0.5, 1.0);
        let (output, report) = process_buffer(&input, &options).unwrap();

        let compressor = Compressor::new(options.parameters.compressor_config(SampleRate::CD_QUALITY)).unwrap();
        assert_eq!(output, compressor.compress(&input).unwrap());
        assert!(report.normalization.is_none());
    }

    #[test]
    fn invalid_parameters_abort() {
        let overrides = ParameterOverrides {
            attack_ms: Some(0.0),
            ..Default::default()
        };
        let options = ProcessOptions {
            parameters: ResolvedParameters::resolve(&overrides, None).unwrap(),
            ..Default::default()
        };
        assert!(matches!(
            process_buffer(&tone(0.5, 1.0), &options),
            Err(MasterError::Dynamics(_))
        ));
    }

    #[test]
    fn low_rate_input_is_processed() {
        let n = 6_000 * 2;
        let samples = (0..n)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 6_000.0).sin())
            .collect();
        let input = AudioBuffer::mono(samples, SampleRate::new(6_000));

        for normalize in [false, true] {
            let options = ProcessOptions {
                normalize,
                ..Default::default()
            };
            let (output, report) = process_buffer(&input, &options).unwrap();
            assert_eq!(output.len(), n);
            assert_eq!(report.sample_rate, 6_000);
        }
    }

    #[test]
    fn silence_passes_through() {
        let silence = AudioBuffer::mono(vec![0.0; 44_100], SampleRate::CD_QUALITY);
        let (output, report) = process_buffer(&silence, &ProcessOptions::default()).unwrap();

        assert_eq!(output, silence);
        assert_eq!(report.normalization.unwrap().applied_gain_db, 0.0);
        assert_eq!(report.final_lra_lu, 0.0);
    }
}
