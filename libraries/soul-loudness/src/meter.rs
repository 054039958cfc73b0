//! Integrated loudness and loudness range (ITU-R BS.1770)
//!
//! Measurement pipeline for a whole buffer:
//! 1. K-weight every channel (shelf, then RLB high-pass)
//! 2. Cut 400 ms blocks with 75% overlap and take the weighted sum of per-channel
//!    mean-square energy
//! 3. Absolute gate at -70 LUFS, relative gate 10 LU below the absolutely-gated mean
//! 4. `-0.691 + 10 * log10(mean energy)` over the surviving blocks
//!
//! Loudness range reuses the same pipeline on consecutive, non-overlapping windows
//! (3 s by default) and reports the spread between the 10th and 95th percentile of the
//! window loudness values. This is a simplified LRA: EBU Tech 3342 uses overlapping
//! short-term windows and its own relative gate.

use crate::error::{LoudnessError, Result};
use crate::k_weighting::KWeighting;
use crate::stats::LoudnessStats;
use crate::DEFAULT_TARGET_LUFS;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use soul_core::db::linear_to_db;
use soul_core::{AudioBuffer, SampleRate};

/// Loudness reported when a buffer cannot be measured (silence, or shorter than a block)
pub const SILENCE_LUFS: f64 = -200.0;

/// Absolute gate threshold
pub const ABSOLUTE_GATE_LUFS: f64 = -70.0;

/// Relative gate offset from the absolutely-gated loudness
pub const RELATIVE_GATE_LU: f64 = -10.0;

/// Gating block length in seconds
pub const BLOCK_DURATION_SECS: f64 = 0.4;

/// Overlap between consecutive gating blocks
pub const BLOCK_OVERLAP: f64 = 0.75;

/// Default loudness range window in seconds
pub const DEFAULT_LRA_WINDOW_SECS: f64 = 3.0;

const LOUDNESS_OFFSET: f64 = -0.691;
const LRA_LOW_PERCENTILE: f64 = 10.0;
const LRA_HIGH_PERCENTILE: f64 = 95.0;

/// Meter configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoudnessConfig {
    pub sample_rate: SampleRate,
    /// Normalization target in LUFS
    pub target_lufs: f64,
}

impl LoudnessConfig {
    /// Create a validated configuration
    ///
    /// # Errors
    /// `InvalidSampleRate` for a zero rate, `InvalidTarget` for a non-finite target.
    pub fn new(sample_rate: SampleRate, target_lufs: f64) -> Result<Self> {
        let config = Self {
            sample_rate,
            target_lufs,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let hz = self.sample_rate.as_hz();
        if hz == 0 {
            return Err(LoudnessError::InvalidSampleRate(hz));
        }
        if !self.target_lufs.is_finite() {
            return Err(LoudnessError::InvalidTarget(self.target_lufs));
        }
        Ok(())
    }
}

impl Default for LoudnessConfig {
    fn default() -> Self {
        Self {
            sample_rate: SampleRate::CD_QUALITY,
            target_lufs: DEFAULT_TARGET_LUFS,
        }
    }
}

/// One 400 ms gating block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoudnessBlock {
    /// First frame of the block
    pub start_sample: usize,
    /// Channel-weighted sum of K-weighted mean-square energy
    pub mean_square_energy: f64,
    /// True if the absolute or relative gate discarded this block
    pub gated: bool,
}

impl LoudnessBlock {
    /// Block loudness in LUFS (`-inf` for a silent block)
    pub fn loudness_lufs(&self) -> f64 {
        energy_to_lufs(self.mean_square_energy)
    }
}

/// BS.1770 loudness meter
///
/// Holds only the configuration and the K-weighting coefficients derived from it; every
/// measurement starts from zero filter state, so a meter can be shared freely.
///
/// # Example
///
/// ```rust
/// use soul_core::{AudioBuffer, SampleRate};
/// use soul_loudness::{LoudnessConfig, LoudnessMeter, SILENCE_LUFS};
///
/// let meter = LoudnessMeter::new(LoudnessConfig::new(SampleRate::CD_QUALITY, -16.0)?)?;
///
/// // Shorter than one gating block
/// let short = AudioBuffer::mono(vec![0.5; 1000], SampleRate::CD_QUALITY);
/// assert_eq!(meter.measure(&short)?, SILENCE_LUFS);
/// # Ok::<(), soul_loudness::LoudnessError>(())
/// ```
#[derive(Debug, Clone)]
pub struct LoudnessMeter {
    config: LoudnessConfig,
    filter: KWeighting,
}

impl LoudnessMeter {
    pub fn new(config: LoudnessConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            filter: KWeighting::new(config.sample_rate.as_f64()),
            config,
        })
    }

    pub fn config(&self) -> &LoudnessConfig {
        &self.config
    }

    pub fn target_lufs(&self) -> f64 {
        self.config.target_lufs
    }

    pub fn k_weighting(&self) -> &KWeighting {
        &self.filter
    }

    /// Gating blocks of a buffer, each marked with whether the gates discarded it
    ///
    /// Empty when the buffer is shorter than one block.
    pub fn blocks(&self, buffer: &AudioBuffer) -> Result<Vec<LoudnessBlock>> {
        self.check_buffer(buffer)?;
        let (starts, energies) = self.block_energies(buffer);
        let (_, kept) = gate(&energies);

        Ok(starts
            .into_iter()
            .zip(energies)
            .zip(kept)
            .map(|((start_sample, mean_square_energy), kept)| LoudnessBlock {
                start_sample,
                mean_square_energy,
                gated: !kept,
            })
            .collect())
    }

    /// Integrated loudness in LUFS, or `None` when the buffer is not measurable
    ///
    /// Not measurable: shorter than one 400 ms block, or no block above the
    /// absolute gate.
    ///
    /// # Errors
    /// `InvalidInput` for NaN/Inf or ragged buffers, `SampleRateMismatch` if the buffer
    /// rate differs from the configured rate.
    pub fn integrated_loudness(&self, buffer: &AudioBuffer) -> Result<Option<f64>> {
        self.check_buffer(buffer)?;
        let (_, energies) = self.block_energies(buffer);
        let (loudness, kept) = gate(&energies);

        tracing::debug!(
            channels = buffer.channels(),
            frames = buffer.frames(),
            blocks = energies.len(),
            kept = kept.iter().filter(|&&k| k).count(),
            ungated_lufs = energy_to_lufs(mean(&energies)),
            "integrated loudness"
        );

        Ok(loudness)
    }

    /// Integrated loudness with unmeasurable buffers reported as [`SILENCE_LUFS`]
    pub fn measure(&self, buffer: &AudioBuffer) -> Result<f64> {
        match self.integrated_loudness(buffer)? {
            Some(lufs) => Ok(lufs),
            None => {
                tracing::warn!(
                    frames = buffer.frames(),
                    "buffer is silent or shorter than one gating block, loudness not measurable"
                );
                Ok(SILENCE_LUFS)
            }
        }
    }

    /// Loudness range in LU over the default 3 s windows
    pub fn loudness_range(&self, buffer: &AudioBuffer) -> Result<f64> {
        self.loudness_range_with_window(buffer, DEFAULT_LRA_WINDOW_SECS)
    }

    /// Loudness range in LU over non-overlapping windows of `window_secs`
    ///
    /// Trailing frames that do not fill a window are ignored. Windows that cannot be
    /// measured are dropped; fewer than two measurable windows yield 0.0.
    ///
    /// # Errors
    /// `InvalidWindow` for a non-positive or non-finite window, or one shorter than a
    /// single frame; otherwise as [`Self::integrated_loudness`].
    pub fn loudness_range_with_window(&self, buffer: &AudioBuffer, window_secs: f64) -> Result<f64> {
        if !window_secs.is_finite() || window_secs <= 0.0 {
            return Err(LoudnessError::InvalidWindow(window_secs));
        }
        self.check_buffer(buffer)?;

        let window_frames = (window_secs * self.config.sample_rate.as_f64()) as usize;
        if window_frames == 0 {
            return Err(LoudnessError::InvalidWindow(window_secs));
        }

        let channels = buffer.channels();
        let window_len = window_frames * channels;
        let num_windows = buffer.frames() / window_frames;

        let windows: Vec<AudioBuffer> = (0..num_windows)
            .map(|i| {
                let start = i * window_len;
                AudioBuffer::new(buffer.samples[start..start + window_len].to_vec(), buffer.format)
            })
            .collect();

        let mut values = windows
            .par_iter()
            .map(|window| self.integrated_loudness(window))
            .collect::<Result<Vec<Option<f64>>>>()?
            .into_iter()
            .flatten()
            .filter(|lufs| lufs.is_finite())
            .collect::<Vec<f64>>();

        if values.len() < 2 {
            tracing::debug!(windows = num_windows, valid = values.len(), "loudness range: too few windows");
            return Ok(0.0);
        }

        values.sort_by(f64::total_cmp);
        let range = percentile(&values, LRA_HIGH_PERCENTILE) - percentile(&values, LRA_LOW_PERCENTILE);

        tracing::debug!(windows = num_windows, valid = values.len(), lra = range, "loudness range");
        Ok(range)
    }

    /// Gain in dB that moves `current_lufs` to the target
    pub fn calculate_makeup_gain(&self, current_lufs: f64) -> f64 {
        calculate_makeup_gain(self.config.target_lufs, current_lufs)
    }

    /// Integrated loudness, sample peak, RMS and distance to the target
    pub fn loudness_stats(&self, buffer: &AudioBuffer) -> Result<LoudnessStats> {
        let integrated_lufs = self.measure(buffer)?;
        let peak_db = linear_to_db(f64::from(buffer.peak()));
        let rms_db = linear_to_db(buffer.rms());
        let lufs_difference = integrated_lufs - self.config.target_lufs;

        Ok(LoudnessStats {
            integrated_lufs,
            peak_db,
            rms_db,
            crest_factor_db: peak_db - rms_db,
            target_lufs: self.config.target_lufs,
            lufs_difference,
            required_makeup_gain_db: -lufs_difference,
        })
    }

    fn check_buffer(&self, buffer: &AudioBuffer) -> Result<()> {
        buffer.validate()?;
        let expected = self.config.sample_rate.as_hz();
        let actual = buffer.sample_rate().as_hz();
        if expected != actual {
            return Err(LoudnessError::SampleRateMismatch { expected, actual });
        }
        Ok(())
    }

    /// (start frame, weighted energy) for every gating block
    fn block_energies(&self, buffer: &AudioBuffer) -> (Vec<usize>, Vec<f64>) {
        let rate = self.config.sample_rate.as_f64();
        let bounds = block_bounds(buffer.frames(), rate);
        if bounds.is_empty() {
            return (Vec::new(), Vec::new());
        }

        let weighted: Vec<Vec<f64>> = buffer
            .split_channels()
            .par_iter()
            .map(|channel| self.filter.apply(channel))
            .collect();

        let block_len = BLOCK_DURATION_SECS * rate;
        let energies: Vec<f64> = bounds
            .par_iter()
            .map(|&(start, end)| {
                weighted
                    .iter()
                    .enumerate()
                    .map(|(ch, samples)| {
                        let sum: f64 = samples[start..end].iter().map(|s| s * s).sum();
                        channel_weight(ch) * sum / block_len
                    })
                    .sum::<f64>()
            })
            .collect();

        (bounds.into_iter().map(|(start, _)| start).collect(), energies)
    }
}

/// `target - current`
pub fn calculate_makeup_gain(target_lufs: f64, current_lufs: f64) -> f64 {
    target_lufs - current_lufs
}

/// BS.1770 channel weight: surrounds (channels 3 and 4) count +1.5 dB
fn channel_weight(channel: usize) -> f64 {
    match channel {
        3 | 4 => 1.41,
        _ => 1.0,
    }
}

fn energy_to_lufs(energy: f64) -> f64 {
    LOUDNESS_OFFSET + 10.0 * energy.log10()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Half-open frame ranges of the gating blocks
///
/// Block count is `round((T - 0.4) / 0.1) + 1` for a duration `T` in seconds (ties to
/// even); the last block may be truncated by the end of the buffer.
fn block_bounds(frames: usize, sample_rate: f64) -> Vec<(usize, usize)> {
    let duration = frames as f64 / sample_rate;
    if duration < BLOCK_DURATION_SECS {
        return Vec::new();
    }

    let step = 1.0 - BLOCK_OVERLAP;
    let count = ((duration - BLOCK_DURATION_SECS) / (BLOCK_DURATION_SECS * step)).round_ties_even() as usize + 1;

    (0..count)
        .map(|j| {
            let j = j as f64;
            let start = (BLOCK_DURATION_SECS * (j * step) * sample_rate) as usize;
            let end = (BLOCK_DURATION_SECS * (j * step + 1.0) * sample_rate) as usize;
            (start.min(frames), end.min(frames))
        })
        .collect()
}

/// Two-stage gating: returns the integrated loudness and which blocks survived
fn gate(energies: &[f64]) -> (Option<f64>, Vec<bool>) {
    let loudness: Vec<f64> = energies.iter().map(|&e| energy_to_lufs(e)).collect();

    let above_absolute: Vec<f64> = energies
        .iter()
        .zip(&loudness)
        .filter(|(_, &l)| l >= ABSOLUTE_GATE_LUFS)
        .map(|(&e, _)| e)
        .collect();
    if above_absolute.is_empty() {
        return (None, vec![false; energies.len()]);
    }

    let relative_gate = energy_to_lufs(mean(&above_absolute)) + RELATIVE_GATE_LU;
    let kept: Vec<bool> = loudness
        .iter()
        .map(|&l| l > relative_gate && l > ABSOLUTE_GATE_LUFS)
        .collect();

    let survivors: Vec<f64> = energies
        .iter()
        .zip(&kept)
        .filter(|(_, &k)| k)
        .map(|(&e, _)| e)
        .collect();
    if survivors.is_empty() {
        return (None, kept);
    }

    let integrated = energy_to_lufs(mean(&survivors));
    (integrated.is_finite().then_some(integrated), kept)
}

/// Linear-interpolated percentile of sorted values (rank `p/100 * (n - 1)`)
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (rank - lower as f64)
}
