//! Loudness normalization with peak protection
//!
//! Applies a single makeup gain so the buffer reaches the target loudness. If the gain
//! pushes the sample peak past full scale, the whole buffer is scaled back down by the
//! peak (uniform, not a dynamic limiter) and the shortfall is reported.

use crate::error::Result;
use crate::meter::{LoudnessConfig, LoudnessMeter, SILENCE_LUFS};
use soul_core::db::{db_to_linear, linear_to_db};
use soul_core::AudioBuffer;

/// Result of a normalization pass
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// Normalized copy of the input
    pub buffer: AudioBuffer,
    /// `target - current`
    pub requested_gain_db: f64,
    /// Gain actually applied (lower than requested when peak protection engaged)
    pub applied_gain_db: f64,
    /// Sample peak after the makeup gain, before peak protection
    pub peak_before_limit: f32,
    /// Whether the buffer was scaled down to keep the peak at full scale
    pub peak_limited: bool,
}

impl Normalized {
    /// How far below the requested gain the result ended up
    pub fn gain_shortfall_db(&self) -> f64 {
        self.requested_gain_db - self.applied_gain_db
    }
}

/// Loudness normalizer
///
/// # Example
///
/// ```rust
/// use soul_core::{AudioBuffer, SampleRate};
/// use soul_loudness::{LoudnessConfig, Normalizer};
///
/// let normalizer = Normalizer::new(LoudnessConfig::new(SampleRate::CD_QUALITY, -16.0)?)?;
/// let quiet = AudioBuffer::mono(vec![0.01; 44_100], SampleRate::CD_QUALITY);
///
/// // Current loudness supplied by the caller
/// let result = normalizer.normalize(&quiet, Some(-40.0))?;
/// assert_eq!(result.requested_gain_db, 24.0);
/// assert!(!result.peak_limited);
/// # Ok::<(), soul_loudness::LoudnessError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Normalizer {
    meter: LoudnessMeter,
}

impl Normalizer {
    pub fn new(config: LoudnessConfig) -> Result<Self> {
        Ok(Self::from_meter(LoudnessMeter::new(config)?))
    }

    pub fn from_meter(meter: LoudnessMeter) -> Self {
        Self { meter }
    }

    pub fn meter(&self) -> &LoudnessMeter {
        &self.meter
    }

    pub fn target_lufs(&self) -> f64 {
        self.meter.target_lufs()
    }

    /// Normalize a buffer to the configured target
    ///
    /// `current_lufs` is measured when not supplied. A buffer whose loudness cannot be
    /// measured (silence, too short, or a non-finite / sentinel value supplied) is
    /// returned unchanged with 0 dB applied.
    ///
    /// # Errors
    /// As [`LoudnessMeter::integrated_loudness`] (only when measuring), plus
    /// `InvalidInput` for NaN/Inf samples.
    pub fn normalize(&self, buffer: &AudioBuffer, current_lufs: Option<f64>) -> Result<Normalized> {
        buffer.validate()?;

        let current = match current_lufs {
            Some(lufs) => Some(lufs),
            None => self.meter.integrated_loudness(buffer)?,
        }
        .filter(|lufs| lufs.is_finite() && *lufs > SILENCE_LUFS);

        let Some(current) = current else {
            tracing::warn!("loudness not measurable, skipping normalization");
            return Ok(Normalized {
                buffer: buffer.clone(),
                requested_gain_db: 0.0,
                applied_gain_db: 0.0,
                peak_before_limit: buffer.peak(),
                peak_limited: false,
            });
        };

        let requested_gain_db = self.meter.calculate_makeup_gain(current);
        Ok(apply_gain(buffer, requested_gain_db))
    }

    /// Measure and normalize in one step
    pub fn normalize_to_target(&self, buffer: &AudioBuffer) -> Result<Normalized> {
        self.normalize(buffer, None)
    }
}

/// Apply `gain_db`, then scale down by the peak if it exceeds full scale
fn apply_gain(buffer: &AudioBuffer, gain_db: f64) -> Normalized {
    let linear = db_to_linear(gain_db);
    let gained: Vec<f32> = buffer
        .samples
        .iter()
        .map(|&s| (f64::from(s) * linear) as f32)
        .collect();

    let peak = gained.iter().fold(0.0_f32, |m, s| m.max(s.abs()));
    if peak <= 1.0 {
        tracing::debug!(gain_db, peak, "applied makeup gain");
        return Normalized {
            buffer: buffer.with_samples(gained),
            requested_gain_db: gain_db,
            applied_gain_db: gain_db,
            peak_before_limit: peak,
            peak_limited: false,
        };
    }

    let applied_gain_db = gain_db - linear_to_db(f64::from(peak));
    tracing::warn!(
        requested_gain_db = gain_db,
        applied_gain_db,
        peak,
        "peak limiting applied"
    );

    let limited = gained.into_iter().map(|s| s / peak).collect();
    Normalized {
        buffer: buffer.with_samples(limited),
        requested_gain_db: gain_db,
        applied_gain_db,
        peak_before_limit: peak,
        peak_limited: true,
    }
}
