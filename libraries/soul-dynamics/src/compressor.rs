/// Dynamic Range Compressor
///
/// Reduces the dynamic range of audio by attenuating signals above a threshold.
/// Works on whole buffers: every channel runs through its own
/// envelope -> gain curve -> attack/release chain.
use crate::envelope::{EnvelopeDetector, DEFAULT_ENVELOPE_WINDOW};
use crate::error::{DynamicsError, Result};
use crate::gain_computer::GainComputer;
use crate::smoother::{Smoother, SmootherState};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use soul_core::db::{db_to_linear, linear_to_db};
use soul_core::{AudioBuffer, SampleRate};

/// Compressor configuration
///
/// Plain parameters; [`Compressor::new`] validates them and derives the cached
/// coefficients. Nothing is clamped: out-of-range values are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompressorConfig {
    /// Threshold in dB
    /// Levels above this are compressed
    pub threshold_db: f64,

    /// Ratio (1.0 = no compression, 4.0 = 4:1)
    pub ratio: f64,

    /// Attack time in milliseconds
    /// How quickly gain reduction deepens
    pub attack_ms: f64,

    /// Release time in milliseconds
    /// How quickly gain reduction recovers
    pub release_ms: f64,

    /// Knee width in dB (0 = hard knee, >0 = soft knee)
    pub knee_db: f64,

    /// Sample rate the time constants are derived for
    pub sample_rate: SampleRate,

    /// RMS detector window in samples
    pub envelope_window: usize,

    /// Accept ratios below 1.0 (upward expansion)
    pub allow_expansion: bool,
}

impl CompressorConfig {
    /// Create default compressor settings
    /// - Threshold: -20 dB
    /// - Ratio: 3:1
    /// - Attack: 5 ms
    /// - Release: 50 ms
    /// - Soft knee: 3 dB
    pub fn new(sample_rate: SampleRate) -> Self {
        Self {
            threshold_db: -20.0,
            ratio: 3.0,
            attack_ms: 5.0,
            release_ms: 50.0,
            knee_db: 3.0,
            sample_rate,
            envelope_window: DEFAULT_ENVELOPE_WINDOW,
            allow_expansion: false,
        }
    }

    /// Gentle compression (vocals, acoustic)
    pub fn gentle(sample_rate: SampleRate) -> Self {
        Self {
            threshold_db: -15.0,
            ratio: 2.5,
            attack_ms: 10.0,
            release_ms: 100.0,
            knee_db: 8.0,
            ..Self::new(sample_rate)
        }
    }

    /// Moderate compression (mix bus)
    pub fn moderate(sample_rate: SampleRate) -> Self {
        Self {
            threshold_db: -18.0,
            ratio: 4.0,
            attack_ms: 5.0,
            release_ms: 50.0,
            knee_db: 6.0,
            ..Self::new(sample_rate)
        }
    }

    /// Aggressive compression (near limiting)
    pub fn aggressive(sample_rate: SampleRate) -> Self {
        Self {
            threshold_db: -12.0,
            ratio: 10.0,
            attack_ms: 1.0,
            release_ms: 30.0,
            knee_db: 2.0,
            ..Self::new(sample_rate)
        }
    }

    pub fn with_threshold(mut self, threshold_db: f64) -> Self {
        self.threshold_db = threshold_db;
        self
    }

    pub fn with_ratio(mut self, ratio: f64) -> Self {
        self.ratio = ratio;
        self
    }

    pub fn with_attack(mut self, attack_ms: f64) -> Self {
        self.attack_ms = attack_ms;
        self
    }

    pub fn with_release(mut self, release_ms: f64) -> Self {
        self.release_ms = release_ms;
        self
    }

    pub fn with_knee(mut self, knee_db: f64) -> Self {
        self.knee_db = knee_db;
        self
    }

    pub fn with_envelope_window(mut self, window: usize) -> Self {
        self.envelope_window = window;
        self
    }

    pub fn with_expansion(mut self, allow: bool) -> Self {
        self.allow_expansion = allow;
        self
    }

    /// Check every parameter
    ///
    /// # Errors
    /// Returns `Configuration` for a non-finite threshold or knee, ratio <= 0 (or < 1
    /// without `allow_expansion`), attack/release <= 0, knee < 0, zero sample rate or
    /// zero envelope window.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(DynamicsError::Configuration(msg));

        if !self.threshold_db.is_finite() {
            return invalid(format!("threshold must be finite, got {}", self.threshold_db));
        }
        if !self.ratio.is_finite() || self.ratio <= 0.0 {
            return invalid(format!("ratio must be greater than 0, got {}", self.ratio));
        }
        if self.ratio < 1.0 && !self.allow_expansion {
            return invalid(format!(
                "ratio {} is below 1.0 (expansion) and expansion is not enabled",
                self.ratio
            ));
        }
        if !self.attack_ms.is_finite() || self.attack_ms <= 0.0 {
            return invalid(format!("attack must be greater than 0 ms, got {}", self.attack_ms));
        }
        if !self.release_ms.is_finite() || self.release_ms <= 0.0 {
            return invalid(format!(
                "release must be greater than 0 ms, got {}",
                self.release_ms
            ));
        }
        if !self.knee_db.is_finite() || self.knee_db < 0.0 {
            return invalid(format!("knee must be 0 dB or wider, got {}", self.knee_db));
        }
        if self.sample_rate.as_hz() == 0 {
            return invalid("sample rate must be greater than zero".to_string());
        }
        if self.envelope_window == 0 {
            return invalid("envelope window must be at least one sample".to_string());
        }
        Ok(())
    }
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self::new(SampleRate::CD_QUALITY)
    }
}

/// Before/after level statistics of a compression pass
///
/// Both signals are downmixed to mono first. Levels are dB with the silence floor of
/// `soul_core::db`, so an all-zero buffer reports finite values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompressionStats {
    pub original_rms_db: f64,
    pub compressed_rms_db: f64,
    pub original_peak_db: f64,
    pub compressed_peak_db: f64,
    /// Peak minus RMS of the original
    pub original_dynamic_range_db: f64,
    /// Peak minus RMS of the compressed signal
    pub compressed_dynamic_range_db: f64,
    /// Compressed RMS minus original RMS
    pub gain_reduction_db: f64,
}

impl CompressionStats {
    /// How much the peak-to-RMS range shrank
    pub fn dynamic_range_reduction_db(&self) -> f64 {
        self.original_dynamic_range_db - self.compressed_dynamic_range_db
    }
}

/// Offline dynamic range compressor
///
/// Pipeline per channel:
/// 1. RMS envelope (centered moving average, `envelope_window` samples)
/// 2. Static soft-knee gain curve on the envelope
/// 3. Attack/release smoothing of the gain reduction
/// 4. dB to linear, multiplied into the original samples
///
/// Channels are independent and are fanned out across the rayon pool. The compressor
/// itself holds no per-buffer state, so one instance can serve many calls.
#[derive(Debug, Clone)]
pub struct Compressor {
    config: CompressorConfig,
    envelope: EnvelopeDetector,
    gain_computer: GainComputer,
    smoother: Smoother,
}

impl Compressor {
    /// Validate the configuration and cache derived coefficients
    pub fn new(config: CompressorConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            envelope: EnvelopeDetector::new(config.envelope_window)?,
            gain_computer: GainComputer::new(config.threshold_db, config.ratio, config.knee_db),
            smoother: Smoother::new(config.attack_ms, config.release_ms, config.sample_rate),
            config,
        })
    }

    /// Get the configuration this compressor was built from
    pub fn config(&self) -> &CompressorConfig {
        &self.config
    }

    pub fn gain_computer(&self) -> &GainComputer {
        &self.gain_computer
    }

    pub fn smoother(&self) -> &Smoother {
        &self.smoother
    }

    pub fn envelope(&self) -> &EnvelopeDetector {
        &self.envelope
    }

    /// Compress a buffer, returning a new buffer of identical shape
    ///
    /// # Errors
    /// `InvalidInput` for NaN/Inf samples or ragged channels, `SampleRateMismatch` if the
    /// buffer rate differs from the configured rate. No partial output is produced.
    pub fn compress(&self, buffer: &AudioBuffer) -> Result<AudioBuffer> {
        buffer.validate()?;
        self.check_sample_rate(buffer)?;

        let channels = buffer.split_channels();
        let compressed: Vec<Vec<f32>> = channels
            .par_iter()
            .map(|channel| self.compress_channel(channel))
            .collect();

        tracing::debug!(
            channels = buffer.channels(),
            frames = buffer.frames(),
            threshold_db = self.config.threshold_db,
            ratio = self.config.ratio,
            "compressed buffer"
        );

        Ok(buffer.with_channels(&compressed))
    }

    /// Compress one channel starting from a fresh smoother state
    pub fn compress_channel(&self, samples: &[f32]) -> Vec<f32> {
        let mut state = SmootherState::default();
        self.compress_channel_with_state(samples, &mut state)
    }

    /// Compress one channel, continuing from (and updating) `state`
    pub fn compress_channel_with_state(
        &self,
        samples: &[f32],
        state: &mut SmootherState,
    ) -> Vec<f32> {
        let smoothed = self.gain_reduction_with_state(samples, state);

        samples
            .iter()
            .zip(smoothed)
            .map(|(&sample, reduction_db)| (f64::from(sample) * db_to_linear(reduction_db)) as f32)
            .collect()
    }

    /// Smoothed gain reduction curve (dB, one value per sample) for one channel
    pub fn gain_reduction(&self, samples: &[f32]) -> Vec<f64> {
        let mut state = SmootherState::default();
        self.gain_reduction_with_state(samples, &mut state)
    }

    fn gain_reduction_with_state(&self, samples: &[f32], state: &mut SmootherState) -> Vec<f64> {
        let levels = self.envelope.detect(samples);
        let targets = self.gain_computer.reductions(&levels);
        self.smoother.process(&targets, state)
    }

    /// Compare levels before and after compression
    ///
    /// # Errors
    /// `InvalidInput` if either buffer fails validation or their lengths differ,
    /// `SampleRateMismatch` if their rates differ.
    pub fn stats(&self, original: &AudioBuffer, compressed: &AudioBuffer) -> Result<CompressionStats> {
        compression_stats(original, compressed)
    }

    fn check_sample_rate(&self, buffer: &AudioBuffer) -> Result<()> {
        let expected = self.config.sample_rate.as_hz();
        let actual = buffer.sample_rate().as_hz();
        if expected != actual {
            return Err(DynamicsError::SampleRateMismatch { expected, actual });
        }
        Ok(())
    }
}

/// Level statistics of a compression pass (see [`CompressionStats`])
pub fn compression_stats(original: &AudioBuffer, compressed: &AudioBuffer) -> Result<CompressionStats> {
    original.validate()?;
    compressed.validate()?;

    let expected = original.sample_rate().as_hz();
    let actual = compressed.sample_rate().as_hz();
    if expected != actual {
        return Err(DynamicsError::SampleRateMismatch { expected, actual });
    }
    if original.frames() != compressed.frames() {
        return Err(DynamicsError::InvalidInput(format!(
            "frame count mismatch: original {}, compressed {}",
            original.frames(),
            compressed.frames()
        )));
    }

    let (original_rms_db, original_peak_db) = mono_levels(original);
    let (compressed_rms_db, compressed_peak_db) = mono_levels(compressed);

    Ok(CompressionStats {
        original_rms_db,
        compressed_rms_db,
        original_peak_db,
        compressed_peak_db,
        original_dynamic_range_db: original_peak_db - original_rms_db,
        compressed_dynamic_range_db: compressed_peak_db - compressed_rms_db,
        gain_reduction_db: compressed_rms_db - original_rms_db,
    })
}

/// (RMS dB, peak dB) of the mono downmix
fn mono_levels(buffer: &AudioBuffer) -> (f64, f64) {
    let mono = AudioBuffer::mono(buffer.downmix_mono(), buffer.sample_rate());
    (linear_to_db(mono.rms()), linear_to_db(f64::from(mono.peak())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use soul_core::db::SILENCE_DB;

    fn sine(amplitude: f32, freq: f32, sample_rate: u32, seconds: f32) -> Vec<f32> {
        let n = (sample_rate as f32 * seconds) as usize;
        (0..n)
            .map(|i| amplitude * (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn default_config_is_valid() {
        assert!(CompressorConfig::default().validate().is_ok());
        assert!(CompressorConfig::gentle(SampleRate::CD_QUALITY).validate().is_ok());
        assert!(CompressorConfig::moderate(SampleRate::CD_QUALITY).validate().is_ok());
        assert!(CompressorConfig::aggressive(SampleRate::CD_QUALITY).validate().is_ok());
    }

    #[test]
    fn preset_settings() {
        assert_eq!(CompressorConfig::gentle(SampleRate::CD_QUALITY).ratio, 2.5);
        assert_eq!(CompressorConfig::moderate(SampleRate::CD_QUALITY).ratio, 4.0);
        assert_eq!(CompressorConfig::aggressive(SampleRate::CD_QUALITY).ratio, 10.0);
    }

    #[test]
    fn invalid_settings_are_rejected_not_clamped() {
        let base = CompressorConfig::default();
        let bad = [
            base.with_ratio(0.0),
            base.with_ratio(-2.0),
            base.with_ratio(0.5),
            base.with_ratio(f64::NAN),
            base.with_attack(0.0),
            base.with_release(-1.0),
            base.with_knee(-0.1),
            base.with_threshold(f64::INFINITY),
            base.with_envelope_window(0),
            CompressorConfig::new(SampleRate::new(0)),
        ];
        for config in bad {
            assert!(
                matches!(Compressor::new(config), Err(DynamicsError::Configuration(_))),
                "accepted {:?}",
                config
            );
        }
    }

    #[test]
    fn expansion_needs_opt_in() {
        let config = CompressorConfig::default().with_ratio(0.5);
        assert!(Compressor::new(config).is_err());
        assert!(Compressor::new(config.with_expansion(true)).is_ok());
    }

    #[test]
    fn process_reduces_loud_signal() {
        let comp = Compressor::new(CompressorConfig::aggressive(SampleRate::CD_QUALITY)).unwrap();
        let input = AudioBuffer::mono(vec![0.8; 4410], SampleRate::CD_QUALITY);

        let output = comp.compress(&input).unwrap();

        // Skip the attack phase
        let avg = output.samples.iter().skip(1000).sum::<f32>() / 3410.0;
        assert!(avg < 0.8, "Signal should be compressed");
    }

    #[test]
    fn quiet_signal_passes_untouched() {
        let comp = Compressor::new(CompressorConfig::default()).unwrap();
        // -40 dBFS is far below the -21.5 dB knee start
        let input = AudioBuffer::mono(sine(0.01, 440.0, 44_100, 0.2), SampleRate::CD_QUALITY);
        let output = comp.compress(&input).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn shape_is_preserved() {
        let comp = Compressor::new(CompressorConfig::default()).unwrap();
        let stereo = AudioBuffer::from_channels(
            vec![sine(0.9, 440.0, 44_100, 0.1), sine(0.2, 220.0, 44_100, 0.1)],
            SampleRate::CD_QUALITY,
        )
        .unwrap();

        let output = comp.compress(&stereo).unwrap();
        assert_eq!(output.format, stereo.format);
        assert_eq!(output.len(), stereo.len());
    }

    #[test]
    fn channels_are_processed_independently() {
        let comp = Compressor::new(CompressorConfig::default()).unwrap();
        let loud = sine(0.9, 440.0, 44_100, 0.1);
        let quiet = sine(0.01, 440.0, 44_100, 0.1);
        let stereo =
            AudioBuffer::from_channels(vec![loud.clone(), quiet.clone()], SampleRate::CD_QUALITY)
                .unwrap();

        let output = comp.compress(&stereo).unwrap();
        assert_eq!(output.channel(0), comp.compress_channel(&loud));
        assert_eq!(output.channel(1), quiet);
    }

    #[test]
    fn sample_rate_mismatch_is_rejected() {
        let comp = Compressor::new(CompressorConfig::default()).unwrap();
        let input = AudioBuffer::mono(vec![0.0; 16], SampleRate::DVD_QUALITY);
        assert!(matches!(
            comp.compress(&input),
            Err(DynamicsError::SampleRateMismatch { expected: 44_100, actual: 48_000 })
        ));
    }

    #[test]
    fn stats_require_matching_buffers() {
        let original = AudioBuffer::mono(vec![0.5; 64], SampleRate::CD_QUALITY);
        let resampled = AudioBuffer::mono(vec![0.5; 64], SampleRate::DVD_QUALITY);
        assert!(matches!(
            compression_stats(&original, &resampled),
            Err(DynamicsError::SampleRateMismatch { expected: 44_100, actual: 48_000 })
        ));

        let truncated = AudioBuffer::mono(vec![0.5; 32], SampleRate::CD_QUALITY);
        assert!(matches!(
            compression_stats(&original, &truncated),
            Err(DynamicsError::InvalidInput(_))
        ));
    }

    #[test]
    fn nan_input_is_rejected() {
        let comp = Compressor::new(CompressorConfig::default()).unwrap();
        let input = AudioBuffer::mono(vec![0.0, f32::NAN], SampleRate::CD_QUALITY);
        assert!(matches!(comp.compress(&input), Err(DynamicsError::InvalidInput(_))));
    }

    #[test]
    fn carried_state_continues_reduction() {
        let comp = Compressor::new(CompressorConfig::aggressive(SampleRate::CD_QUALITY)).unwrap();
        let loud = vec![0.9_f32; 2048];

        let mut state = SmootherState::default();
        comp.compress_channel_with_state(&loud, &mut state);
        assert!(state.gain_reduction_db() < 0.0);

        let fresh = comp.compress_channel(&loud);
        let carried = comp.compress_channel_with_state(&loud, &mut state);
        // A carried state starts already compressed
        assert!(carried[0] < fresh[0]);
    }

    #[test]
    fn stats_on_silence_are_finite() {
        let comp = Compressor::new(CompressorConfig::default()).unwrap();
        let silence = AudioBuffer::mono(vec![0.0; 1024], SampleRate::CD_QUALITY);
        let compressed = comp.compress(&silence).unwrap();

        let stats = comp.stats(&silence, &compressed).unwrap();
        assert_eq!(stats.original_rms_db, SILENCE_DB);
        assert_eq!(stats.compressed_peak_db, SILENCE_DB);
        assert_eq!(stats.original_dynamic_range_db, 0.0);
        assert_eq!(stats.gain_reduction_db, 0.0);
    }

    #[test]
    fn stats_downmix_before_measuring() {
        let comp = Compressor::new(CompressorConfig::default()).unwrap();
        // Opposite-polarity channels cancel in the downmix
        let stereo = AudioBuffer::from_channels(
            vec![vec![0.5; 64], vec![-0.5; 64]],
            SampleRate::CD_QUALITY,
        )
        .unwrap();
        let stats = comp.stats(&stereo, &stereo).unwrap();
        assert_eq!(stats.original_peak_db, SILENCE_DB);
    }
}
