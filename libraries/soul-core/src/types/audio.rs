/// Audio-related types
use crate::error::{Result, SoulError};
use serde::{Deserialize, Serialize};

/// Sample rate in Hz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleRate(pub u32);

impl SampleRate {
    /// Common sample rates
    pub const CD_QUALITY: Self = Self(44_100);
    pub const DVD_QUALITY: Self = Self(48_000);
    pub const HIGH_RES_88: Self = Self(88_200);
    pub const HIGH_RES_96: Self = Self(96_000);
    pub const HIGH_RES_176: Self = Self(176_400);
    pub const HIGH_RES_192: Self = Self(192_000);

    /// Create a new sample rate
    #[must_use]
    pub fn new(hz: u32) -> Self {
        Self(hz)
    }

    /// Get the sample rate as Hz
    pub fn as_hz(&self) -> u32 {
        self.0
    }

    /// Get the sample rate as `f64` Hz (for coefficient design)
    pub fn as_f64(&self) -> f64 {
        f64::from(self.0)
    }
}

/// Audio format information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    /// Sample rate
    pub sample_rate: SampleRate,

    /// Number of channels (1 = mono, 2 = stereo, etc.)
    pub channels: u16,

    /// Bits per sample of the source material
    pub bits_per_sample: u16,
}

impl AudioFormat {
    /// Create a new audio format
    pub fn new(sample_rate: SampleRate, channels: u16, bits_per_sample: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bits_per_sample,
        }
    }

    /// Create a 32-bit float format (the in-memory processing format)
    pub fn float(sample_rate: SampleRate, channels: u16) -> Self {
        Self::new(sample_rate, channels, 32)
    }

    /// Create CD quality stereo format (44.1kHz, 16-bit, stereo)
    pub fn cd_quality() -> Self {
        Self {
            sample_rate: SampleRate::CD_QUALITY,
            channels: 2,
            bits_per_sample: 16,
        }
    }
}

/// Audio buffer containing decoded samples
///
/// Samples are stored as f32, nominally in the range [-1.0, 1.0].
/// Interleaved format: [L, R, L, R, ...] for stereo, plain sequence for mono.
///
/// Processing never mutates a buffer in place; operations return a new buffer with the
/// same format.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Audio samples (f32, interleaved)
    pub samples: Vec<f32>,

    /// Audio format information
    pub format: AudioFormat,
}

impl AudioBuffer {
    /// Create a new audio buffer
    pub fn new(samples: Vec<f32>, format: AudioFormat) -> Self {
        Self { samples, format }
    }

    /// Create a mono buffer
    pub fn mono(samples: Vec<f32>, sample_rate: SampleRate) -> Self {
        Self::new(samples, AudioFormat::float(sample_rate, 1))
    }

    /// Create an interleaved buffer from planar channel data
    ///
    /// # Errors
    /// Returns `InvalidInput` if no channels are given or the channels differ in length.
    pub fn from_channels(channels: Vec<Vec<f32>>, sample_rate: SampleRate) -> Result<Self> {
        let Some(first) = channels.first() else {
            return Err(SoulError::invalid_input("buffer must have at least one channel"));
        };
        let frames = first.len();

        if let Some((index, channel)) = channels
            .iter()
            .enumerate()
            .find(|(_, channel)| channel.len() != frames)
        {
            return Err(SoulError::invalid_input(format!(
                "channel {} has {} samples, expected {}",
                index,
                channel.len(),
                frames
            )));
        }

        let channel_count = u16::try_from(channels.len()).map_err(|_| {
            SoulError::invalid_input(format!("too many channels: {}", channels.len()))
        })?;

        Ok(Self::new(
            interleave(&channels, frames),
            AudioFormat::float(sample_rate, channel_count),
        ))
    }

    /// Build a buffer with this buffer's format from planar channel data
    ///
    /// Channels are assumed to be equal length; they come from [`Self::split_channels`]
    /// of a validated buffer.
    pub fn with_channels(&self, channels: &[Vec<f32>]) -> Self {
        let frames = channels.first().map_or(0, Vec::len);
        Self::new(interleave(channels, frames), self.format)
    }

    /// Build a buffer with this buffer's format from interleaved samples
    pub fn with_samples(&self, samples: Vec<f32>) -> Self {
        Self::new(samples, self.format)
    }

    /// Get the number of channels
    pub fn channels(&self) -> usize {
        usize::from(self.format.channels)
    }

    /// Get the sample rate
    pub fn sample_rate(&self) -> SampleRate {
        self.format.sample_rate
    }

    /// Get the number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        match self.channels() {
            0 => 0,
            channels => self.samples.len() / channels,
        }
    }

    /// Get the duration in seconds
    pub fn duration_secs(&self) -> f64 {
        match self.format.sample_rate.as_hz() {
            0 => 0.0,
            hz => self.frames() as f64 / f64::from(hz),
        }
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Get the length in samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Copy one channel out of the interleaved data
    pub fn channel(&self, index: usize) -> Vec<f32> {
        let channels = self.channels();
        if index >= channels {
            return Vec::new();
        }
        self.samples
            .iter()
            .skip(index)
            .step_by(channels)
            .copied()
            .collect()
    }

    /// De-interleave into one `Vec` per channel
    pub fn split_channels(&self) -> Vec<Vec<f32>> {
        (0..self.channels()).map(|ch| self.channel(ch)).collect()
    }

    /// Average all channels of each frame into a mono signal
    pub fn downmix_mono(&self) -> Vec<f32> {
        let channels = self.channels();
        match channels {
            0 => Vec::new(),
            1 => self.samples.clone(),
            _ => self
                .samples
                .chunks_exact(channels)
                .map(|frame| {
                    let sum: f64 = frame.iter().map(|&s| f64::from(s)).sum();
                    (sum / channels as f64) as f32
                })
                .collect(),
        }
    }

    /// Largest absolute sample value across all channels (0.0 for an empty buffer)
    pub fn peak(&self) -> f32 {
        peak(&self.samples)
    }

    /// Root-mean-square over all samples of all channels (0.0 for an empty buffer)
    pub fn rms(&self) -> f64 {
        rms(&self.samples)
    }

    /// Check the buffer invariants required before any processing
    ///
    /// # Errors
    /// Returns `InvalidInput` if the buffer has no channels, a zero sample rate,
    /// channels of unequal length, or any non-finite sample.
    pub fn validate(&self) -> Result<()> {
        let channels = self.channels();
        if channels == 0 {
            return Err(SoulError::invalid_input("buffer must have at least one channel"));
        }
        if self.format.sample_rate.as_hz() == 0 {
            return Err(SoulError::invalid_input("sample rate must be greater than zero"));
        }
        if self.samples.len() % channels != 0 {
            return Err(SoulError::invalid_input(format!(
                "sample count {} is not divisible by channel count {} (mismatched channel lengths)",
                self.samples.len(),
                channels
            )));
        }
        if let Some(index) = self.samples.iter().position(|s| !s.is_finite()) {
            return Err(SoulError::invalid_input(format!(
                "non-finite sample {} at index {} (channel {}, frame {})",
                self.samples[index],
                index,
                index % channels,
                index / channels
            )));
        }
        Ok(())
    }
}

/// Largest absolute value of a sample slice
pub(crate) fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()))
}

/// RMS of a sample slice, accumulated in f64
pub(crate) fn rms(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples
        .iter()
        .map(|&s| {
            let s = f64::from(s);
            s * s
        })
        .sum();
    (sum_sq / samples.len() as f64).sqrt()
}

fn interleave(channels: &[Vec<f32>], frames: usize) -> Vec<f32> {
    let mut samples = Vec::with_capacity(frames * channels.len());
    for frame in 0..frames {
        for channel in channels {
            samples.push(channel[frame]);
        }
    }
    samples
}
