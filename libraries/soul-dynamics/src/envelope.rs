//! RMS envelope detection
//!
//! The detector squares the signal, runs a centered moving average over it and reports
//! the root of the result in dB. The window is centered on each sample, so the envelope
//! looks `window / 2` samples into the future. That is fine for whole-buffer (offline)
//! processing and is the reason this detector is not usable in a real-time path.

use crate::error::{DynamicsError, Result};
use soul_core::db::linear_to_db;

/// Default moving-average window in samples
pub const DEFAULT_ENVELOPE_WINDOW: usize = 512;

/// Centered moving-RMS level detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeDetector {
    window: usize,
}

impl EnvelopeDetector {
    /// Create a detector with the given window length
    ///
    /// # Errors
    /// `Configuration` for a zero-length window.
    pub fn new(window: usize) -> Result<Self> {
        if window == 0 {
            return Err(DynamicsError::Configuration(
                "envelope window must be at least one sample".to_string(),
            ));
        }
        Ok(Self { window })
    }

    /// Window length in samples
    pub fn window(&self) -> usize {
        self.window
    }

    /// Samples of lookahead introduced by centering the window
    pub fn lookahead(&self) -> usize {
        (self.window - 1) - self.window / 2
    }

    /// Compute the RMS level in dB for every sample
    ///
    /// Output has the same length as the input. The window is zero-padded at both ends
    /// and always divided by the full window length, so levels taper near the edges.
    /// For a window of `m` samples, output `k` averages inputs `k - m/2 ..= k + lookahead`.
    pub fn detect(&self, samples: &[f32]) -> Vec<f64> {
        let n = samples.len();
        let m = self.window;
        let ahead = self.lookahead();
        let behind = m - 1 - ahead;

        let squared: Vec<f64> = samples
            .iter()
            .map(|&s| {
                let s = f64::from(s);
                s * s
            })
            .collect();

        let mut sum: f64 = squared[..(ahead + 1).min(n)].iter().sum();
        let mut levels = Vec::with_capacity(n);

        for k in 0..n {
            if k > 0 {
                if let Some(entering) = squared.get(k + ahead) {
                    sum += entering;
                }
                if k > behind {
                    sum -= squared[k - behind - 1];
                }
            }
            // Running sums can dip a hair below zero after loud passages.
            let mean = (sum / m as f64).max(0.0);
            levels.push(linear_to_db(mean.sqrt()));
        }

        levels
    }
}

impl Default for EnvelopeDetector {
    fn default() -> Self {
        Self {
            window: DEFAULT_ENVELOPE_WINDOW,
        }
    }
}
