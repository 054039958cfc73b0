//! Static gain computer
//!
//! Maps an instantaneous level in dB to a gain reduction in dB using a threshold, a
//! ratio and an optional quadratic soft knee.

/// Soft-knee gain curve
///
/// With `knee_start = threshold - knee/2` and `knee_end = threshold + knee/2`:
///
/// ```text
/// level < knee_start             reduction = 0
/// knee_start <= level <= knee_end reduction = (1/ratio - 1) * x^2 / (2 * knee),  x = level - knee_start
/// level > knee_end               reduction = -(level - threshold) * (1 - 1/ratio)
/// ```
///
/// The knee branch is 0 with zero slope at `knee_start` and meets the linear branch in
/// value and slope at `knee_end`. A knee of 0 dB is a hard knee.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainComputer {
    threshold_db: f64,
    ratio: f64,
    knee_db: f64,
}

impl GainComputer {
    /// Create a gain computer
    ///
    /// Parameters are taken as-is; range checks live in `CompressorConfig::validate`.
    pub fn new(threshold_db: f64, ratio: f64, knee_db: f64) -> Self {
        Self {
            threshold_db,
            ratio,
            knee_db,
        }
    }

    pub fn threshold_db(&self) -> f64 {
        self.threshold_db
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn knee_db(&self) -> f64 {
        self.knee_db
    }

    /// Lower edge of the knee region in dB
    pub fn knee_start(&self) -> f64 {
        self.threshold_db - self.knee_db / 2.0
    }

    /// Upper edge of the knee region in dB
    pub fn knee_end(&self) -> f64 {
        self.threshold_db + self.knee_db / 2.0
    }

    /// Gain reduction in dB for an input level in dB
    ///
    /// Never positive for `ratio >= 1`. Exactly 0 below the knee and everywhere when
    /// `ratio == 1`.
    #[inline]
    pub fn reduction(&self, level_db: f64) -> f64 {
        let knee_start = self.knee_start();
        if level_db < knee_start {
            return 0.0;
        }

        if self.knee_db > 0.0 && level_db <= self.knee_end() {
            let x = level_db - knee_start;
            return (1.0 / self.ratio - 1.0) * x * x / (2.0 * self.knee_db);
        }

        let overshoot = level_db - self.threshold_db;
        -overshoot * (1.0 - 1.0 / self.ratio)
    }

    /// Output level in dB for an input level in dB (the transfer curve)
    #[inline]
    pub fn output_level(&self, level_db: f64) -> f64 {
        level_db + self.reduction(level_db)
    }

    /// Apply [`Self::reduction`] elementwise to a level curve
    pub fn reductions(&self, levels_db: &[f64]) -> Vec<f64> {
        levels_db.iter().map(|&level| self.reduction(level)).collect()
    }
}
