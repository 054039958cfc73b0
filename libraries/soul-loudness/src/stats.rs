//! Loudness statistics record

use serde::{Deserialize, Serialize};
use std::fmt;

/// Loudness summary of a buffer against a target level
///
/// Levels use the finite silence floors (`SILENCE_LUFS`, `soul_core::db::SILENCE_DB`)
/// so every field is a plain number, even for digital silence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoudnessStats {
    /// Integrated loudness in LUFS
    pub integrated_lufs: f64,

    /// Sample peak over all channels in dBFS
    pub peak_db: f64,

    /// RMS over all samples in dBFS
    pub rms_db: f64,

    /// Peak minus RMS
    pub crest_factor_db: f64,

    /// Target the meter was configured with
    pub target_lufs: f64,

    /// Integrated loudness minus target (positive = too loud)
    pub lufs_difference: f64,

    /// Gain needed to reach the target
    pub required_makeup_gain_db: f64,
}

impl LoudnessStats {
    /// Check if applying the makeup gain would push the sample peak over full scale
    pub fn will_clip_at_makeup(&self) -> bool {
        self.peak_db + self.required_makeup_gain_db > 0.0
    }
}

impl fmt::Display for LoudnessStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Loudness: {:.1} LUFS (target {:.1}, diff {:+.1} LU), Peak: {:.1} dBFS, RMS: {:.1} dBFS, Crest: {:.1} dB",
            self.integrated_lufs,
            self.target_lufs,
            self.lufs_difference,
            self.peak_db,
            self.rms_db,
            self.crest_factor_db
        )
    }
}
