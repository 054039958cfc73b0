//! Decibel / linear conversions
//!
//! All level statistics go through [`linear_to_db`], which clamps the linear value to
//! [`DB_FLOOR_LINEAR`] before taking the logarithm. Silence therefore maps to the finite
//! sentinel [`SILENCE_DB`] instead of `-inf`, so downstream arithmetic stays finite.

/// Smallest linear magnitude considered by [`linear_to_db`]
pub const DB_FLOOR_LINEAR: f64 = 1e-10;

/// Level reported for digital silence (`20 * log10(1e-10)`)
pub const SILENCE_DB: f64 = -200.0;

/// Convert a linear magnitude to dB, floored at [`SILENCE_DB`]
#[inline]
pub fn linear_to_db(linear: f64) -> f64 {
    20.0 * linear.max(DB_FLOOR_LINEAR).log10()
}

/// Convert dB to a linear gain factor
#[inline]
pub fn db_to_linear(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Whether a dB value sits at (or below) the silence sentinel
#[inline]
pub fn is_silence_db(db: f64) -> bool {
    db <= SILENCE_DB
}
