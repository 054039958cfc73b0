//! Attack/release smoothing of gain reduction
//!
//! One-pole exponential filter with separate coefficients for deepening (attack) and
//! recovering (release) gain reduction. The recurrence is serial in time; the state is
//! an explicit value owned by the caller so channels can run independently and a
//! streaming caller could carry it across buffer boundaries.

use soul_core::SampleRate;

/// Per-channel smoother state: the current smoothed gain reduction in dB
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SmootherState {
    gain_reduction_db: f64,
}

impl SmootherState {
    /// Start from a given gain reduction
    pub fn new(gain_reduction_db: f64) -> Self {
        Self { gain_reduction_db }
    }

    /// Current smoothed gain reduction in dB
    pub fn gain_reduction_db(&self) -> f64 {
        self.gain_reduction_db
    }

    /// Return to 0 dB (no reduction)
    pub fn reset(&mut self) {
        self.gain_reduction_db = 0.0;
    }
}

/// Exponential attack/release smoother with cached coefficients
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smoother {
    attack_coef: f64,
    release_coef: f64,
}

impl Smoother {
    /// Derive coefficients from time constants
    ///
    /// `coef = exp(-1 / (sample_rate * time_ms / 1000))`, i.e. the state covers 63.2%
    /// (1 - 1/e) of a step after `time_ms`.
    pub fn new(attack_ms: f64, release_ms: f64, sample_rate: SampleRate) -> Self {
        Self {
            attack_coef: time_constant_coef(attack_ms, sample_rate),
            release_coef: time_constant_coef(release_ms, sample_rate),
        }
    }

    pub fn attack_coef(&self) -> f64 {
        self.attack_coef
    }

    pub fn release_coef(&self) -> f64 {
        self.release_coef
    }

    /// Advance the state by one sample toward `target_db` and return the new state
    #[inline]
    pub fn step(&self, target_db: f64, state: &mut SmootherState) -> f64 {
        // Deeper reduction requested = attack
        let coef = if target_db < state.gain_reduction_db {
            self.attack_coef
        } else {
            self.release_coef
        };

        state.gain_reduction_db = target_db + coef * (state.gain_reduction_db - target_db);
        state.gain_reduction_db
    }

    /// Smooth a whole target sequence, updating `state` in place
    pub fn process(&self, targets_db: &[f64], state: &mut SmootherState) -> Vec<f64> {
        targets_db
            .iter()
            .map(|&target| self.step(target, state))
            .collect()
    }
}

fn time_constant_coef(time_ms: f64, sample_rate: SampleRate) -> f64 {
    (-1.0 / (sample_rate.as_f64() * time_ms / 1000.0)).exp()
}
