//! Property-based tests for the dynamics chain
//!
//! These tests use proptest to verify invariants across many random inputs.

use proptest::prelude::*;
use soul_core::{AudioBuffer, SampleRate};
use soul_dynamics::{Compressor, CompressorConfig, GainComputer};

// Helper: Check if buffer contains only finite values
fn all_finite(buffer: &[f32]) -> bool {
    buffer.iter().all(|s| s.is_finite())
}

// Helper: Calculate peak
fn peak(buffer: &[f32]) -> f32 {
    buffer.iter().map(|s| s.abs()).fold(0.0f32, f32::max)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: gain reduction is exactly 0 below the knee
    #[test]
    fn no_reduction_below_knee(
        threshold in -60.0f64..0.0,
        ratio in 1.0f64..20.0,
        knee in 0.0f64..12.0,
        below in 0.001f64..80.0,
    ) {
        let gc = GainComputer::new(threshold, ratio, knee);
        prop_assert_eq!(gc.reduction(gc.knee_start() - below), 0.0);
    }

    /// Property: gain reduction never boosts for ratio >= 1
    #[test]
    fn reduction_is_never_positive(
        threshold in -60.0f64..0.0,
        ratio in 1.0f64..20.0,
        knee in 0.0f64..12.0,
        level in -120.0f64..24.0,
    ) {
        let gc = GainComputer::new(threshold, ratio, knee);
        prop_assert!(gc.reduction(level) <= 0.0);
    }

    /// Property: more ratio never means less reduction at the same overshoot
    #[test]
    fn reduction_is_monotonic_in_ratio(
        threshold in -60.0f64..0.0,
        knee in 0.0f64..12.0,
        overshoot in -12.0f64..40.0,
        ratio in 1.0f64..20.0,
        extra in 0.0f64..20.0,
    ) {
        let level = threshold + overshoot;
        let softer = GainComputer::new(threshold, ratio, knee).reduction(level);
        let harder = GainComputer::new(threshold, ratio + extra, knee).reduction(level);
        prop_assert!(harder <= softer + 1e-12, "ratio {} gave {}, ratio {} gave {}", ratio, softer, ratio + extra, harder);
    }

    /// Property: the soft knee meets the linear branch at both edges
    #[test]
    fn knee_edges_are_continuous(
        threshold in -60.0f64..0.0,
        ratio in 1.0f64..20.0,
        knee in 0.1f64..12.0,
    ) {
        let gc = GainComputer::new(threshold, ratio, knee);
        let h = 1e-7;
        prop_assert!((gc.reduction(gc.knee_start() - h) - gc.reduction(gc.knee_start() + h)).abs() < 1e-6);
        prop_assert!((gc.reduction(gc.knee_end() - h) - gc.reduction(gc.knee_end() + h)).abs() < 1e-6);
    }

    /// Property: Compressor should never produce NaN or Inf, nor raise the peak
    #[test]
    fn compressor_output_is_finite_and_never_louder(
        threshold_db in -60.0f64..0.0,
        ratio in 1.0f64..20.0,
        attack_ms in 0.1f64..100.0,
        release_ms in 10.0f64..1000.0,
        knee_db in 0.0f64..10.0,
        samples in prop::collection::vec(-1.0f32..1.0, 100..2000)
    ) {
        let config = CompressorConfig::new(SampleRate::CD_QUALITY)
            .with_threshold(threshold_db)
            .with_ratio(ratio)
            .with_attack(attack_ms)
            .with_release(release_ms)
            .with_knee(knee_db);
        let compressor = Compressor::new(config).unwrap();

        let input = AudioBuffer::mono(samples, SampleRate::CD_QUALITY);
        let output = compressor.compress(&input).unwrap();

        prop_assert!(all_finite(&output.samples), "Compressor produced NaN or Inf");
        prop_assert!(peak(&output.samples) <= peak(&input.samples));
        for (out, inp) in output.samples.iter().zip(input.samples.iter()) {
            prop_assert!(out.abs() <= inp.abs());
        }
    }

    /// Property: ratio 1:1 is a bit-exact bypass
    #[test]
    fn unity_ratio_is_bypass(
        threshold_db in -60.0f64..0.0,
        knee_db in 0.0f64..10.0,
        samples in prop::collection::vec(-1.0f32..1.0, 1..1000)
    ) {
        let config = CompressorConfig::new(SampleRate::CD_QUALITY)
            .with_threshold(threshold_db)
            .with_ratio(1.0)
            .with_knee(knee_db);
        let compressor = Compressor::new(config).unwrap();

        let input = AudioBuffer::mono(samples, SampleRate::CD_QUALITY);
        let output = compressor.compress(&input).unwrap();
        prop_assert_eq!(output, input);
    }
}
