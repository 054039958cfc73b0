//! Compressor Precision Tests
//!
//! Verifies the offline compressor against its defining behaviour:
//! - Static curve: threshold, ratio, soft knee continuity
//! - Transparency: ratio 1:1 is an exact identity
//! - Timing: step response of the attack/release smoother
//! - Reference scenario: 1 kHz sine at -6 dBFS peak, 5 s, 44.1 kHz
//! - Degenerate input: digital silence

use soul_core::db::{linear_to_db, SILENCE_DB};
use soul_core::{AudioBuffer, SampleRate};
use soul_dynamics::{Compressor, CompressorConfig, DynamicsError};
use std::f32::consts::PI;

const SAMPLE_RATE: u32 = 44_100;

// =============================================================================
// Signal Generators
// =============================================================================

fn generate_sine(frequency: f32, amplitude: f32, duration_secs: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| amplitude * (2.0 * PI * frequency * i as f32 / SAMPLE_RATE as f32).sin())
        .collect()
}

fn rms_db(samples: &[f32]) -> f64 {
    let sum: f64 = samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
    linear_to_db((sum / samples.len() as f64).sqrt())
}

fn peak_db(samples: &[f32]) -> f64 {
    linear_to_db(f64::from(samples.iter().fold(0.0_f32, |m, s| m.max(s.abs()))))
}

fn reference_config() -> CompressorConfig {
    CompressorConfig::new(SampleRate::new(SAMPLE_RATE))
        .with_threshold(-20.0)
        .with_ratio(4.0)
        .with_attack(5.0)
        .with_release(50.0)
        .with_knee(3.0)
}

// =============================================================================
// Reference Scenario
// =============================================================================

#[test]
fn sine_scenario_applies_expected_gain_reduction() {
    let compressor = Compressor::new(reference_config()).unwrap();
    let input = AudioBuffer::mono(generate_sine(1000.0, 0.5, 5.0), SampleRate::new(SAMPLE_RATE));

    // 0.5 amplitude sine: RMS = 0.5 / sqrt(2) = -9.03 dB
    assert!((rms_db(&input.samples) - (-9.03)).abs() < 0.05);

    let output = compressor.compress(&input).unwrap();
    let stats = compressor.stats(&input, &output).unwrap();

    assert!((stats.original_rms_db - (-9.03)).abs() < 0.05);
    assert!(stats.compressed_rms_db < stats.original_rms_db);

    // Steady state: 10.97 dB over threshold at 4:1 -> 8.23 dB reduction
    assert!(
        stats.gain_reduction_db < -7.6 && stats.gain_reduction_db > -8.8,
        "gain reduction {:.2} dB",
        stats.gain_reduction_db
    );
}

#[test]
fn sine_scenario_steady_state_range_does_not_grow() {
    let compressor = Compressor::new(reference_config()).unwrap();
    let input = generate_sine(1000.0, 0.5, 5.0);
    let output = compressor.compress_channel(&input);

    // Past the attack phase (100 ms = 20 attack time constants) and before the tail
    let steady = 4410..input.len() - 4410;
    let range_before = peak_db(&input[steady.clone()]) - rms_db(&input[steady.clone()]);
    let range_after = peak_db(&output[steady.clone()]) - rms_db(&output[steady]);

    assert!(
        range_after <= range_before + 0.1,
        "range grew from {:.3} to {:.3} dB",
        range_before,
        range_after
    );
}

// =============================================================================
// Transparency
// =============================================================================

#[test]
fn unity_ratio_is_exact_identity() {
    let config = reference_config().with_ratio(1.0);
    let compressor = Compressor::new(config).unwrap();

    let loud = generate_sine(440.0, 0.99, 0.5);
    let quiet = generate_sine(3000.0, 0.01, 0.5);
    let input = AudioBuffer::from_channels(vec![loud, quiet], SampleRate::new(SAMPLE_RATE)).unwrap();

    let output = compressor.compress(&input).unwrap();
    assert_eq!(output, input);
}

#[test]
fn silence_stays_silent() {
    let compressor = Compressor::new(CompressorConfig::aggressive(SampleRate::new(SAMPLE_RATE))).unwrap();
    let input = AudioBuffer::mono(vec![0.0; SAMPLE_RATE as usize], SampleRate::new(SAMPLE_RATE));

    let output = compressor.compress(&input).unwrap();
    assert!(output.samples.iter().all(|&s| s == 0.0));

    let stats = compressor.stats(&input, &output).unwrap();
    assert_eq!(stats.original_rms_db, SILENCE_DB);
    assert_eq!(stats.compressed_rms_db, SILENCE_DB);
    assert!(stats.original_dynamic_range_db.is_finite());
    assert!(stats.gain_reduction_db.is_finite());
}

#[test]
fn empty_buffer_compresses_to_empty() {
    let compressor = Compressor::new(reference_config()).unwrap();
    let input = AudioBuffer::mono(Vec::new(), SampleRate::new(SAMPLE_RATE));
    let output = compressor.compress(&input).unwrap();
    assert!(output.is_empty());

    let stats = compressor.stats(&input, &output).unwrap();
    assert_eq!(stats.original_peak_db, SILENCE_DB);
}

// =============================================================================
// Timing
// =============================================================================

#[test]
fn held_level_converges_to_static_curve() {
    let compressor = Compressor::new(reference_config()).unwrap();
    let window = compressor.envelope().window();

    // DC at 0.5 reads as -6.02 dB once the window is fully inside the signal
    let input = vec![0.5_f32; SAMPLE_RATE as usize];
    let curve = compressor.gain_reduction(&input);

    let target = compressor.gain_computer().reduction(linear_to_db(0.5));
    assert!(target < -10.0);

    // 5 attack time constants after the envelope settles
    let tau = (f64::from(SAMPLE_RATE) * 5.0 / 1000.0).ceil() as usize;
    let settled = window + 5 * tau;
    for &value in &curve[settled..input.len() - window] {
        assert!(
            (value - target).abs() < 0.1,
            "smoothed {:.4} vs static {:.4}",
            value,
            target
        );
    }
}

#[test]
fn release_is_slower_than_attack() {
    let config = reference_config().with_attack(1.0).with_release(200.0);
    let compressor = Compressor::new(config).unwrap();

    // 0.5 s loud followed by 0.5 s quiet
    let mut input = vec![0.9_f32; SAMPLE_RATE as usize / 2];
    input.extend(vec![0.001_f32; SAMPLE_RATE as usize / 2]);
    let curve = compressor.gain_reduction(&input);

    let window = compressor.envelope().window();
    let onset = window + 441; // 10 ms into the loud part
    let after_drop = SAMPLE_RATE as usize / 2 + window + 441; // 10 ms into the quiet part

    let loud_target = compressor.gain_computer().reduction(linear_to_db(0.9));
    // Attack (1 ms) is essentially complete after 10 ms
    assert!((curve[onset] - loud_target).abs() < 0.05);
    // Release (200 ms) has recovered only a small fraction after 10 ms
    assert!(curve[after_drop] < loud_target * 0.75);
}

// =============================================================================
// Static Curve Through the Full Chain
// =============================================================================

#[test]
fn higher_ratio_compresses_more() {
    let input = AudioBuffer::mono(generate_sine(1000.0, 0.8, 0.5), SampleRate::new(SAMPLE_RATE));

    let mut last_rms = f64::INFINITY;
    for ratio in [1.0, 2.0, 4.0, 8.0, 20.0] {
        let compressor = Compressor::new(reference_config().with_ratio(ratio)).unwrap();
        let output = compressor.compress(&input).unwrap();
        let level = rms_db(&output.samples);
        assert!(level <= last_rms + 1e-9, "ratio {} louder than lower ratio", ratio);
        last_rms = level;
    }
}

#[test]
fn invalid_configuration_aborts_before_processing() {
    let result = Compressor::new(reference_config().with_attack(0.0));
    assert!(matches!(result, Err(DynamicsError::Configuration(_))));
}
