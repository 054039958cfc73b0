//! K-weighting pre-filter (ITU-R BS.1770)
//!
//! Two second-order sections designed from the sample rate:
//! a +4 dB high shelf modelling the acoustic effect of the head, followed by the
//! RLB high-pass. Coefficients use the bilinear-transform designs from the RBJ cookbook
//! (shelf: G = +4 dB, Q = 1/sqrt(2), fc = 1500 Hz; high-pass: Q = 0.5, fc = 38 Hz).

use std::f64::consts::PI;

const SHELF_GAIN_DB: f64 = 4.0;
const SHELF_Q: f64 = std::f64::consts::FRAC_1_SQRT_2;
const SHELF_FREQUENCY: f64 = 1500.0;

const HIGH_PASS_Q: f64 = 0.5;
const HIGH_PASS_FREQUENCY: f64 = 38.0;

/// Second-order IIR section, coefficients normalized by `a0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl Biquad {
    fn normalized(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// High shelf boost
    pub fn high_shelf(sample_rate: f64, frequency: f64, q: f64, gain_db: f64) -> Self {
        let a = 10.0_f64.powf(gain_db / 40.0);
        let omega = 2.0 * PI * frequency / sample_rate;
        let cos_omega = omega.cos();
        let alpha = omega.sin() / (2.0 * q);
        let beta = 2.0 * a.sqrt() * alpha;

        Self::normalized(
            a * ((a + 1.0) + (a - 1.0) * cos_omega + beta),
            -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_omega),
            a * ((a + 1.0) + (a - 1.0) * cos_omega - beta),
            (a + 1.0) - (a - 1.0) * cos_omega + beta,
            2.0 * ((a - 1.0) - (a + 1.0) * cos_omega),
            (a + 1.0) - (a - 1.0) * cos_omega - beta,
        )
    }

    /// Second-order high-pass
    pub fn high_pass(sample_rate: f64, frequency: f64, q: f64) -> Self {
        let omega = 2.0 * PI * frequency / sample_rate;
        let cos_omega = omega.cos();
        let alpha = omega.sin() / (2.0 * q);

        Self::normalized(
            (1.0 + cos_omega) / 2.0,
            -(1.0 + cos_omega),
            (1.0 + cos_omega) / 2.0,
            1.0 + alpha,
            -2.0 * cos_omega,
            1.0 - alpha,
        )
    }

    /// Filter a whole sequence from zero initial state (direct form II transposed)
    pub fn filter(&self, input: &[f64]) -> Vec<f64> {
        let mut z1 = 0.0;
        let mut z2 = 0.0;

        input
            .iter()
            .map(|&x| {
                let y = self.b0 * x + z1;
                z1 = self.b1 * x - self.a1 * y + z2;
                z2 = self.b2 * x - self.a2 * y;
                y
            })
            .collect()
    }

    /// Magnitude response in dB at `frequency`
    pub fn magnitude_db(&self, sample_rate: f64, frequency: f64) -> f64 {
        let w = 2.0 * PI * frequency / sample_rate;
        let (c1, s1) = (w.cos(), w.sin());
        let (c2, s2) = ((2.0 * w).cos(), (2.0 * w).sin());

        let num_re = self.b0 + self.b1 * c1 + self.b2 * c2;
        let num_im = -(self.b1 * s1 + self.b2 * s2);
        let den_re = 1.0 + self.a1 * c1 + self.a2 * c2;
        let den_im = -(self.a1 * s1 + self.a2 * s2);

        let num = num_re * num_re + num_im * num_im;
        let den = den_re * den_re + den_im * den_im;
        10.0 * (num / den).log10()
    }
}

/// Shelf + high-pass cascade
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KWeighting {
    shelf: Biquad,
    high_pass: Biquad,
}

impl KWeighting {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            shelf: Biquad::high_shelf(sample_rate, SHELF_FREQUENCY, SHELF_Q, SHELF_GAIN_DB),
            high_pass: Biquad::high_pass(sample_rate, HIGH_PASS_FREQUENCY, HIGH_PASS_Q),
        }
    }

    pub fn shelf(&self) -> &Biquad {
        &self.shelf
    }

    pub fn high_pass(&self) -> &Biquad {
        &self.high_pass
    }

    /// K-weight one channel
    pub fn apply(&self, samples: &[f32]) -> Vec<f64> {
        let input: Vec<f64> = samples.iter().map(|&s| f64::from(s)).collect();
        self.high_pass.filter(&self.shelf.filter(&input))
    }

    /// Combined magnitude response in dB
    pub fn magnitude_db(&self, sample_rate: f64, frequency: f64) -> f64 {
        self.shelf.magnitude_db(sample_rate, frequency)
            + self.high_pass.magnitude_db(sample_rate, frequency)
    }
}
