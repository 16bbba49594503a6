//! Biquad lowpass filter — matches WebAudio BiquadFilterNode "lowpass" coefficients.

use std::f64::consts::PI;

/// Cutoff movements smaller than this (Hz) do not trigger a coefficient update.
const RETUNE_THRESHOLD: f64 = 0.5;

/// A 2nd-order lowpass IIR filter.
///
/// Direct Form II Transposed; coefficients from the Audio EQ Cookbook
/// (Robert Bristow-Johnson).
#[derive(Debug, Clone)]
pub struct LowpassFilter {
    frequency: f64,
    q: f64,

    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,

    z1: f64,
    z2: f64,

    sample_rate: f64,
}

impl LowpassFilter {
    pub fn new(frequency: f64, sample_rate: f64) -> Self {
        let mut f = LowpassFilter {
            frequency,
            q: std::f64::consts::FRAC_1_SQRT_2,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            z1: 0.0,
            z2: 0.0,
            sample_rate,
        };
        f.update_coefficients();
        f
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Move the cutoff. Clamped below Nyquist; tiny moves are ignored.
    pub fn set_frequency(&mut self, freq: f64) {
        let freq = freq.clamp(10.0, self.sample_rate * 0.49);
        if (freq - self.frequency).abs() < RETUNE_THRESHOLD {
            return;
        }
        self.frequency = freq;
        self.update_coefficients();
    }

    fn update_coefficients(&mut self) {
        let w0 = 2.0 * PI * self.frequency / self.sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * self.q);

        let a0 = 1.0 + alpha;
        let b1 = 1.0 - cos_w0;
        self.b0 = b1 / 2.0 / a0;
        self.b1 = b1 / a0;
        self.b2 = self.b0;
        self.a1 = -2.0 * cos_w0 / a0;
        self.a2 = (1.0 - alpha) / a0;
    }

    pub fn process(&mut self, input: f64) -> f64 {
        let output = self.b0 * input + self.z1;
        self.z1 = self.b1 * input - self.a1 * output + self.z2;
        self.z2 = self.b2 * input - self.a2 * output;
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowpass_passes_dc() {
        let mut f = LowpassFilter::new(1000.0, 44100.0);
        let mut output = 0.0;
        for _ in 0..2000 {
            output = f.process(1.0);
        }
        assert!((output - 1.0).abs() < 0.001, "Lowpass should pass DC, got {output}");
    }

    #[test]
    fn lowpass_attenuates_high_freq() {
        let mut f = LowpassFilter::new(200.0, 44100.0);
        let freq = 10000.0;
        let mut max_out = 0.0_f64;
        for i in 0..4410 {
            let t = i as f64 / 44100.0;
            let out = f.process((2.0 * PI * freq * t).sin());
            if i > 1000 {
                max_out = max_out.max(out.abs());
            }
        }
        assert!(max_out < 0.01, "Lowpass@200Hz should attenuate 10kHz, got {max_out}");
    }

    #[test]
    fn cutoff_is_clamped_below_nyquist() {
        let mut f = LowpassFilter::new(1000.0, 8000.0);
        f.set_frequency(20000.0);
        assert!(f.frequency() < 4000.0);
        for i in 0..1000 {
            let out = f.process(if i % 7 == 0 { 1.0 } else { -0.5 });
            assert!(out.is_finite(), "Filter output not finite at sample {i}");
        }
    }

    #[test]
    fn small_moves_are_ignored() {
        let mut f = LowpassFilter::new(1000.0, 44100.0);
        f.set_frequency(1000.2);
        assert_eq!(f.frequency(), 1000.0);
        f.set_frequency(1010.0);
        assert_eq!(f.frequency(), 1010.0);
    }
}
