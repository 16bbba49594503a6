//! Anti-aliased oscillators using PolyBLEP.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Supported waveform shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Triangle,
    Square,
    Sawtooth,
}

/// A free-running band-limited oscillator.
#[derive(Debug, Clone)]
pub struct Oscillator {
    pub waveform: Waveform,
    frequency: f64,
    phase: f64,
    inc: f64,
    sample_rate: f64,
}

impl Oscillator {
    pub fn new(waveform: Waveform, frequency: f64, sample_rate: f64) -> Self {
        Oscillator {
            waveform,
            frequency,
            phase: 0.0,
            inc: frequency / sample_rate,
            sample_rate,
        }
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn set_frequency(&mut self, frequency: f64) {
        self.frequency = frequency;
        self.inc = frequency / self.sample_rate;
    }

    /// Generate the next sample in [-1, 1].
    pub fn next_sample(&mut self) -> f64 {
        let sample = match self.waveform {
            Waveform::Sine => (2.0 * PI * self.phase).sin(),
            Waveform::Triangle => {
                if self.phase < 0.5 {
                    4.0 * self.phase - 1.0
                } else {
                    3.0 - 4.0 * self.phase
                }
            }
            Waveform::Square => {
                let mut value = if self.phase < 0.5 { 1.0 } else { -1.0 };
                value += poly_blep(self.phase, self.inc);
                value -= poly_blep((self.phase + 0.5) % 1.0, self.inc);
                value
            }
            Waveform::Sawtooth => 2.0 * self.phase - 1.0 - poly_blep(self.phase, self.inc),
        };

        self.phase += self.inc;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        sample
    }
}

/// PolyBLEP correction for a discontinuity at phase 0.
///
/// `t` is the phase [0, 1), `dt` is the phase increment per sample.
fn poly_blep(t: f64, dt: f64) -> f64 {
    if t < dt {
        let t = t / dt;
        2.0 * t - t * t - 1.0
    } else if t > 1.0 - dt {
        let t = (t - 1.0) / dt;
        t * t + 2.0 * t + 1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_zero_at_start() {
        let mut osc = Oscillator::new(Waveform::Sine, 440.0, 44100.0);
        let sample = osc.next_sample();
        assert!(sample.abs() < 1e-10, "Sine should start near 0, got {sample}");
    }

    #[test]
    fn sine_and_triangle_stay_in_range() {
        for waveform in [Waveform::Sine, Waveform::Triangle] {
            let mut osc = Oscillator::new(waveform, 261.63, 44100.0);
            for _ in 0..44100 {
                let s = osc.next_sample();
                assert!((-1.0..=1.0).contains(&s), "{waveform:?} out of range: {s}");
            }
        }
    }

    #[test]
    fn blep_shapes_stay_bounded() {
        for waveform in [Waveform::Square, Waveform::Sawtooth] {
            let mut osc = Oscillator::new(waveform, 440.0, 44100.0);
            for _ in 0..44100 {
                let s = osc.next_sample();
                assert!(s.abs() <= 1.5, "{waveform:?} out of range: {s}");
            }
        }
    }

    #[test]
    fn set_frequency_changes_period() {
        let mut osc = Oscillator::new(Waveform::Sawtooth, 100.0, 1000.0);
        osc.set_frequency(250.0);
        assert_eq!(osc.frequency(), 250.0);
        assert!((osc.inc - 0.25).abs() < 1e-12);
    }
}
