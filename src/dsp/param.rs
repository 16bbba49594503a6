//! Automatable control values (gain, cutoff).
//!
//! Mirrors the subset of WebAudio `AudioParam` automation the ambient player
//! needs: an immediate set, an exponential approach toward a target with a
//! time constant (`setTargetAtTime`), and a linear ramp that lands exactly on
//! its target (`linearRampToValueAtTime`). Every automation starts "now" and
//! replaces whatever was in flight, so transitions never jump.

/// Distance below which an exponential approach snaps onto its target.
const SETTLE_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Ramp {
    Hold,
    Target { target: f64, coef: f64 },
    Linear { target: f64, step: f64, remaining: u64 },
}

#[derive(Debug, Clone)]
pub struct AudioParam {
    value: f64,
    ramp: Ramp,
    sample_rate: f64,
}

impl AudioParam {
    pub fn new(value: f64, sample_rate: f64) -> Self {
        AudioParam {
            value,
            ramp: Ramp::Hold,
            sample_rate,
        }
    }

    /// Current value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// The value the param is heading toward (its current value when idle).
    pub fn target(&self) -> f64 {
        match self.ramp {
            Ramp::Hold => self.value,
            Ramp::Target { target, .. } | Ramp::Linear { target, .. } => target,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.ramp == Ramp::Hold
    }

    /// Jump to `value` immediately, cancelling any automation.
    pub fn set_value(&mut self, value: f64) {
        self.value = value;
        self.ramp = Ramp::Hold;
    }

    /// Approach `target` exponentially; after `time_constant` seconds the
    /// remaining distance has shrunk to 1/e.
    pub fn set_target(&mut self, target: f64, time_constant: f64) {
        if time_constant <= 0.0 {
            self.set_value(target);
            return;
        }
        let coef = (-1.0 / (time_constant * self.sample_rate)).exp();
        self.ramp = Ramp::Target { target, coef };
    }

    /// Move linearly to `target`, arriving after `duration` seconds.
    pub fn linear_ramp(&mut self, target: f64, duration: f64) {
        let remaining = (duration * self.sample_rate).round() as u64;
        if remaining == 0 {
            self.set_value(target);
            return;
        }
        let step = (target - self.value) / remaining as f64;
        self.ramp = Ramp::Linear {
            target,
            step,
            remaining,
        };
    }

    /// Advance one sample and return the new value.
    pub fn next_value(&mut self) -> f64 {
        match self.ramp {
            Ramp::Hold => {}
            Ramp::Target { target, coef } => {
                self.value = target + (self.value - target) * coef;
                if (self.value - target).abs() < SETTLE_EPSILON {
                    self.set_value(target);
                }
            }
            Ramp::Linear {
                target,
                step,
                remaining,
            } => {
                if remaining <= 1 {
                    self.set_value(target);
                } else {
                    self.value += step;
                    self.ramp = Ramp::Linear {
                        target,
                        step,
                        remaining: remaining - 1,
                    };
                }
            }
        }
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_target_reaches_one_time_constant() {
        let mut p = AudioParam::new(0.0, 1000.0);
        p.set_target(1.0, 0.5);
        for _ in 0..500 {
            p.next_value();
        }
        let expected = 1.0 - (-1.0_f64).exp();
        assert!((p.value() - expected).abs() < 1e-3, "got {}", p.value());
        assert_eq!(p.target(), 1.0);
    }

    #[test]
    fn set_target_never_jumps() {
        let mut p = AudioParam::new(0.8, 44100.0);
        p.set_target(0.0, 0.2);
        let mut prev = p.value();
        for _ in 0..44100 {
            let v = p.next_value();
            assert!((prev - v).abs() < 0.001, "step too large: {prev} -> {v}");
            prev = v;
        }
    }

    #[test]
    fn linear_ramp_lands_exactly() {
        let mut p = AudioParam::new(0.2, 1000.0);
        p.linear_ramp(0.0, 0.5);
        for _ in 0..499 {
            p.next_value();
        }
        assert!(p.value() > 0.0);
        p.next_value();
        assert_eq!(p.value(), 0.0);
        assert!(p.is_settled());
    }

    #[test]
    fn zero_time_constant_sets_immediately() {
        let mut p = AudioParam::new(0.5, 44100.0);
        p.set_target(0.1, 0.0);
        assert_eq!(p.value(), 0.1);
        p.linear_ramp(0.3, 0.0);
        assert_eq!(p.value(), 0.3);
    }
}
