//! Tone voice — one sustained oscillator → lowpass → gain chain.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::WaitroomError;

use super::filter::LowpassFilter;
use super::oscillator::{Oscillator, Waveform};
use super::param::AudioParam;

/// Generation number of a voice. Never reused within a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(pub u64);

/// Shape of every voice a mood starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VoiceConfig {
    /// Sustained per-voice gain.
    pub level: f64,
    /// Initial lowpass cutoff in Hz.
    pub cutoff: f64,
    /// Time constant (seconds) of the fade-in from silence.
    pub attack_time_constant: f64,
    /// Relative gain wander, e.g. 0.25 = ±25 %.
    pub drift_gain_depth: f64,
    /// Relative cutoff wander.
    pub drift_cutoff_depth: f64,
    /// Time constant (seconds) used when gliding to a new drift point.
    pub drift_time_constant: f64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            level: 0.2,
            cutoff: 1000.0,
            attack_time_constant: 2.0,
            drift_gain_depth: 0.25,
            drift_cutoff_depth: 0.3,
            drift_time_constant: 2.0,
        }
    }
}

/// One running tone.
#[derive(Debug, Clone)]
pub struct ToneVoice {
    id: VoiceId,
    oscillator: Oscillator,
    filter: LowpassFilter,
    gain: AudioParam,
    cutoff: AudioParam,
    base_level: f64,
    base_cutoff: f64,
    config: VoiceConfig,
    stopped: bool,
}

impl ToneVoice {
    /// Build a voice and start it. The gain begins at 0 and glides toward
    /// `config.level`.
    pub fn start(
        id: VoiceId,
        frequency: f64,
        waveform: Waveform,
        sample_rate: f64,
        config: &VoiceConfig,
    ) -> Result<Self, WaitroomError> {
        if !frequency.is_finite() || frequency <= 0.0 {
            return Err(WaitroomError::InvalidFrequency(frequency));
        }

        let mut gain = AudioParam::new(0.0, sample_rate);
        gain.set_target(config.level, config.attack_time_constant);

        Ok(ToneVoice {
            id,
            oscillator: Oscillator::new(waveform, frequency, sample_rate),
            filter: LowpassFilter::new(config.cutoff, sample_rate),
            gain,
            cutoff: AudioParam::new(config.cutoff, sample_rate),
            base_level: config.level,
            base_cutoff: config.cutoff,
            config: *config,
            stopped: false,
        })
    }

    pub fn id(&self) -> VoiceId {
        self.id
    }

    pub fn frequency(&self) -> f64 {
        self.oscillator.frequency()
    }

    pub fn gain(&self) -> &AudioParam {
        &self.gain
    }

    pub fn cutoff(&self) -> &AudioParam {
        &self.cutoff
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Stop the oscillator. A second stop reports `AlreadyStopped`.
    pub fn stop(&mut self) -> Result<(), WaitroomError> {
        if self.stopped {
            return Err(WaitroomError::AlreadyStopped);
        }
        self.stopped = true;
        Ok(())
    }

    /// Ramp the gain to silence over `duration` seconds.
    pub fn fade_out(&mut self, duration: f64) {
        self.gain.linear_ramp(0.0, duration);
    }

    /// Glide gain and cutoff to a fresh random point around their bases.
    pub fn drift<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let level = perturb(self.base_level, self.config.drift_gain_depth, rng);
        let cutoff = perturb(self.base_cutoff, self.config.drift_cutoff_depth, rng);
        self.gain.set_target(level, self.config.drift_time_constant);
        self.cutoff.set_target(cutoff, self.config.drift_time_constant);
    }

    pub fn next_sample(&mut self) -> f64 {
        if self.stopped {
            return 0.0;
        }
        self.filter.set_frequency(self.cutoff.next_value());
        let filtered = self.filter.process(self.oscillator.next_sample());
        filtered * self.gain.next_value()
    }
}

/// `base` scaled by a uniform factor in [1 - depth, 1 + depth].
pub fn perturb<R: Rng + ?Sized>(base: f64, depth: f64, rng: &mut R) -> f64 {
    let depth = depth.abs().min(1.0);
    base * (1.0 + rng.gen_range(-depth..=depth))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn voice(frequency: f64) -> ToneVoice {
        ToneVoice::start(VoiceId(1), frequency, Waveform::Sine, 44100.0, &VoiceConfig::default())
            .expect("valid frequency")
    }

    #[test]
    fn rejects_non_positive_frequency() {
        let config = VoiceConfig::default();
        for hz in [0.0, -220.0, f64::NAN, f64::INFINITY] {
            let result = ToneVoice::start(VoiceId(1), hz, Waveform::Sine, 44100.0, &config);
            assert!(matches!(result, Err(WaitroomError::InvalidFrequency(_))), "{hz} accepted");
        }
    }

    #[test]
    fn starts_silent_and_fades_in() {
        let mut v = voice(220.0);
        assert_eq!(v.gain().value(), 0.0);
        assert_eq!(v.gain().target(), 0.2);

        let first = v.next_sample();
        assert!(first.abs() < 1e-4, "first sample should be near silent, got {first}");

        let mut peak = 0.0_f64;
        for _ in 0..(44100 * 4) {
            peak = peak.max(v.next_sample().abs());
        }
        assert!(peak > 0.1, "voice should be audible after fade-in, peak {peak}");
        assert!(peak <= 0.25, "voice should stay near its level, peak {peak}");
    }

    #[test]
    fn double_stop_is_reported() {
        let mut v = voice(330.0);
        assert!(v.stop().is_ok());
        assert!(matches!(v.stop(), Err(WaitroomError::AlreadyStopped)));
        assert_eq!(v.next_sample(), 0.0);
    }

    #[test]
    fn fade_out_reaches_zero() {
        let mut v = voice(440.0);
        for _ in 0..44100 {
            v.next_sample();
        }
        v.fade_out(0.5);
        for _ in 0..22050 {
            v.next_sample();
        }
        assert_eq!(v.gain().value(), 0.0);
    }

    #[test]
    fn drift_stays_within_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut v = voice(261.63);
        for _ in 0..200 {
            v.drift(&mut rng);
            let level = v.gain().target();
            let cutoff = v.cutoff().target();
            assert!((0.15..=0.25).contains(&level), "gain drift out of bounds: {level}");
            assert!((700.0..=1300.0).contains(&cutoff), "cutoff drift out of bounds: {cutoff}");
        }
    }

    #[test]
    fn perturb_with_zero_depth_is_identity() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(perturb(0.2, 0.0, &mut rng), 0.2);
    }
}
