//! Looping playback of a decoded music file.
//!
//! The buffer is resampled to the context rate via linear interpolation.

use std::sync::Arc;

use super::param::AudioParam;

/// A mono buffer of decoded audio.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    pub data: Vec<f64>,
    /// Native sample rate of the audio.
    pub sample_rate: u32,
}

impl SampleBuffer {
    pub fn new(data: Vec<f64>, sample_rate: u32) -> Self {
        SampleBuffer { data, sample_rate }
    }

    /// Create from 16-bit signed PCM, averaging interleaved channels to mono.
    pub fn from_i16_interleaved(pcm: &[i16], channels: usize, sample_rate: u32) -> Self {
        let channels = channels.max(1);
        let data = pcm
            .chunks(channels)
            .map(|frame| frame.iter().map(|&s| s as f64 / 32768.0).sum::<f64>() / frame.len() as f64)
            .collect();
        SampleBuffer { data, sample_rate }
    }

    /// Create from f32 samples, averaging interleaved channels to mono.
    pub fn from_f32_interleaved(samples: &[f32], channels: usize, sample_rate: u32) -> Self {
        let channels = channels.max(1);
        let data = samples
            .chunks(channels)
            .map(|frame| frame.iter().map(|&s| s as f64).sum::<f64>() / frame.len() as f64)
            .collect();
        SampleBuffer { data, sample_rate }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Read with linear interpolation, wrapping the last frame onto the first.
    pub fn read_looped(&self, position: f64) -> f64 {
        let len = self.data.len();
        if len == 0 {
            return 0.0;
        }
        let idx = position as usize % len;
        let next = (idx + 1) % len;
        let frac = position.fract();
        self.data[idx] * (1.0 - frac) + self.data[next] * frac
    }
}

/// Handle for a looping file. Only one exists at a time, owned by the context.
#[derive(Debug, Clone)]
pub struct FilePlayer {
    locator: String,
    buffer: Arc<SampleBuffer>,
    position: f64,
    /// Source frames consumed per output frame.
    rate: f64,
    gain: AudioParam,
    paused: bool,
}

impl FilePlayer {
    /// Start looping `buffer` at `volume`.
    pub fn start(locator: &str, buffer: Arc<SampleBuffer>, volume: f64, sample_rate: f64) -> Self {
        let rate = buffer.sample_rate as f64 / sample_rate;
        FilePlayer {
            locator: locator.to_string(),
            buffer,
            position: 0.0,
            rate,
            gain: AudioParam::new(volume, sample_rate),
            paused: false,
        }
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn gain(&self) -> &AudioParam {
        &self.gain
    }

    pub fn gain_mut(&mut self) -> &mut AudioParam {
        &mut self.gain
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn next_sample(&mut self) -> f64 {
        if self.paused {
            return 0.0;
        }
        let sample = self.buffer.read_looped(self.position);
        self.position += self.rate;
        let len = self.buffer.len() as f64;
        if len > 0.0 && self.position >= len {
            self.position -= len;
        }
        sample * self.gain.next_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downmixes_stereo() {
        let buf = SampleBuffer::from_i16_interleaved(&[16384, -16384, 16384, 16384], 2, 8000);
        assert_eq!(buf.len(), 2);
        assert!(buf.data[0].abs() < 1e-12);
        assert!((buf.data[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn loops_past_the_end() {
        let buf = Arc::new(SampleBuffer::new(vec![0.1, 0.2, 0.3, 0.4], 100));
        let mut player = FilePlayer::start("loop.wav", buf, 1.0, 100.0);
        let out: Vec<f64> = (0..10).map(|_| player.next_sample()).collect();
        let expected = [0.1, 0.2, 0.3, 0.4, 0.1, 0.2, 0.3, 0.4, 0.1, 0.2];
        for (got, want) in out.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12, "got {got}, want {want}");
        }
    }

    #[test]
    fn resamples_to_context_rate() {
        let buf = Arc::new(SampleBuffer::new(vec![0.0, 1.0], 100));
        let mut player = FilePlayer::start("half.wav", buf, 1.0, 200.0);
        let a = player.next_sample();
        let b = player.next_sample();
        assert!(a.abs() < 1e-12);
        assert!((b - 0.5).abs() < 1e-12, "interpolated sample should be 0.5, got {b}");
    }

    #[test]
    fn paused_player_is_silent() {
        let buf = Arc::new(SampleBuffer::new(vec![0.5; 16], 100));
        let mut player = FilePlayer::start("hold.wav", buf, 1.0, 100.0);
        assert!(player.next_sample() > 0.0);
        player.pause();
        assert!(player.is_paused());
        assert_eq!(player.next_sample(), 0.0);
    }

    #[test]
    fn volume_scales_output() {
        let buf = Arc::new(SampleBuffer::new(vec![0.5; 16], 100));
        let mut player = FilePlayer::start("quiet.wav", buf, 0.0, 100.0);
        assert_eq!(player.next_sample(), 0.0);
        player.gain_mut().set_value(0.5);
        assert!((player.next_sample() - 0.25).abs() < 1e-12);
    }
}
