//! Master output — sums every source, then applies the shared gain.

use super::param::AudioParam;

/// The single sink that voices and file playback route through.
#[derive(Debug, Clone)]
pub struct MasterBus {
    pub gain: AudioParam,
    buffer: Vec<f64>,
}

impl MasterBus {
    pub fn new(initial_gain: f64, sample_rate: f64) -> Self {
        MasterBus {
            gain: AudioParam::new(initial_gain, sample_rate),
            buffer: Vec::new(),
        }
    }

    /// Prepare a block of `num_samples` zeros.
    pub fn clear(&mut self, num_samples: usize) {
        self.buffer.clear();
        self.buffer.resize(num_samples, 0.0);
    }

    pub fn add(&mut self, index: usize, sample: f64) {
        if let Some(slot) = self.buffer.get_mut(index) {
            *slot += sample;
        }
    }

    /// Apply master gain and soft clipping, writing into `out`.
    pub fn output(&mut self, out: &mut [f32]) {
        for (dst, &s) in out.iter_mut().zip(self.buffer.iter()) {
            *dst = soft_clip(s * self.gain.next_value()) as f32;
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// Soft clipper using tanh to prevent harsh digital clipping.
fn soft_clip(x: f64) -> f64 {
    x.tanh()
}
