//! Audio context — owns the node graph and the sample clock.
//!
//! Every node lives here: tone voices, the optional file player, and the
//! master bus they all feed. Hosts pull blocks through [`AudioContext::render`];
//! the clock only moves while the context is running.

use std::collections::BTreeMap;

use crate::error::WaitroomError;

use super::mixer::MasterBus;
use super::oscillator::Waveform;
use super::sampler::FilePlayer;
use super::voice::{ToneVoice, VoiceConfig, VoiceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Created but not yet allowed to make sound.
    Suspended,
    Running,
    Closed,
}

pub struct AudioContext {
    sample_rate: f64,
    frame: u64,
    state: ContextState,
    master: MasterBus,
    voices: BTreeMap<VoiceId, ToneVoice>,
    file: Option<FilePlayer>,
    next_voice: u64,
}

impl AudioContext {
    /// Create a suspended context whose master bus starts at `master_gain`.
    pub fn new(sample_rate: f64, master_gain: f64) -> Self {
        AudioContext {
            sample_rate,
            frame: 0,
            state: ContextState::Suspended,
            master: MasterBus::new(master_gain, sample_rate),
            voices: BTreeMap::new(),
            file: None,
            next_voice: 1,
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    /// Seconds of audio rendered while running.
    pub fn current_time(&self) -> f64 {
        self.frame as f64 / self.sample_rate
    }

    pub fn current_frame(&self) -> u64 {
        self.frame
    }

    pub fn resume(&mut self) -> Result<(), WaitroomError> {
        match self.state {
            ContextState::Closed => Err(WaitroomError::ContextClosed),
            _ => {
                self.state = ContextState::Running;
                Ok(())
            }
        }
    }

    pub fn suspend(&mut self) {
        if self.state == ContextState::Running {
            self.state = ContextState::Suspended;
        }
    }

    /// Release every node. A closed context never runs again.
    pub fn close(&mut self) {
        self.voices.clear();
        self.file = None;
        self.state = ContextState::Closed;
    }

    pub fn master(&self) -> &MasterBus {
        &self.master
    }

    pub fn master_mut(&mut self) -> &mut MasterBus {
        &mut self.master
    }

    /// Build a voice, connect it to the master bus and start it.
    pub fn create_voice(
        &mut self,
        frequency: f64,
        waveform: Waveform,
        config: &VoiceConfig,
    ) -> Result<VoiceId, WaitroomError> {
        if self.state == ContextState::Closed {
            return Err(WaitroomError::ContextClosed);
        }
        let id = VoiceId(self.next_voice);
        let voice = ToneVoice::start(id, frequency, waveform, self.sample_rate, config)?;
        self.next_voice += 1;
        self.voices.insert(id, voice);
        Ok(id)
    }

    pub fn voice(&self, id: VoiceId) -> Option<&ToneVoice> {
        self.voices.get(&id)
    }

    pub fn voice_mut(&mut self, id: VoiceId) -> Option<&mut ToneVoice> {
        self.voices.get_mut(&id)
    }

    /// Stop a voice's oscillator. Detached voices report `AlreadyStopped`.
    pub fn stop_voice(&mut self, id: VoiceId) -> Result<(), WaitroomError> {
        match self.voices.get_mut(&id) {
            Some(voice) => voice.stop(),
            None => Err(WaitroomError::AlreadyStopped),
        }
    }

    /// Disconnect a voice from the master bus and drop it.
    pub fn disconnect_voice(&mut self, id: VoiceId) -> Option<ToneVoice> {
        self.voices.remove(&id)
    }

    /// Voices still connected to the master bus, including fading ones.
    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn voice_ids(&self) -> impl Iterator<Item = VoiceId> + '_ {
        self.voices.keys().copied()
    }

    pub fn attach_file(&mut self, player: FilePlayer) {
        self.file = Some(player);
    }

    pub fn detach_file(&mut self) -> Option<FilePlayer> {
        self.file.take()
    }

    pub fn file(&self) -> Option<&FilePlayer> {
        self.file.as_ref()
    }

    /// Render one mono block. Silent, and the clock holds, unless running.
    pub fn render(&mut self, out: &mut [f32]) {
        if self.state != ContextState::Running {
            out.fill(0.0);
            return;
        }

        let n = out.len();
        self.master.clear(n);
        for voice in self.voices.values_mut() {
            for i in 0..n {
                let sample = voice.next_sample();
                self.master.add(i, sample);
            }
        }
        if let Some(file) = self.file.as_mut() {
            for i in 0..n {
                let sample = file.next_sample();
                self.master.add(i, sample);
            }
        }
        self.master.output(out);
        self.frame += n as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::sampler::SampleBuffer;
    use std::sync::Arc;

    #[test]
    fn starts_suspended_and_silent() {
        let mut ctx = AudioContext::new(8000.0, 1.0);
        assert_eq!(ctx.state(), ContextState::Suspended);
        ctx.create_voice(440.0, Waveform::Sine, &VoiceConfig::default())
            .expect("voice");
        let mut out = vec![1.0_f32; 256];
        ctx.render(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(ctx.current_frame(), 0);
    }

    #[test]
    fn running_context_advances_clock() {
        let mut ctx = AudioContext::new(8000.0, 1.0);
        ctx.resume().expect("resume");
        let mut out = vec![0.0_f32; 4000];
        ctx.render(&mut out);
        assert_eq!(ctx.current_frame(), 4000);
        assert!((ctx.current_time() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn voice_ids_are_never_reused() {
        let mut ctx = AudioContext::new(8000.0, 1.0);
        let config = VoiceConfig::default();
        let a = ctx.create_voice(220.0, Waveform::Sine, &config).expect("a");
        ctx.disconnect_voice(a);
        let b = ctx.create_voice(220.0, Waveform::Sine, &config).expect("b");
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn stopping_detached_voice_is_reported() {
        let mut ctx = AudioContext::new(8000.0, 1.0);
        let id = ctx
            .create_voice(220.0, Waveform::Triangle, &VoiceConfig::default())
            .expect("voice");
        assert!(ctx.stop_voice(id).is_ok());
        assert!(matches!(ctx.stop_voice(id), Err(WaitroomError::AlreadyStopped)));
        assert!(ctx.disconnect_voice(id).is_some());
        assert!(matches!(ctx.stop_voice(id), Err(WaitroomError::AlreadyStopped)));
        assert!(ctx.disconnect_voice(id).is_none());
    }

    #[test]
    fn invalid_frequency_does_not_consume_an_id() {
        let mut ctx = AudioContext::new(8000.0, 1.0);
        let config = VoiceConfig::default();
        assert!(ctx.create_voice(-1.0, Waveform::Sine, &config).is_err());
        let id = ctx.create_voice(110.0, Waveform::Sine, &config).expect("voice");
        assert_eq!(id, VoiceId(1));
        assert_eq!(ctx.voice_count(), 1);
    }

    #[test]
    fn file_routes_through_master() {
        let mut ctx = AudioContext::new(100.0, 0.5);
        ctx.resume().expect("resume");
        let buffer = Arc::new(SampleBuffer::new(vec![0.4; 8], 100));
        ctx.attach_file(FilePlayer::start("bed.wav", buffer, 1.0, 100.0));
        let mut out = vec![0.0_f32; 4];
        ctx.render(&mut out);
        let expected = (0.4_f64 * 0.5).tanh() as f32;
        assert!(out.iter().all(|&s| (s - expected).abs() < 1e-6), "{out:?}");
        assert!(ctx.detach_file().is_some());
        assert!(ctx.file().is_none());
    }

    #[test]
    fn closed_context_rejects_resume_and_voices() {
        let mut ctx = AudioContext::new(8000.0, 1.0);
        ctx.close();
        assert!(matches!(ctx.resume(), Err(WaitroomError::ContextClosed)));
        assert!(ctx
            .create_voice(220.0, Waveform::Sine, &VoiceConfig::default())
            .is_err());
    }
}
