//! Ambient mood player.
//!
//! Owns the audio context, the master bus and every node routed into it.
//! Exactly one mood is active at a time: a chord of drifting tone voices, a
//! looping music file, or silence. Every audible transition (voice start,
//! mood change, mute, volume, stop) is a ramp, never a step.
//!
//! The host drives time by pulling audio through [`MoodPlayer::render`];
//! deferred teardowns and drift updates fire on that clock.

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dsp::context::{AudioContext, ContextState};
use crate::dsp::decode;
use crate::dsp::sampler::{FilePlayer, SampleBuffer};
use crate::dsp::voice::{VoiceConfig, VoiceId, perturb};
use crate::error::WaitroomError;
use crate::mood::Mood;
use crate::scheduler::{Scheduler, Task, TaskHandle};
use crate::settings::Settings;

/// Timing and level constants for the player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerConfig {
    pub sample_rate: f64,
    /// Initial master volume [0, 1].
    pub volume: f64,
    pub voice: VoiceConfig,
    /// Seconds for a stopped voice to fade to silence.
    pub fade_out: f64,
    /// Seconds after a stop before the faded voice is torn down.
    pub teardown_delay: f64,
    pub mute_time_constant: f64,
    pub volume_time_constant: f64,
    /// Time constant of the fade-in when a music file starts.
    pub file_fade_in: f64,
    /// Mean seconds between drift updates of a voice.
    pub drift_interval: f64,
    /// Upper bound on frames rendered between scheduler checks.
    pub block_size: usize,
    /// Fixed RNG seed for reproducible drift; entropy when `None`.
    pub seed: Option<u64>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            volume: 0.15,
            voice: VoiceConfig::default(),
            fade_out: 0.5,
            teardown_delay: 0.6,
            mute_time_constant: 0.2,
            volume_time_constant: 0.1,
            file_fade_in: 0.1,
            drift_interval: 4.0,
            block_size: 128,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// No audio context exists yet (or it was shut down).
    Uninitialized,
    Idle,
    PlayingPreset(Mood),
    PlayingFile,
}

#[derive(Debug, Clone, Copy)]
struct LiveVoice {
    id: VoiceId,
    drift: TaskHandle,
}

pub struct MoodPlayer {
    config: PlayerConfig,
    context: Option<AudioContext>,
    scheduler: Scheduler,
    rng: StdRng,
    current: Mood,
    volume: f64,
    muted: bool,
    voices: Vec<LiveVoice>,
    decoded: Option<(String, Arc<SampleBuffer>)>,
    scratch: Vec<f32>,
}

fn frames(seconds: f64, sample_rate: f64) -> u64 {
    (seconds.max(0.0) * sample_rate).round() as u64
}

impl MoodPlayer {
    pub fn new(config: PlayerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        MoodPlayer {
            volume: config.volume.clamp(0.0, 1.0),
            config,
            context: None,
            scheduler: Scheduler::new(),
            rng,
            current: Mood::Silence,
            muted: false,
            voices: Vec::new(),
            decoded: None,
            scratch: Vec::new(),
        }
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn state(&self) -> PlayerState {
        if self.context.is_none() {
            return PlayerState::Uninitialized;
        }
        match self.current {
            Mood::Silence => PlayerState::Idle,
            Mood::CustomFile => PlayerState::PlayingFile,
            mood => PlayerState::PlayingPreset(mood),
        }
    }

    pub fn current_mood(&self) -> Mood {
        self.current
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Configured volume, independent of mute.
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Volume actually applied to the master bus.
    pub fn effective_volume(&self) -> f64 {
        if self.muted { 0.0 } else { self.volume }
    }

    /// Voices belonging to the active mood.
    pub fn active_voice_count(&self) -> usize {
        self.voices.len()
    }

    /// Voices still connected to the master bus, including ones fading out.
    pub fn live_voice_count(&self) -> usize {
        self.context.as_ref().map_or(0, |ctx| ctx.voice_count())
    }

    pub fn has_file(&self) -> bool {
        self.context.as_ref().is_some_and(|ctx| ctx.file().is_some())
    }

    /// The value the master gain is heading toward, once initialized.
    pub fn master_gain_target(&self) -> Option<f64> {
        self.context.as_ref().map(|ctx| ctx.master().gain.target())
    }

    pub fn master_gain(&self) -> Option<f64> {
        self.context.as_ref().map(|ctx| ctx.master().gain.value())
    }

    pub fn context_state(&self) -> Option<ContextState> {
        self.context.as_ref().map(|ctx| ctx.state())
    }

    pub fn context(&self) -> Option<&AudioContext> {
        self.context.as_ref()
    }

    pub fn current_time(&self) -> f64 {
        self.context.as_ref().map_or(0.0, |ctx| ctx.current_time())
    }

    pub fn pending_tasks(&self) -> usize {
        self.scheduler.len()
    }

    /// Play a mood given by identifier; unknown identifiers are silence.
    pub fn play_id(&mut self, mood: &str, file: Option<&str>) {
        self.play(Mood::from_id(mood), file);
    }

    /// Switch to `mood`. Re-requesting the active preset mood does nothing;
    /// a custom file always restarts.
    pub fn play(&mut self, mood: Mood, file: Option<&str>) {
        if self.context.is_some() && mood == self.current && mood != Mood::CustomFile {
            return;
        }

        self.stop();

        let effective = self.effective_volume();
        let sample_rate = self.config.sample_rate;
        if self
            .context
            .as_ref()
            .map_or(true, |ctx| ctx.state() == ContextState::Closed)
        {
            debug!(sample_rate, "creating audio context");
            self.context = Some(AudioContext::new(sample_rate, effective));
        }
        let Some(ctx) = self.context.as_mut() else {
            return;
        };

        if ctx.state() == ContextState::Suspended {
            if let Err(e) = ctx.resume() {
                warn!(error = %e, "audio context could not resume");
                return;
            }
        }

        match mood {
            Mood::Silence => {}
            Mood::CustomFile => match file.filter(|f| !f.is_empty()) {
                Some(locator) => self.start_file(locator),
                None => debug!("custom music requested without a file"),
            },
            preset => self.start_preset(preset),
        }
        debug!(mood = %self.current, "mood changed");
    }

    fn start_preset(&mut self, mood: Mood) {
        let Some(chord) = mood.chord() else {
            return;
        };
        let Some(ctx) = self.context.as_mut() else {
            return;
        };

        let now = ctx.current_frame();
        let sample_rate = ctx.sample_rate();
        for &frequency in chord.frequencies {
            match ctx.create_voice(frequency, chord.waveform, &self.config.voice) {
                Ok(id) => {
                    // Jittered periods keep the voices from drifting in lockstep.
                    let every = frames(perturb(self.config.drift_interval, 0.25, &mut self.rng), sample_rate);
                    let drift = self.scheduler.repeat(now + every, every, Task::Drift(id));
                    self.voices.push(LiveVoice { id, drift });
                }
                Err(e) => warn!(frequency, error = %e, "voice could not start"),
            }
        }
        self.current = mood;
    }

    fn start_file(&mut self, locator: &str) {
        let cached = self
            .decoded
            .as_ref()
            .filter(|(cached, _)| cached == locator)
            .map(|(_, buffer)| Arc::clone(buffer));
        let buffer = match cached {
            Some(buffer) => buffer,
            None => match decode::load(locator) {
                Ok(buffer) => {
                    let buffer = Arc::new(buffer);
                    self.decoded = Some((locator.to_string(), Arc::clone(&buffer)));
                    buffer
                }
                Err(e) => {
                    warn!(locator, error = %e, "custom music could not start");
                    return;
                }
            },
        };

        let Some(ctx) = self.context.as_mut() else {
            return;
        };
        let mut player = FilePlayer::start(locator, buffer, 0.0, ctx.sample_rate());
        player.gain_mut().set_target(1.0, self.config.file_fade_in);
        ctx.attach_file(player);
        self.current = Mood::CustomFile;
    }

    /// Decode an in-memory music file and keep it for a later
    /// `play(CustomFile, Some(locator))`. Hosts without filesystem access
    /// (browsers, `blob:` URLs) hand the bytes over this way.
    pub fn load_file(&mut self, locator: &str, bytes: &[u8]) -> Result<(), WaitroomError> {
        let buffer = decode::from_bytes(locator, bytes)?;
        debug!(locator, frames = buffer.len(), "custom music decoded");
        self.decoded = Some((locator.to_string(), Arc::new(buffer)));
        Ok(())
    }

    /// Fade out and schedule teardown of whatever is playing.
    pub fn stop(&mut self) {
        if let Some(ctx) = self.context.as_mut() {
            if let Some(mut file) = ctx.detach_file() {
                file.pause();
                debug!(locator = file.locator(), "custom music stopped");
            }

            let teardown_at = ctx.current_frame() + frames(self.config.teardown_delay, ctx.sample_rate());
            for voice in self.voices.drain(..) {
                self.scheduler.cancel(voice.drift);
                if let Some(node) = ctx.voice_mut(voice.id) {
                    node.fade_out(self.config.fade_out);
                }
                self.scheduler.defer(teardown_at, Task::Teardown(voice.id));
            }
        }
        self.voices.clear();
        self.current = Mood::Silence;
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        let target = self.effective_volume();
        if let Some(ctx) = self.context.as_mut() {
            ctx.master_mut()
                .gain
                .set_target(target, self.config.mute_time_constant);
        }
    }

    pub fn set_volume(&mut self, volume: f64) {
        self.volume = if volume.is_finite() { volume.clamp(0.0, 1.0) } else { 0.0 };
        if self.muted {
            return;
        }
        if let Some(ctx) = self.context.as_mut() {
            ctx.master_mut()
                .gain
                .set_target(self.volume, self.config.volume_time_constant);
        }
    }

    /// Follow the settings record: play its mood, or stop when it has none.
    pub fn apply_settings(&mut self, settings: &Settings) {
        match settings.mood() {
            Mood::Silence => self.stop(),
            mood => self.play(mood, settings.custom_music()),
        }
    }

    /// Pause the audio clock (the host went to the background). Nothing
    /// sounds or fires until `resume` or a mood change.
    pub fn suspend(&mut self) {
        if let Some(ctx) = self.context.as_mut() {
            ctx.suspend();
            debug!("audio context suspended");
        }
    }

    pub fn resume(&mut self) {
        if let Some(ctx) = self.context.as_mut() {
            if let Err(e) = ctx.resume() {
                warn!(error = %e, "audio context could not resume");
            }
        }
    }

    /// Drop every node and close the context. A later `play` starts over.
    pub fn shutdown(&mut self) {
        self.scheduler.cancel_all();
        self.voices.clear();
        if let Some(mut ctx) = self.context.take() {
            ctx.close();
            debug!("audio context closed");
        }
        self.current = Mood::Silence;
    }

    fn run_due(&mut self) {
        let Some(ctx) = self.context.as_mut() else {
            return;
        };
        for task in self.scheduler.due(ctx.current_frame()) {
            match task {
                Task::Teardown(id) => {
                    if let Err(e) = ctx.stop_voice(id) {
                        debug!(voice = id.0, error = %e, "teardown of detached voice");
                    }
                    ctx.disconnect_voice(id);
                }
                Task::Drift(id) => {
                    if let Some(voice) = ctx.voice_mut(id) {
                        voice.drift(&mut self.rng);
                    }
                }
            }
        }
    }

    /// Render mono audio into `out`, firing scheduled tasks on the way.
    pub fn render(&mut self, out: &mut [f32]) {
        if self.context.is_none() {
            out.fill(0.0);
            return;
        }

        let block_size = self.config.block_size.max(1);
        let mut offset = 0;
        while offset < out.len() {
            self.run_due();
            let Some(ctx) = self.context.as_mut() else {
                out[offset..].fill(0.0);
                return;
            };

            let mut len = (out.len() - offset).min(block_size);
            if ctx.state() == ContextState::Running {
                let now = ctx.current_frame();
                if let Some(due) = self.scheduler.next_due().filter(|&due| due > now) {
                    len = len.min((due - now) as usize);
                }
            }
            ctx.render(&mut out[offset..offset + len]);
            offset += len;
        }
        self.run_due();
    }

    /// Render and duplicate the mono signal across `channels` interleaved channels.
    pub fn render_interleaved(&mut self, out: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let mut mono = std::mem::take(&mut self.scratch);
        mono.clear();
        mono.resize(out.len() / channels, 0.0);
        self.render(&mut mono);
        out.fill(0.0);
        for (frame, &sample) in out.chunks_mut(channels).zip(mono.iter()) {
            frame.fill(sample);
        }
        self.scratch = mono;
    }

    /// Move the clock forward by `frames`, discarding the audio.
    pub fn advance(&mut self, frames: usize) {
        let mut scratch = std::mem::take(&mut self.scratch);
        let mut remaining = frames;
        while remaining > 0 {
            let len = remaining.min(4096);
            scratch.clear();
            scratch.resize(len, 0.0);
            self.render(&mut scratch);
            remaining -= len;
        }
        self.scratch = scratch;
    }

    /// Frequencies of the active mood's voices, in chord order.
    pub fn active_frequencies(&self) -> Vec<f64> {
        let Some(ctx) = self.context.as_ref() else {
            return Vec::new();
        };
        self.voices
            .iter()
            .filter_map(|v| ctx.voice(v.id).map(|node| node.frequency()))
            .collect()
    }

    /// Ids of the active mood's voices, in chord order.
    pub fn active_voice_ids(&self) -> Vec<VoiceId> {
        self.voices.iter().map(|v| v.id).collect()
    }
}

impl Default for MoodPlayer {
    fn default() -> Self {
        Self::new(PlayerConfig::default())
    }
}
