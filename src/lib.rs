pub mod countdown;
pub mod dsp;
pub mod error;
pub mod mood;
pub mod player;
pub mod scheduler;
pub mod settings;

pub use crate::countdown::Breakdown;
pub use crate::error::WaitroomError;
pub use crate::mood::Mood;
pub use crate::player::{MoodPlayer, PlayerConfig, PlayerState};
pub use crate::settings::Settings;

use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the waitroom-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed: days/hours/minutes/seconds left until `target_ms`.
#[wasm_bindgen]
pub fn countdown_breakdown(target_ms: f64, now_ms: f64) -> Result<JsValue, JsValue> {
    let breakdown = Breakdown::until(target_ms as i64, now_ms as i64);
    serde_wasm_bindgen::to_value(&breakdown).map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: parse a `datetime-local` start time into epoch milliseconds.
#[wasm_bindgen]
pub fn start_time_ms(text: &str, utc_offset_minutes: i32) -> Result<f64, JsValue> {
    countdown::parse_start_time(text, utc_offset_minutes)
        .map(|ms| ms as f64)
        .map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: render a preview of a mood to mono f32 samples.
#[wasm_bindgen]
pub fn render_mood_samples(mood: &str, seconds: f64, sample_rate: u32) -> Vec<f32> {
    dsp::renderer::render_mood(Mood::from_id(mood), seconds, sample_rate)
}

/// WASM-exposed: render a preview of a mood to a WAV byte array.
#[wasm_bindgen]
pub fn render_mood_wav(mood: &str, seconds: f64, sample_rate: u32) -> Vec<u8> {
    dsp::renderer::render_mood_wav(Mood::from_id(mood), seconds, sample_rate)
}

/// WASM-exposed mood player, driven from an AudioWorklet's `process()`.
#[wasm_bindgen]
pub struct WasmMoodPlayer {
    inner: MoodPlayer,
}

#[wasm_bindgen]
impl WasmMoodPlayer {
    #[wasm_bindgen(constructor)]
    pub fn new(sample_rate: f64) -> WasmMoodPlayer {
        WasmMoodPlayer {
            inner: MoodPlayer::new(PlayerConfig {
                sample_rate,
                ..PlayerConfig::default()
            }),
        }
    }

    /// Start a mood by id; `file` is the locator for custom music.
    pub fn play(&mut self, mood: &str, file: Option<String>) {
        self.inner.play_id(mood, file.as_deref());
    }

    /// Hand over the bytes behind a `blob:` URL before playing it.
    #[wasm_bindgen(js_name = loadFile)]
    pub fn load_file(&mut self, locator: &str, bytes: &[u8]) -> Result<(), JsValue> {
        self.inner
            .load_file(locator, bytes)
            .map_err(|e| JsValue::from_str(&format!("{e}")))
    }

    pub fn stop(&mut self) {
        self.inner.stop();
    }

    /// Call when the page is hidden; `resume` when it is shown again.
    pub fn suspend(&mut self) {
        self.inner.suspend();
    }

    pub fn resume(&mut self) {
        self.inner.resume();
    }

    #[wasm_bindgen(js_name = setMuted)]
    pub fn set_muted(&mut self, muted: bool) {
        self.inner.set_muted(muted);
    }

    #[wasm_bindgen(js_name = setVolume)]
    pub fn set_volume(&mut self, volume: f64) {
        self.inner.set_volume(volume);
    }

    /// Apply a settings object as sent by the settings form.
    #[wasm_bindgen(js_name = applySettings)]
    pub fn apply_settings(&mut self, settings: JsValue) -> Result<(), JsValue> {
        let settings: Settings =
            serde_wasm_bindgen::from_value(settings).map_err(|e| JsValue::from_str(&format!("{e}")))?;
        self.inner.apply_settings(&settings);
        Ok(())
    }

    /// Fill one mono output block.
    pub fn render(&mut self, out: &mut [f32]) {
        self.inner.render(out);
    }

    /// Current mood id (`"none"` when idle).
    pub fn mood(&self) -> String {
        self.inner.current_mood().id().to_string()
    }

    pub fn shutdown(&mut self) {
        self.inner.shutdown();
    }
}
