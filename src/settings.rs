//! The settings record shared by the display, the countdown timer and the
//! mood player.
//!
//! Field names serialize in camelCase to match what the settings form sends.

use serde::{Deserialize, Serialize};

use crate::countdown::{self, Breakdown};
use crate::error::WaitroomError;
use crate::mood::Mood;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TitlePosition {
    Above,
    Below,
    #[default]
    Overlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountdownStyle {
    #[default]
    Digital,
    Minimal,
    Circles,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub event_title: String,
    /// `datetime-local` value, e.g. `2026-10-19T18:00`.
    pub start_time: String,
    pub background_color: String,
    pub show_seconds: bool,
    pub extra_info: String,
    /// Mood identifier; unknown values mean silence.
    pub music_type: String,
    pub custom_music_url: Option<String>,
    pub logo_url: Option<String>,
    pub image_url: Option<String>,
    pub show_camera_warning: bool,
    pub show_mic_warning: bool,
    pub title_position: TitlePosition,
    pub is_break_mode: bool,
    pub break_text: String,
    pub countdown_style: CountdownStyle,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            event_title: "Verkkolähetyksen Otsikko".to_string(),
            start_time: String::new(),
            background_color: "#f1f5f9".to_string(),
            show_seconds: true,
            extra_info: "Tervetuloa mukaan! Aloitamme hetken kuluttua. Tässä tilassa voit valmistautua rauhassa webinaarin alkuun.".to_string(),
            music_type: Mood::Silence.id().to_string(),
            custom_music_url: None,
            logo_url: None,
            image_url: Some(
                "https://images.unsplash.com/photo-1475721027785-f74eccf877e2?auto=format&fit=crop&q=80&w=1200"
                    .to_string(),
            ),
            show_camera_warning: true,
            show_mic_warning: true,
            title_position: TitlePosition::Overlay,
            is_break_mode: false,
            break_text: "Olemme pienellä tauolla. Palaamme pian!".to_string(),
            countdown_style: CountdownStyle::Digital,
        }
    }
}

impl Settings {
    /// Defaults with the event starting one hour after `now_ms`.
    pub fn new(now_ms: i64, utc_offset_minutes: i32) -> Self {
        Self {
            start_time: countdown::format_start_time(now_ms + 3_600_000, utc_offset_minutes),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, WaitroomError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, WaitroomError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn mood(&self) -> Mood {
        Mood::from_id(&self.music_type)
    }

    /// Locator of the custom music file, if one is set.
    pub fn custom_music(&self) -> Option<&str> {
        self.custom_music_url.as_deref().filter(|s| !s.is_empty())
    }

    pub fn target_ms(&self, utc_offset_minutes: i32) -> Result<i64, WaitroomError> {
        countdown::parse_start_time(&self.start_time, utc_offset_minutes)
    }

    /// Countdown to the configured start. Unparseable start times count as
    /// already started.
    pub fn time_left(&self, now_ms: i64, utc_offset_minutes: i32) -> Breakdown {
        match self.target_ms(utc_offset_minutes) {
            Ok(target) => Breakdown::until(target, now_ms),
            Err(_) => Breakdown::default(),
        }
    }
}
