//! Ambient moods and their chord presets.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dsp::oscillator::Waveform;

/// Which background sound is requested. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    #[default]
    #[serde(rename = "none")]
    Silence,
    #[serde(rename = "custom")]
    CustomFile,
    Airy,
    Warm,
    Calm,
}

/// A fixed chord: one voice per frequency, all sharing a waveform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChordPreset {
    pub frequencies: &'static [f64],
    pub waveform: Waveform,
}

// C major 9, bright and open.
const AIRY: ChordPreset = ChordPreset {
    frequencies: &[261.63, 329.63, 392.00, 493.88, 587.33],
    waveform: Waveform::Sine,
};

// C3 G3 C4 E4, a soft open-voiced triad.
const WARM: ChordPreset = ChordPreset {
    frequencies: &[130.81, 196.00, 261.63, 329.63],
    waveform: Waveform::Triangle,
};

// Low C minor with the fifth doubled.
const CALM: ChordPreset = ChordPreset {
    frequencies: &[65.41, 98.00, 130.81, 155.56, 196.00],
    waveform: Waveform::Sine,
};

impl Mood {
    pub const ALL: [Mood; 5] = [Mood::Silence, Mood::CustomFile, Mood::Airy, Mood::Warm, Mood::Calm];

    /// Resolve an identifier from the settings layer.
    ///
    /// Accepts the short ids and the display labels stored by the settings
    /// form. Anything else is silence.
    pub fn from_id(id: &str) -> Mood {
        match id.trim() {
            "airy" | "Ilmava ja kevyt" => Mood::Airy,
            "warm" | "Lämmin ja pehmeä" => Mood::Warm,
            "calm" | "Tyyni ja syvä" => Mood::Calm,
            "custom" | "Oma musiikkitiedosto" => Mood::CustomFile,
            _ => Mood::Silence,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            Mood::Silence => "none",
            Mood::CustomFile => "custom",
            Mood::Airy => "airy",
            Mood::Warm => "warm",
            Mood::Calm => "calm",
        }
    }

    /// Label shown in the settings form.
    pub fn label(self) -> &'static str {
        match self {
            Mood::Silence => "Ei musiikkia",
            Mood::CustomFile => "Oma musiikkitiedosto",
            Mood::Airy => "Ilmava ja kevyt",
            Mood::Warm => "Lämmin ja pehmeä",
            Mood::Calm => "Tyyni ja syvä",
        }
    }

    /// The chord for synthesized moods; `None` for silence and custom files.
    pub fn chord(self) -> Option<&'static ChordPreset> {
        match self {
            Mood::Airy => Some(&AIRY),
            Mood::Warm => Some(&WARM),
            Mood::Calm => Some(&CALM),
            Mood::Silence | Mood::CustomFile => None,
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
