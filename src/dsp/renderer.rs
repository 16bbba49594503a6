//! Offline rendering of a mood — used for previews and WAV export.

use crate::mood::Mood;
use crate::player::{MoodPlayer, PlayerConfig};

/// Seed used for offline renders so previews are reproducible.
const PREVIEW_SEED: u64 = 0x5eed;

/// Render `seconds` of `mood` to mono f32 samples, including the fade-in.
pub fn render_mood(mood: Mood, seconds: f64, sample_rate: u32) -> Vec<f32> {
    let mut player = MoodPlayer::new(PlayerConfig {
        sample_rate: sample_rate as f64,
        seed: Some(PREVIEW_SEED),
        ..PlayerConfig::default()
    });
    player.play(mood, None);

    let mut out = vec![0.0_f32; (seconds.max(0.0) * sample_rate as f64) as usize];
    player.render(&mut out);
    player.shutdown();
    out
}

/// Render `seconds` of `mood` to a 16-bit mono WAV file as bytes.
pub fn render_mood_wav(mood: Mood, seconds: f64, sample_rate: u32) -> Vec<u8> {
    let samples = render_mood(mood, seconds, sample_rate);
    let pcm: Vec<i16> = samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect();
    encode_wav(&pcm, sample_rate, 1)
}

/// Encode interleaved i16 PCM samples to a WAV byte buffer.
fn encode_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
    let bits_per_sample: u16 = 16;
    let byte_rate = sample_rate * channels as u32 * (bits_per_sample as u32 / 8);
    let block_align = channels * (bits_per_sample / 8);
    let data_size = (samples.len() * 2) as u32;
    let file_size = 36 + data_size;

    let mut buf = Vec::with_capacity(44 + data_size as usize);

    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&file_size.to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    // fmt chunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for &sample in samples {
        buf.extend_from_slice(&sample.to_le_bytes());
    }

    buf
}
