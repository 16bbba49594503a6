//! Decoding of user-supplied music files into a mono [`SampleBuffer`].
//!
//! The container is recognised from its leading bytes rather than its name:
//! browser hosts hand over `blob:` URLs and uploads without an extension.
//! WAV goes through `hound` (feature `wav`), MP3 through `minimp3` (feature
//! `mp3`).

use std::path::Path;

use crate::error::{DecodeError, WaitroomError};

use super::sampler::SampleBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Wav,
    Mp3,
}

impl Format {
    /// Recognise a container from its header bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Format> {
        match bytes {
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'A', b'V', b'E', ..] => Some(Format::Wav),
            [b'I', b'D', b'3', ..] => Some(Format::Mp3),
            // Bare MPEG audio frame: 11-bit sync word.
            [0xFF, b, ..] if b & 0xE0 == 0xE0 => Some(Format::Mp3),
            _ => None,
        }
    }
}

/// Resolve a locator to a filesystem path.
pub fn locator_path(locator: &str) -> &Path {
    Path::new(locator.strip_prefix("file://").unwrap_or(locator))
}

/// Read and decode the local file behind `locator`.
pub fn load(locator: &str) -> Result<SampleBuffer, WaitroomError> {
    let bytes = std::fs::read(locator_path(locator))?;
    from_bytes(locator, &bytes)
}

/// Decode a whole file held in memory. `locator` only names it in errors.
pub fn from_bytes(locator: &str, bytes: &[u8]) -> Result<SampleBuffer, WaitroomError> {
    let format = Format::sniff(bytes).ok_or_else(|| DecodeError::UnsupportedFormat {
        locator: locator.to_string(),
    })?;
    let buffer = match format {
        Format::Wav => decode_wav(bytes)?,
        Format::Mp3 => decode_mp3(bytes)?,
    };
    if buffer.is_empty() {
        return Err(DecodeError::Empty {
            locator: locator.to_string(),
        }
        .into());
    }
    Ok(buffer)
}

#[cfg(feature = "wav")]
fn decode_wav(bytes: &[u8]) -> Result<SampleBuffer, WaitroomError> {
    let mut reader = hound::WavReader::new(std::io::Cursor::new(bytes))?;
    let spec = reader.spec();
    let channels = spec.channels as usize;

    let buffer = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Int, 16) => {
            let pcm = reader.samples::<i16>().collect::<Result<Vec<_>, _>>()?;
            SampleBuffer::from_i16_interleaved(&pcm, channels, spec.sample_rate)
        }
        (hound::SampleFormat::Int, bits) => {
            let scale = (1_i64 << (bits - 1)) as f32;
            let pcm = reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<Vec<_>, _>>()?;
            SampleBuffer::from_f32_interleaved(&pcm, channels, spec.sample_rate)
        }
        (hound::SampleFormat::Float, _) => {
            let pcm = reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?;
            SampleBuffer::from_f32_interleaved(&pcm, channels, spec.sample_rate)
        }
    };
    Ok(buffer)
}

#[cfg(not(feature = "wav"))]
fn decode_wav(_bytes: &[u8]) -> Result<SampleBuffer, WaitroomError> {
    Err(DecodeError::Disabled { format: "wav" }.into())
}

#[cfg(feature = "mp3")]
fn decode_mp3(bytes: &[u8]) -> Result<SampleBuffer, WaitroomError> {
    let mut decoder = minimp3::Decoder::new(std::io::Cursor::new(bytes));
    let mut pcm: Vec<i16> = Vec::new();
    let mut format: Option<(usize, u32)> = None;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                if format.is_none() {
                    format = Some((frame.channels, frame.sample_rate as u32));
                }
                pcm.extend_from_slice(&frame.data);
            }
            Err(minimp3::Error::Eof) => break,
            Err(minimp3::Error::SkippedData) => continue,
            Err(minimp3::Error::Io(e)) => return Err(e.into()),
            Err(e) => return Err(DecodeError::Mp3(format!("{e:?}")).into()),
        }
    }

    let (channels, sample_rate) = format.unwrap_or((1, 44100));
    Ok(SampleBuffer::from_i16_interleaved(&pcm, channels, sample_rate))
}

#[cfg(not(feature = "mp3"))]
fn decode_mp3(_bytes: &[u8]) -> Result<SampleBuffer, WaitroomError> {
    Err(DecodeError::Disabled { format: "mp3" }.into())
}
