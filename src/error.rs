use std::fmt;

#[derive(Debug)]
pub enum WaitroomError {
    /// A voice was requested with a non-positive or non-finite frequency.
    InvalidFrequency(f64),
    /// `stop()` was called on an oscillator that is already stopped.
    AlreadyStopped,
    /// The audio context is closed and cannot produce sound.
    ContextClosed,
    Io(std::io::Error),
    Decode(DecodeError),
    Settings(serde_json::Error),
    InvalidStartTime { text: String },
}

#[derive(Debug)]
pub enum DecodeError {
    UnsupportedFormat { locator: String },
    Empty { locator: String },
    Wav(String),
    Mp3(String),
    /// The crate was built without the decoder for this format.
    Disabled { format: &'static str },
}

impl fmt::Display for WaitroomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitroomError::InvalidFrequency(hz) => write!(f, "Invalid voice frequency {hz} Hz"),
            WaitroomError::AlreadyStopped => write!(f, "Oscillator already stopped"),
            WaitroomError::ContextClosed => write!(f, "Audio context is closed"),
            WaitroomError::Io(e) => write!(f, "I/O error: {e}"),
            WaitroomError::Decode(e) => write!(f, "Decode error: {e}"),
            WaitroomError::Settings(e) => write!(f, "Settings error: {e}"),
            WaitroomError::InvalidStartTime { text } => write!(f, "Invalid start time '{text}'"),
        }
    }
}

impl std::error::Error for WaitroomError {}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::UnsupportedFormat { locator } => write!(f, "Unsupported audio format '{locator}'"),
            DecodeError::Empty { locator } => write!(f, "No audio frames in '{locator}'"),
            DecodeError::Wav(msg) => write!(f, "WAV: {msg}"),
            DecodeError::Mp3(msg) => write!(f, "MP3: {msg}"),
            DecodeError::Disabled { format } => write!(f, "built without the `{format}` decoder"),
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<std::io::Error> for WaitroomError {
    fn from(e: std::io::Error) -> Self {
        WaitroomError::Io(e)
    }
}

impl From<DecodeError> for WaitroomError {
    fn from(e: DecodeError) -> Self {
        WaitroomError::Decode(e)
    }
}

impl From<serde_json::Error> for WaitroomError {
    fn from(e: serde_json::Error) -> Self {
        WaitroomError::Settings(e)
    }
}

#[cfg(feature = "wav")]
impl From<hound::Error> for WaitroomError {
    fn from(e: hound::Error) -> Self {
        match e {
            hound::Error::IoError(io) => WaitroomError::Io(io),
            other => WaitroomError::Decode(DecodeError::Wav(other.to_string())),
        }
    }
}
