use std::error::Error;
use std::fmt::{Debug, Display};
use std::path::PathBuf;

/// This error occurs when an external audio player cannot be launched.
pub struct PlaybackError {
    program: String,
    path: PathBuf,
    cause: std::io::Error,
}

impl PlaybackError {
    pub fn new<S: Into<String>>(program: S, path: PathBuf, cause: std::io::Error) -> Self {
        Self {
            program: program.into(),
            path,
            cause,
        }
    }
}

impl Debug for PlaybackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cannot launch \"{}\" to play {}: {}",
            self.program,
            self.path.display(),
            self.cause,
        )
    }
}

impl Display for PlaybackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Error for PlaybackError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.cause)
    }
}

/// This error occurs when a tone cannot be synthesized or written to disk.
pub enum ToneError {
    /// The tone parameters do not describe a playable tone.
    InvalidParameter(String),

    /// The WAV encoder or the file system failed.
    Wav(hound::Error),
}

impl Debug for ToneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidParameter(reason) => write!(f, "Invalid tone parameter: {}", reason),
            Self::Wav(e) => write!(f, "Cannot write WAV data: {}", e),
        }
    }
}

impl Display for ToneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Error for ToneError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Wav(e) => Some(e),
            _ => None,
        }
    }
}

impl From<hound::Error> for ToneError {
    fn from(e: hound::Error) -> Self {
        Self::Wav(e)
    }
}

impl From<std::io::Error> for ToneError {
    fn from(e: std::io::Error) -> Self {
        Self::Wav(hound::Error::IoError(e))
    }
}
