use std::path::{Path, PathBuf};

/// Errors related to tone synthesis and playback
pub mod error;

/// Offline synthesis of the tone library
pub mod generator;

/// Players launching external audio programs
pub mod player;

pub use player::{Player, PlayerKind};

/// Number of tone files in a library. Tone indices run from 0 to `TONE_COUNT - 1`.
pub const TONE_COUNT: usize = 99;

/// Highest tone index with a file in the library.
pub const MAX_TONE: i32 = TONE_COUNT as i32 - 1;

/// The directory the demos look for tones in when nothing else is configured.
pub const DEFAULT_TONES_DIR: &str = "tones/pure/";

/// A directory of pre-generated tone files named `00.wav` to `98.wav`.
#[derive(Debug, Clone, PartialEq)]
pub struct ToneLibrary {
    dir: PathBuf,
}

impl ToneLibrary {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Clamp any tone index into the range covered by the library.
    pub fn clamp_tone(tone: i32) -> u8 {
        tone.clamp(0, MAX_TONE) as u8
    }

    /// Resolve a tone index to its file. Indices outside `0..=MAX_TONE` are clamped to the nearest
    /// end of the range, since a tracked point near the right edge of the frame maps to 99 or 100.
    pub fn path_for(&self, tone: i32) -> PathBuf {
        self.dir.join(tone_file_name(Self::clamp_tone(tone)))
    }
}

impl Default for ToneLibrary {
    fn default() -> Self {
        Self::new(DEFAULT_TONES_DIR)
    }
}

/// The file name of a tone inside a library, e.g. `07.wav`.
pub fn tone_file_name(tone: u8) -> String {
    format!("{:02}.wav", tone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_for_tone() {
        let library = ToneLibrary::new("tones/pure/");
        assert_eq!(library.path_for(7), PathBuf::from("tones/pure/07.wav"));
        assert_eq!(library.path_for(0), PathBuf::from("tones/pure/00.wav"));
        assert_eq!(library.path_for(42), PathBuf::from("tones/pure/42.wav"));
        assert_eq!(library.path_for(98), PathBuf::from("tones/pure/98.wav"));
    }

    #[test]
    fn test_out_of_range_tone_is_clamped() {
        let library = ToneLibrary::default();
        assert_eq!(library.path_for(99), PathBuf::from("tones/pure/98.wav"));
        assert_eq!(library.path_for(100), PathBuf::from("tones/pure/98.wav"));
        assert_eq!(library.path_for(1000), PathBuf::from("tones/pure/98.wav"));
        assert_eq!(library.path_for(-3), PathBuf::from("tones/pure/00.wav"));
    }
}
