use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::audio::{DEFAULT_TONES_DIR, PlayerKind};
use crate::theremin::VolumeCurve;

/// Settings of the theremin, read from a JSON file such as
///
/// ```json
/// { "tones_dir": "tones/pure/", "interval_ms": 100, "player": "mplayer", "volume_curve": "linear" }
/// ```
///
/// Missing fields take their default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThereminConfig {
    /// Directory holding `00.wav` to `99.wav`
    pub tones_dir: PathBuf,

    /// Time between two played tones, in milliseconds
    pub interval_ms: u64,

    pub player: PlayerKind,

    pub volume_curve: VolumeCurve,

    /// Volume used until the tracker reports a position
    pub initial_volume: u32,
}

impl Default for ThereminConfig {
    fn default() -> Self {
        Self {
            tones_dir: PathBuf::from(DEFAULT_TONES_DIR),
            interval_ms: 100,
            player: PlayerKind::default(),
            volume_curve: VolumeCurve::default(),
            initial_volume: 100,
        }
    }
}

impl ThereminConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        let config: Self = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        if config.interval_ms == 0 {
            return Err(format!("{}: interval_ms must be positive", path.display()).into());
        }
        log::info!("Loaded theremin config from {}", path.display());
        Ok(config)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ThereminConfig =
            serde_json::from_str(r#"{"interval_ms": 250, "player": "silent"}"#).unwrap();
        assert_eq!(config.interval(), Duration::from_millis(250));
        assert_eq!(config.player, PlayerKind::Silent);
        assert_eq!(config.tones_dir, PathBuf::from("tones/pure/"));
        assert_eq!(config.volume_curve, VolumeCurve::Linear);
        assert_eq!(config.initial_volume, 100);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"tones_dir": "/tmp/tones", "volume_curve": "quadratic"}}"#
        )
        .unwrap();
        let config = ThereminConfig::load(file.path()).unwrap();
        assert_eq!(config.tones_dir, PathBuf::from("/tmp/tones"));
        assert_eq!(config.volume_curve, VolumeCurve::Quadratic);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"interval_ms": 0}}"#).unwrap();
        assert!(ThereminConfig::load(file.path()).is_err());
    }
}
