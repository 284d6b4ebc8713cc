use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};

use serde::{Deserialize, Serialize};

use crate::audio::error::PlaybackError;

/// Something that can play a tone file at a given volume.
///
/// `volume` is on the theremin's scale where 100 is the file's own loudness. Implementations must
/// return promptly; playback itself happens in the background.
pub trait Player: Send + Sync {
    fn play(&self, path: &Path, volume: u32) -> Result<(), PlaybackError>;
}

/// The players selectable from the command line or the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKind {
    /// `mplayer`, usually available on Linux
    Mplayer,
    /// `afplay`, shipped with macOS
    Afplay,
    /// Log the tone instead of playing it
    Silent,
}

impl Default for PlayerKind {
    fn default() -> Self {
        if cfg!(target_os = "macos") {
            Self::Afplay
        } else {
            Self::Mplayer
        }
    }
}

impl PlayerKind {
    pub fn into_player(self) -> Box<dyn Player> {
        match self {
            Self::Mplayer => Box::new(MplayerPlayer),
            Self::Afplay => Box::new(AfplayPlayer),
            Self::Silent => Box::new(SilentPlayer),
        }
    }
}

/// Plays tones through `mplayer`, converting the volume to a gain in decibels.
pub struct MplayerPlayer;

impl MplayerPlayer {
    /// 100 maps to 0 dB, every 5 volume steps is one decibel.
    pub fn gain_db(volume: u32) -> i32 {
        ((volume as f64 / 100.0 - 1.0) * 20.0) as i32
    }
}

impl Player for MplayerPlayer {
    fn play(&self, path: &Path, volume: u32) -> Result<(), PlaybackError> {
        let mut command = Command::new("mplayer");
        command
            .arg("-really-quiet")
            .arg("-af")
            .arg(format!("volume={}", Self::gain_db(volume)))
            .arg(path);
        launch_detached("mplayer", command, path)
    }
}

/// Plays tones through macOS's `afplay`.
pub struct AfplayPlayer;

impl AfplayPlayer {
    pub fn volume_arg(volume: u32) -> u32 {
        volume / 10 + 1
    }
}

impl Player for AfplayPlayer {
    fn play(&self, path: &Path, volume: u32) -> Result<(), PlaybackError> {
        let mut command = Command::new("afplay");
        command
            .arg(path)
            .arg("-v")
            .arg(Self::volume_arg(volume).to_string());
        launch_detached("afplay", command, path)
    }
}

pub struct SilentPlayer;

impl Player for SilentPlayer {
    fn play(&self, path: &Path, volume: u32) -> Result<(), PlaybackError> {
        log::debug!("Playing {} at volume {}", path.display(), volume);
        Ok(())
    }
}

/// Start `command` without waiting for it. The child is reaped on a short-lived thread so that
/// finished players do not linger as zombies.
fn launch_detached(program: &str, mut command: Command, path: &Path) -> Result<(), PlaybackError> {
    let child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| PlaybackError::new(program, path.to_path_buf(), e))?;
    if let Err(e) = reap(program, path.to_path_buf(), child) {
        log::warn!("Cannot watch the {} process: {}", program, e);
    }
    Ok(())
}

/// Wait for `child` on its own thread. The thread yields whether the player exited cleanly; a
/// failed exit is logged since the player's own output is discarded.
fn reap(program: &str, path: PathBuf, mut child: Child) -> io::Result<JoinHandle<bool>> {
    let program = program.to_string();
    thread::Builder::new()
        .name("player-reaper".to_string())
        .spawn(move || match child.wait() {
            Ok(status) if status.success() => true,
            Ok(status) => {
                log::warn!("{} failed on {}: {}", program, path.display(), status);
                false
            }
            Err(e) => {
                log::warn!("Lost track of {} playing {}: {}", program, path.display(), e);
                false
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mplayer_gain() {
        assert_eq!(MplayerPlayer::gain_db(100), 0);
        assert_eq!(MplayerPlayer::gain_db(200), 20);
        assert_eq!(MplayerPlayer::gain_db(0), -20);
        // truncated towards zero
        assert_eq!(MplayerPlayer::gain_db(57), -8);
    }

    #[test]
    fn test_afplay_volume() {
        assert_eq!(AfplayPlayer::volume_arg(0), 1);
        assert_eq!(AfplayPlayer::volume_arg(100), 11);
        assert_eq!(AfplayPlayer::volume_arg(199), 20);
    }

    #[test]
    fn test_player_kind_from_json() {
        let kind: PlayerKind = serde_json::from_str("\"silent\"").unwrap();
        assert_eq!(kind, PlayerKind::Silent);
        assert!(SilentPlayer.play(Path::new("tones/pure/07.wav"), 100).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_reaper_reports_exit_status() {
        let path = PathBuf::from("tones/pure/07.wav");
        let failing = Command::new("sh").args(["-c", "exit 3"]).spawn().unwrap();
        let reaper = reap("sh", path.clone(), failing).unwrap();
        assert!(!reaper.join().unwrap());

        let clean = Command::new("true").spawn().unwrap();
        assert!(reap("true", path, clean).unwrap().join().unwrap());
    }
}
