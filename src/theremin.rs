use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::audio::{Player, ToneLibrary};
use crate::config::ThereminConfig;
use crate::timing::Trigger;
use crate::timing::error::TimingError;

/// What the theremin plays on its next firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToneState {
    pub tone: u8,
    pub volume: u32,
}

impl Default for ToneState {
    fn default() -> Self {
        Self {
            tone: 0,
            volume: 100,
        }
    }
}

/// How the vertical position of the tracked point maps to volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum VolumeCurve {
    /// 0 at the bottom of the frame, 200 at the top
    #[default]
    Linear,
    /// 0 at the bottom of the frame, 100 at the top, rising quadratically
    Quadratic,
}

impl VolumeCurve {
    pub fn volume_at(self, y: f32, height: i32) -> u32 {
        let height_ratio = 1.0 - (y as f64 / height as f64);
        let volume = match self {
            Self::Linear => height_ratio * 200.0,
            Self::Quadratic => height_ratio * height_ratio * 100.0,
        };
        volume.max(0.0) as u32
    }
}

/// The tone played for a point at horizontal position `x`: 0 at the left edge, 100 at the right.
pub fn tone_at(x: f32, width: i32) -> i32 {
    (x as f64 / width as f64 * 100.0) as i32
}

/// Periodically plays the current tone through a [`Player`].
///
/// The underlying trigger is only created by the first call to [`Theremin::start`]. Until then,
/// [`Theremin::stop`] and [`Theremin::toggle`] report an invalid state.
pub struct Theremin {
    library: ToneLibrary,
    player: Arc<dyn Player>,
    interval: Duration,
    initial: ToneState,
    trigger: Option<Trigger<ToneState>>,
}

impl Theremin {
    pub fn new(library: ToneLibrary, player: Arc<dyn Player>, interval: Duration) -> Self {
        Self {
            library,
            player,
            interval,
            initial: ToneState::default(),
            trigger: None,
        }
    }

    pub fn from_config(config: &ThereminConfig) -> Self {
        let mut theremin = Self::new(
            ToneLibrary::new(&config.tones_dir),
            Arc::from(config.player.into_player()),
            config.interval(),
        );
        theremin.set_volume(config.initial_volume);
        theremin
    }

    pub fn start(&mut self) -> Result<(), TimingError> {
        if let Some(trigger) = &self.trigger {
            return trigger.start();
        }
        let library = self.library.clone();
        let player = Arc::clone(&self.player);
        let trigger = Trigger::with_state(self.interval, self.initial, move |state: ToneState| {
            let path = library.path_for(state.tone as i32);
            player.play(&path, state.volume)?;
            Ok(())
        })?;
        log::info!(
            "Theremin started, playing from {} every {:?}",
            self.library.dir().display(),
            self.interval
        );
        self.trigger = Some(trigger);
        Ok(())
    }

    pub fn stop(&self) -> Result<(), TimingError> {
        self.started_trigger("stop")?.stop()
    }

    pub fn toggle(&self) -> Result<(), TimingError> {
        self.started_trigger("toggle")?.toggle()
    }

    pub fn is_running(&self) -> bool {
        self.trigger.as_ref().is_some_and(|t| t.is_running())
    }

    /// Select the tone to play. Out of range tones are clamped into the library.
    pub fn set_tone(&mut self, tone: i32) {
        let tone = ToneLibrary::clamp_tone(tone);
        self.update(|state| state.tone = tone);
    }

    pub fn set_volume(&mut self, volume: u32) {
        self.update(|state| state.volume = volume);
    }

    pub fn state(&self) -> ToneState {
        match &self.trigger {
            Some(trigger) => trigger.snapshot(),
            None => self.initial,
        }
    }

    fn update(&mut self, f: impl FnOnce(&mut ToneState)) {
        match &self.trigger {
            Some(trigger) => trigger.update(f),
            None => f(&mut self.initial),
        }
    }

    fn started_trigger(&self, operation: &str) -> Result<&Trigger<ToneState>, TimingError> {
        self.trigger.as_ref().ok_or_else(|| {
            TimingError::invalid_state(format!(
                "{} called on a theremin that was never started",
                operation
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_mapping() {
        assert_eq!(tone_at(0.0, 640), 0);
        assert_eq!(tone_at(320.0, 640), 50);
        assert_eq!(tone_at(639.0, 640), 99);
        assert_eq!(tone_at(640.0, 640), 100);
    }

    #[test]
    fn test_volume_curves() {
        assert_eq!(VolumeCurve::Linear.volume_at(0.0, 480), 200);
        assert_eq!(VolumeCurve::Linear.volume_at(240.0, 480), 100);
        assert_eq!(VolumeCurve::Linear.volume_at(480.0, 480), 0);
        assert_eq!(VolumeCurve::Quadratic.volume_at(0.0, 480), 100);
        assert_eq!(VolumeCurve::Quadratic.volume_at(240.0, 480), 25);
        // the tracked point may drift below the frame
        assert_eq!(VolumeCurve::Linear.volume_at(500.0, 480), 0);
    }

    #[test]
    fn test_state_before_start() {
        let mut theremin = Theremin::new(
            ToneLibrary::default(),
            Arc::new(crate::audio::player::SilentPlayer),
            Duration::from_secs(10),
        );
        theremin.set_tone(130);
        theremin.set_volume(40);
        assert_eq!(
            theremin.state(),
            ToneState {
                tone: 98,
                volume: 40
            }
        );
        assert!(!theremin.is_running());
        assert!(matches!(theremin.stop(), Err(TimingError::InvalidState(_))));
        assert!(matches!(theremin.toggle(), Err(TimingError::InvalidState(_))));
    }
}
