/// Repeating timer that drives the theremin
pub mod timing;

/// Tone library, tone synthesis and audio players
pub mod audio;

/// Maps a tracked point to the tone and volume being played
pub mod theremin;

/// Theremin configuration file
pub mod config;

/// Frame capture from cameras and video files
pub mod camera;

/// Computer vision building blocks used by the demos
pub mod vision;
