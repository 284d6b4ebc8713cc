/// Frame denoising, background subtraction and background replacement
pub mod background;

/// Mouse drag selection of the region to track
pub mod selection;

/// CamShift colour tracking
pub mod tracker;

/// History of the tracked point
pub mod trail;
