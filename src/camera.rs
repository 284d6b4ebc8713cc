use std::convert::Infallible;
use std::fmt::Display;
use std::str::FromStr;

use opencv::{
    core::{self, Size},
    prelude::*,
    videoio,
};

/// Where the demos read their frames from.
#[derive(Debug, Clone, PartialEq)]
pub enum VideoSource {
    /// A camera index. Laptop's builtin camera is usually at index 0.
    Device(i32),
    /// A video file or stream URL
    Path(String),
}

impl Default for VideoSource {
    fn default() -> Self {
        Self::Device(0)
    }
}

impl FromStr for VideoSource {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().parse::<i32>() {
            Ok(index) => Self::Device(index),
            Err(_) => Self::Path(s.to_string()),
        })
    }
}

impl Display for VideoSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Device(index) => write!(f, "camera {}", index),
            Self::Path(path) => write!(f, "{}", path),
        }
    }
}

pub struct Camera {
    source: VideoSource,
    cam: videoio::VideoCapture,
    last_frame: Mat,
}

impl Camera {
    pub fn open(source: &VideoSource) -> Result<Self, Box<dyn std::error::Error>> {
        let cam = match source {
            VideoSource::Device(index) => videoio::VideoCapture::new(*index, videoio::CAP_ANY)?,
            VideoSource::Path(path) => videoio::VideoCapture::from_file(path, videoio::CAP_ANY)?,
        };
        if !videoio::VideoCapture::is_opened(&cam)? {
            return Err(format!("Unable to open {}!", source).into());
        }
        log::info!("Opened {}.", source);
        Ok(Self {
            source: source.clone(),
            cam,
            last_frame: Mat::default(),
        })
    }

    /// Read the next frame as the camera delivers it.
    pub fn read(&mut self) -> Result<&Mat, Box<dyn std::error::Error>> {
        let mut frame = Mat::default();
        let grabbed = self.cam.read(&mut frame)?;
        if !grabbed || frame.size()?.width <= 0 {
            return Err(format!("Unable to read a frame from {}!", self.source).into());
        }
        self.last_frame = frame;
        Ok(&self.last_frame)
    }

    /// Read the next frame flipped around the vertical axis, so that the picture behaves like a
    /// mirror for the person in front of the camera.
    pub fn read_mirrored(&mut self) -> Result<&Mat, Box<dyn std::error::Error>> {
        let mut mirrored = Mat::default();
        core::flip(self.read()?, &mut mirrored, 1)?;
        self.last_frame = mirrored;
        Ok(&self.last_frame)
    }

    pub fn last_frame(&self) -> &Mat {
        &self.last_frame
    }

    pub fn frame_size(&self) -> opencv::Result<Size> {
        self.last_frame.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_video_source() {
        assert_eq!("0".parse::<VideoSource>().unwrap(), VideoSource::Device(0));
        assert_eq!("2".parse::<VideoSource>().unwrap(), VideoSource::Device(2));
        assert_eq!(
            "clips/hand.mp4".parse::<VideoSource>().unwrap(),
            VideoSource::Path("clips/hand.mp4".to_string())
        );
        assert_eq!(VideoSource::default(), VideoSource::Device(0));
    }
}
