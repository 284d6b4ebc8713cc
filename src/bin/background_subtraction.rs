use clap::Parser;
use opencv::core;
use opencv::highgui;
use opencv::prelude::*;

use cv_theremin::camera::{Camera, VideoSource};
use cv_theremin::vision::background::{BackgroundSubtractor, DEFAULT_THRESHOLD, denoise};

#[derive(Parser, Debug)]
#[command(
    name = "background_subtraction",
    version = "0.1.1",
    about = "Show only what moved since the first frame."
)]
struct Args {
    /// Camera index or path of a video file.
    #[arg(default_value = "0")]
    video_source: String,

    /// Grey level difference above which a pixel is foreground.
    #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
    threshold: f64,

    /// Number of frames averaged into the background model.
    #[arg(short, long, default_value_t = 1)]
    avg_frames: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .try_init()?;

    let source: VideoSource = args.video_source.parse()?;
    let mut camera = Camera::open(&source)?;
    let mut subtractor =
        BackgroundSubtractor::with_params(&denoise(camera.read()?)?, args.avg_frames, args.threshold)?;

    loop {
        let frame = denoise(camera.read()?)?;
        highgui::imshow("input", &frame)?;

        let mask = subtractor.foreground_mask(&frame)?;
        let mut masked = Mat::default();
        core::bitwise_and_def(&frame, &mask, &mut masked)?;
        highgui::imshow("mask", &masked)?;

        if highgui::wait_key(10)? & 0xFF == 27 {
            break;
        }
    }
    highgui::destroy_all_windows()?;
    Ok(())
}
