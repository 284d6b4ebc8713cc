use std::error::Error;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::Parser;
use opencv::core::{Scalar, Size};
use opencv::prelude::*;
use opencv::{highgui, imgcodecs, imgproc};

use cv_theremin::audio::PlayerKind;
use cv_theremin::camera::{Camera, VideoSource};
use cv_theremin::config::ThereminConfig;
use cv_theremin::theremin::{Theremin, VolumeCurve, tone_at};
use cv_theremin::vision::background::{BackgroundSubtractor, denoise, replace_background};
use cv_theremin::vision::selection::DragSelection;
use cv_theremin::vision::tracker::{CamshiftTracker, draw_track_box};
use cv_theremin::vision::trail::Trail;

const WINDOW: &str = "main";

/// Length of the trail drawn behind the tracked point.
const TRAIL_POINTS: usize = 20;

#[derive(Parser, Debug)]
#[command(
    name = "cv_theremin",
    version = "0.1.1",
    about = "Play a theremin by moving a coloured object in front of your camera.",
    long_about = r#"Play a theremin by moving a coloured object in front of your camera.

After launching the program, drag a rectangle around the object you want to track. The horizontal position of the object selects the tone, its height selects the volume.

Keys and mouse:
    ESC           quit
    middle click  mute or unmute the theremin
    left click    switch to the next background image (with --background)"#
)]
struct Args {
    /// Camera index or path of a video file.
    #[arg(default_value = "0")]
    video_source: String,

    /// JSON file with the theremin settings.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the tone files 00.wav to 99.wav.
    #[arg(long)]
    tones_dir: Option<PathBuf>,

    #[arg(long, value_enum)]
    player: Option<PlayerKind>,

    #[arg(long, value_enum)]
    volume_curve: Option<VolumeCurve>,

    /// Replace the background behind moving objects with this image. Can be given several times.
    #[arg(long = "background")]
    backgrounds: Vec<PathBuf>,

    /// Log every tone played.
    #[arg(short, long)]
    verbose: bool,
}

/// Mouse input collected by the window's callback and consumed by the main loop.
#[derive(Default)]
struct MouseState {
    selection: DragSelection,
    tracking: bool,
    left_clicks: u32,
    middle_clicks: u32,
}

fn load_config(args: &Args) -> Result<ThereminConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => ThereminConfig::load(path)?,
        None => ThereminConfig::default(),
    };
    if let Some(tones_dir) = &args.tones_dir {
        config.tones_dir = tones_dir.clone();
    }
    if let Some(player) = args.player {
        config.player = player;
    }
    if let Some(volume_curve) = args.volume_curve {
        config.volume_curve = volume_curve;
    }
    Ok(config)
}

fn load_backgrounds(paths: &[PathBuf]) -> Result<Vec<Mat>, Box<dyn Error>> {
    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        let path_str = path.to_str().ok_or("Background path is not valid UTF-8")?;
        let img = imgcodecs::imread(path_str, imgcodecs::IMREAD_COLOR)?;
        if img.empty() {
            return Err(format!("Cannot read background image {}", path.display()).into());
        }
        log::info!("Loaded background {}", path.display());
        images.push(img);
    }
    Ok(images)
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .try_init()?;

    let config = load_config(&args)?;
    let backgrounds = load_backgrounds(&args.backgrounds)?;
    let source: VideoSource = args.video_source.parse()?;
    let mut camera = Camera::open(&source)?;

    highgui::named_window(WINDOW, highgui::WINDOW_AUTOSIZE)?;
    let mouse = Arc::new(Mutex::new(MouseState::default()));
    let mouse_clone = mouse.clone();
    highgui::set_mouse_callback(
        WINDOW,
        Some(Box::new(move |event, x, y, _flags| {
            let Ok(mut mouse) = mouse_clone.lock() else {
                return;
            };
            if !mouse.tracking {
                mouse.selection.on_mouse(event, x, y);
            } else if event == highgui::EVENT_LBUTTONDOWN {
                mouse.left_clicks += 1;
            } else if event == highgui::EVENT_MBUTTONDOWN {
                mouse.middle_clicks += 1;
            }
        })),
    )?;

    // first wait for the user to select the object to track
    let mut tracker = CamshiftTracker::new();
    loop {
        let mut frame = camera.read_mirrored()?.try_clone()?;
        let (dragging, completed) = {
            let mut mouse = mouse.lock().map_err(|_| "mouse state poisoned")?;
            (mouse.selection.in_progress(), mouse.selection.take_completed())
        };
        if let Some(selection) = completed {
            if tracker.select(&frame, selection)? {
                mouse.lock().map_err(|_| "mouse state poisoned")?.tracking = true;
                break;
            }
        }
        if let Some(rect) = dragging {
            imgproc::rectangle(
                &mut frame,
                rect,
                Scalar::new(255.0, 255.0, 255.0, 0.0),
                1,
                imgproc::LINE_8,
                0,
            )?;
        }
        highgui::imshow(WINDOW, &frame)?;
        if highgui::wait_key(5)? == 27 {
            // Esc pressed before anything was selected
            highgui::destroy_all_windows()?;
            return Ok(());
        }
    }

    let Size { width, height } = camera.frame_size()?;
    log::info!("Frame size: {}x{}", width, height);
    let mut subtractor = if backgrounds.is_empty() {
        None
    } else {
        Some(BackgroundSubtractor::new(&denoise(camera.last_frame())?)?)
    };
    let mut background_index = 0;
    let mut trail = Trail::new(Some(TRAIL_POINTS), f32::INFINITY);

    let mut theremin = Theremin::from_config(&config);
    theremin.start()?;

    loop {
        let frame = camera.read_mirrored()?.try_clone()?;
        let track_box = tracker.update(&frame)?;

        let mut output = match subtractor.as_mut() {
            Some(subtractor) => {
                let mut denoised = denoise(&frame)?;
                if let Some(track_box) = &track_box {
                    draw_track_box(&mut denoised, track_box, Scalar::new(255.0, 255.0, 255.0, 0.0))?;
                }
                let mask = subtractor.foreground_mask(&denoised)?;
                replace_background(&denoised, &mask, &backgrounds[background_index])?
            }
            None => {
                let mut output = frame;
                if let Some(track_box) = &track_box {
                    draw_track_box(&mut output, track_box, Scalar::new(0.0, 0.0, 255.0, 0.0))?;
                }
                output
            }
        };

        if let Some(point) = tracker.point() {
            trail.push(point);
            let tone = tone_at(point.x, width);
            let volume = config.volume_curve.volume_at(point.y, height);
            log::debug!("t: {}, v: {}", tone, volume);
            theremin.set_tone(tone);
            theremin.set_volume(volume);
        }
        trail.draw(&mut output, Scalar::new(0.0, 255.0, 0.0, 0.0))?;
        highgui::imshow(WINDOW, &output)?;

        if highgui::wait_key(5)? == 27 {
            break;
        }

        let (left_clicks, middle_clicks) = {
            let mut mouse = mouse.lock().map_err(|_| "mouse state poisoned")?;
            let clicks = (mouse.left_clicks, mouse.middle_clicks);
            mouse.left_clicks = 0;
            mouse.middle_clicks = 0;
            clicks
        };
        if !backgrounds.is_empty() {
            background_index = (background_index + left_clicks as usize) % backgrounds.len();
        }
        for _ in 0..middle_clicks {
            theremin.toggle()?;
            log::info!(
                "Theremin {}",
                if theremin.is_running() { "unmuted" } else { "muted" }
            );
        }
    }

    if theremin.is_running() {
        theremin.stop()?;
    }
    highgui::destroy_all_windows()?;
    Ok(())
}
