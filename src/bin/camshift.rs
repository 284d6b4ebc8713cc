use std::sync::{Arc, Mutex};

use clap::Parser;
use opencv::core::Scalar;
use opencv::prelude::*;
use opencv::{highgui, imgproc};

use cv_theremin::camera::{Camera, VideoSource};
use cv_theremin::vision::selection::DragSelection;
use cv_theremin::vision::tracker::{CamshiftTracker, draw_track_box};
use cv_theremin::vision::trail::Trail;

const WINDOW: &str = "camshift";

/// Points farther apart than this between two frames are not painted.
const MAX_JUMP: f32 = 30000.0;

#[derive(Parser, Debug)]
#[command(
    name = "camshift",
    version = "0.1.1",
    about = "Mean-shift based tracking of a coloured object.",
    long_about = r#"Mean-shift based tracking of a coloured object.

Select a coloured object such as your face with the mouse and the program follows it. Once the object is tracked, a left click starts or stops painting its path.

Keys:
    ESC   exit
    b     toggle back-projected probability visualization"#
)]
struct Args {
    /// Camera index or path of a video file.
    #[arg(default_value = "0")]
    video_source: String,
}

#[derive(Default)]
struct MouseState {
    selection: DragSelection,
    selection_completed: bool,
    paint_active: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .try_init()?;

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
            if !mouse.selection_completed {
                mouse.selection.on_mouse(event, x, y);
            } else if event == highgui::EVENT_LBUTTONDOWN {
                mouse.paint_active = !mouse.paint_active;
            }
        })),
    )?;

    let mut tracker = CamshiftTracker::new();
    let mut trail = Trail::new(None, MAX_JUMP);
    let mut show_backproj = false;

    loop {
        let frame = camera.read_mirrored()?.try_clone()?;
        let mut vis = frame.try_clone()?;

        let (dragging, completed, paint_active) = {
            let mut mouse = mouse.lock().map_err(|_| "mouse state poisoned")?;
            (
                mouse.selection.in_progress(),
                mouse.selection.take_completed(),
                mouse.paint_active,
            )
        };
        if let Some(selection) = completed {
            if tracker.select(&frame, selection)? {
                mouse.lock().map_err(|_| "mouse state poisoned")?.selection_completed = true;
            }
        }
        if let Some(rect) = dragging {
            imgproc::rectangle(
                &mut vis,
                rect,
                Scalar::new(255.0, 255.0, 255.0, 0.0),
                1,
                imgproc::LINE_8,
                0,
            )?;
        }

        if let Some(track_box) = tracker.update(&frame)? {
            if show_backproj {
                imgproc::cvt_color_def(
                    tracker.back_projection(),
                    &mut vis,
                    imgproc::COLOR_GRAY2BGR,
                )?;
            }
            draw_track_box(&mut vis, &track_box, Scalar::new(0.0, 0.0, 255.0, 0.0))?;
            if paint_active {
                trail.push(track_box.center);
            }
            trail.draw(&mut vis, Scalar::new(0.0, 255.0, 0.0, 0.0))?;
        }

        highgui::imshow(WINDOW, &vis)?;
        let key = highgui::wait_key(5)?;
        if key == 27 {
            break;
        }
        if key == 'b' as i32 {
            show_backproj = !show_backproj;
        }
    }
    highgui::destroy_all_windows()?;
    Ok(())
}
