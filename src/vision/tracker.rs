use opencv::core::{self, Point2f, Rect, RotatedRect, Scalar, Size, TermCriteria, Vector};
use opencv::{imgproc, prelude::*, video};

/// Number of bins of the hue histogram describing the tracked object.
pub const HUE_BINS: i32 = 16;

/// OpenCV stores hue in `0..180` for 8-bit images.
const HUE_RANGE: [f32; 2] = [0.0, 180.0];

/// Only pixels inside this HSV box take part in the histogram and the back-projection. Dull and
/// dark pixels carry unreliable hue.
#[derive(Debug, Clone, Copy)]
pub struct HsvRange {
    pub lower: Scalar,
    pub upper: Scalar,
}

impl Default for HsvRange {
    fn default() -> Self {
        Self {
            lower: Scalar::new(70.0, 100.0, 0.0, 0.0),
            upper: Scalar::new(150.0, 255.0, 255.0, 0.0),
        }
    }
}

/// Follows a coloured region across frames with CamShift on a hue histogram back-projection.
pub struct CamshiftTracker {
    range: HsvRange,
    hist: Option<Mat>,
    track_window: Option<Rect>,
    track_box: Option<RotatedRect>,
    back_projection: Mat,
}

impl CamshiftTracker {
    pub fn new() -> Self {
        Self::with_range(HsvRange::default())
    }

    pub fn with_range(range: HsvRange) -> Self {
        Self {
            range,
            hist: None,
            track_window: None,
            track_box: None,
            back_projection: Mat::default(),
        }
    }

    fn hsv_and_mask(&self, frame: &Mat) -> opencv::Result<(Mat, Mat)> {
        let mut hsv = Mat::default();
        imgproc::cvt_color_def(frame, &mut hsv, imgproc::COLOR_BGR2HSV)?;
        let mut mask = Mat::default();
        core::in_range(&hsv, &self.range.lower, &self.range.upper, &mut mask)?;
        Ok((hsv, mask))
    }

    /// Learn the colour of `selection` in `frame` and start tracking it from there.
    ///
    /// The selection is clipped to the frame first. Returns `false`, leaving the tracker as it
    /// was, when nothing of the selection lies inside the frame.
    pub fn select(&mut self, frame: &Mat, selection: Rect) -> opencv::Result<bool> {
        let Some(selection) = clip_to_frame(selection, frame.size()?) else {
            log::warn!(
                "Ignoring a selection outside the frame: {}x{} at ({}, {})",
                selection.width,
                selection.height,
                selection.x,
                selection.y
            );
            return Ok(false);
        };
        let (hsv, mask) = self.hsv_and_mask(frame)?;
        let hsv_roi = Mat::roi(&hsv, selection)?.try_clone()?;
        let mask_roi = Mat::roi(&mask, selection)?.try_clone()?;

        let mut hist = Mat::default();
        imgproc::calc_hist(
            &Vector::<Mat>::from_iter([hsv_roi]),
            &Vector::<i32>::from_slice(&[0]),
            &mask_roi,
            &mut hist,
            &Vector::<i32>::from_slice(&[HUE_BINS]),
            &Vector::<f32>::from_slice(&HUE_RANGE),
            false,
        )?;
        let mut normalized = Mat::default();
        core::normalize(
            &hist,
            &mut normalized,
            0.0,
            255.0,
            core::NORM_MINMAX,
            -1,
            &core::no_array(),
        )?;

        log::info!(
            "Tracking a {}x{} region at ({}, {})",
            selection.width,
            selection.height,
            selection.x,
            selection.y
        );
        self.hist = Some(normalized);
        self.track_window = Some(selection);
        self.track_box = None;
        Ok(true)
    }

    pub fn is_tracking(&self) -> bool {
        self.hist.is_some()
    }

    /// Move the track window to where the selected colour is in `frame`.
    ///
    /// Returns `None` until a region has been selected, or once the track window has collapsed.
    pub fn update(&mut self, frame: &Mat) -> opencv::Result<Option<RotatedRect>> {
        let (Some(hist), Some(mut window)) = (self.hist.as_ref(), self.track_window) else {
            return Ok(None);
        };
        if window.width <= 0 || window.height <= 0 {
            return Ok(None);
        }
        let (hsv, mask) = self.hsv_and_mask(frame)?;

        let mut prob = Mat::default();
        imgproc::calc_back_project(
            &Vector::<Mat>::from_iter([hsv]),
            &Vector::<i32>::from_slice(&[0]),
            hist,
            &mut prob,
            &Vector::<f32>::from_slice(&HUE_RANGE),
            1.0,
        )?;
        let mut masked = Mat::default();
        core::bitwise_and_def(&prob, &mask, &mut masked)?;

        let criteria = TermCriteria::new(core::TermCriteria_EPS | core::TermCriteria_COUNT, 10, 1.0)?;
        let track_box = video::cam_shift(&masked, &mut window, criteria)?;

        self.track_window = Some(window);
        self.track_box = Some(track_box);
        self.back_projection = masked;
        Ok(Some(track_box))
    }

    pub fn track_box(&self) -> Option<RotatedRect> {
        self.track_box
    }

    /// Centre of the current track box.
    pub fn point(&self) -> Option<Point2f> {
        self.track_box.as_ref().map(|b| b.center)
    }

    /// The masked back-projection computed by the last [`CamshiftTracker::update`].
    pub fn back_projection(&self) -> &Mat {
        &self.back_projection
    }
}

impl Default for CamshiftTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// The part of `rect` inside a frame of `size`, or `None` if they do not overlap.
fn clip_to_frame(rect: Rect, size: Size) -> Option<Rect> {
    let x0 = rect.x.max(0);
    let y0 = rect.y.max(0);
    let x1 = (rect.x + rect.width).min(size.width);
    let y1 = (rect.y + rect.height).min(size.height);
    (x1 > x0 && y1 > y0).then(|| Rect::new(x0, y0, x1 - x0, y1 - y0))
}

/// Draw the track box as an ellipse, skipping degenerate boxes.
pub fn draw_track_box(img: &mut Mat, track_box: &RotatedRect, color: Scalar) -> opencv::Result<()> {
    if track_box.size.width > 0.0 && track_box.size.height > 0.0 {
        imgproc::ellipse_rotated_rect(img, *track_box, color, 2, imgproc::LINE_8)?;
    }
    Ok(())
}
