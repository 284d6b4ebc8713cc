use opencv::{
    core::{self, Size},
    imgproc,
    prelude::*,
};

/// Foreground pixels differ from the background model by more than this on the grey scale.
pub const DEFAULT_THRESHOLD: f64 = 50.0;

/// Filtering applied to every frame before any further processing: a 5x5 median blur followed by
/// a 5x5 Gaussian blur.
pub fn denoise(frame: &Mat) -> opencv::Result<Mat> {
    let mut median = Mat::default();
    imgproc::median_blur(frame, &mut median, 5)?;
    let mut blurred = Mat::default();
    imgproc::gaussian_blur_def(&median, &mut blurred, Size::new(5, 5), 0.0)?;
    Ok(blurred)
}

/// Separates moving foreground from a static background by frame differencing.
///
/// The background model is a running average over the first `avg_frames` frames passed to
/// [`BackgroundSubtractor::foreground`]:
/// `model = frame * alpha + model * (1 - alpha)` with `alpha = 1 / avg_frames`. After that the
/// model is frozen.
pub struct BackgroundSubtractor {
    /// Running average in `CV_32F` depth
    model: Mat,
    avg_frames: u32,
    updates: u32,
    threshold: f64,
}

impl BackgroundSubtractor {
    pub fn new(first_frame: &Mat) -> opencv::Result<Self> {
        Self::with_params(first_frame, 1, DEFAULT_THRESHOLD)
    }

    pub fn with_params(first_frame: &Mat, avg_frames: u32, threshold: f64) -> opencv::Result<Self> {
        let mut model = Mat::default();
        first_frame.convert_to(&mut model, core::CV_32F, 1.0, 0.0)?;
        Ok(Self {
            model,
            avg_frames: avg_frames.max(1),
            updates: 0,
            threshold,
        })
    }

    /// Absolute per-channel difference between the background model and `frame`.
    pub fn foreground(&mut self, frame: &Mat) -> opencv::Result<Mat> {
        if self.updates < self.avg_frames {
            let alpha = 1.0 / self.avg_frames as f64;
            let mut frame_f = Mat::default();
            frame.convert_to(&mut frame_f, core::CV_32F, 1.0, 0.0)?;
            let mut blended = Mat::default();
            core::add_weighted(&frame_f, alpha, &self.model, 1.0 - alpha, 0.0, &mut blended, -1)?;
            self.model = blended;
        }
        self.updates = self.updates.saturating_add(1);

        let mut model_u8 = Mat::default();
        self.model.convert_to(&mut model_u8, core::CV_8U, 1.0, 0.0)?;
        let mut diff = Mat::default();
        core::absdiff(&model_u8, frame, &mut diff)?;
        Ok(diff)
    }

    /// A 3-channel mask that is white where `frame` belongs to the foreground and black elsewhere.
    pub fn foreground_mask(&mut self, frame: &Mat) -> opencv::Result<Mat> {
        let diff = self.foreground(frame)?;
        let mut gray = Mat::default();
        imgproc::cvt_color_def(&diff, &mut gray, imgproc::COLOR_BGR2GRAY)?;
        let mut mask = Mat::default();
        imgproc::threshold(&gray, &mut mask, self.threshold, 255.0, imgproc::THRESH_BINARY)?;
        let mut mask_bgr = Mat::default();
        imgproc::cvt_color_def(&mask, &mut mask_bgr, imgproc::COLOR_GRAY2BGR)?;
        Ok(mask_bgr)
    }
}

/// Keep the masked part of `frame` and fill the rest with `background`, which is scaled to the
/// frame's size.
pub fn replace_background(frame: &Mat, mask: &Mat, background: &Mat) -> opencv::Result<Mat> {
    let mut scaled = Mat::default();
    imgproc::resize(
        background,
        &mut scaled,
        frame.size()?,
        0.0,
        0.0,
        imgproc::INTER_LINEAR,
    )?;

    let mut foreground = Mat::default();
    core::bitwise_and_def(frame, mask, &mut foreground)?;
    let mut inverted = Mat::default();
    core::bitwise_not_def(mask, &mut inverted)?;
    let mut remaining = Mat::default();
    core::bitwise_and_def(&scaled, &inverted, &mut remaining)?;

    let mut composed = Mat::default();
    core::add_def(&foreground, &remaining, &mut composed)?;
    Ok(composed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{CV_8UC3, Rect, Scalar, Vec3b};

    fn uniform_frame(value: f64) -> Mat {
        Mat::new_rows_cols_with_default(8, 8, CV_8UC3, Scalar::all(value)).unwrap()
    }

    #[test]
    fn test_foreground_mask() {
        let background = uniform_frame(10.0);
        let mut subtractor = BackgroundSubtractor::new(&background).unwrap();
        // the first frame seeds the model
        let mask = subtractor.foreground_mask(&background).unwrap();
        assert_eq!(core::sum_elems(&mask).unwrap().0[0], 0.0);

        let mut frame = uniform_frame(10.0);
        imgproc::rectangle(
            &mut frame,
            Rect::new(2, 2, 3, 3),
            Scalar::all(200.0),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )
        .unwrap();
        let mask = subtractor.foreground_mask(&frame).unwrap();
        assert_eq!(mask.at_2d::<Vec3b>(3, 3).unwrap().0, [255, 255, 255]);
        assert_eq!(mask.at_2d::<Vec3b>(0, 0).unwrap().0, [0, 0, 0]);
        assert_eq!(mask.at_2d::<Vec3b>(7, 7).unwrap().0, [0, 0, 0]);
    }

    #[test]
    fn test_small_changes_stay_background() {
        let background = uniform_frame(100.0);
        let mut subtractor = BackgroundSubtractor::new(&background).unwrap();
        subtractor.foreground_mask(&background).unwrap();
        let mask = subtractor.foreground_mask(&uniform_frame(130.0)).unwrap();
        assert_eq!(core::sum_elems(&mask).unwrap().0[0], 0.0);
    }

    #[test]
    fn test_replace_background() {
        let frame = uniform_frame(200.0);
        let mut mask = uniform_frame(0.0);
        imgproc::rectangle(
            &mut mask,
            Rect::new(0, 0, 4, 8),
            Scalar::all(255.0),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )
        .unwrap();
        let background = Mat::new_rows_cols_with_default(4, 4, CV_8UC3, Scalar::all(50.0)).unwrap();
        let composed = replace_background(&frame, &mask, &background).unwrap();
        assert_eq!(composed.size().unwrap(), Size::new(8, 8));
        assert_eq!(composed.at_2d::<Vec3b>(3, 1).unwrap().0, [200, 200, 200]);
        assert_eq!(composed.at_2d::<Vec3b>(3, 6).unwrap().0, [50, 50, 50]);
    }
}
