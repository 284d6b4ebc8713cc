use std::collections::VecDeque;

use opencv::core::{Point, Point2f, Scalar};
use opencv::{imgproc, prelude::*};

/// The recent path of a tracked point.
pub struct Trail {
    points: VecDeque<Point2f>,
    /// Oldest points are dropped beyond this length. `None` keeps everything.
    capacity: Option<usize>,
    /// Points farther than this from the previous one are treated as tracking glitches.
    max_jump: f32,
}

impl Trail {
    pub fn new(capacity: Option<usize>, max_jump: f32) -> Self {
        Self {
            points: VecDeque::new(),
            capacity: capacity.filter(|c| *c > 0),
            max_jump,
        }
    }

    /// Append a point unless it jumps too far from the last one. Jumps are only checked once the
    /// trail holds two points. Returns whether the point was kept.
    pub fn push(&mut self, point: Point2f) -> bool {
        if self.points.len() >= 2 {
            if let Some(last) = self.points.back() {
                let distance = (last.x - point.x).hypot(last.y - point.y);
                if distance >= self.max_jump {
                    return false;
                }
            }
        }
        if let Some(capacity) = self.capacity {
            while self.points.len() >= capacity {
                self.points.pop_front();
            }
        }
        self.points.push_back(point);
        true
    }

    pub fn points(&self) -> impl Iterator<Item = &Point2f> {
        self.points.iter()
    }

    /// Draw the trail as a polyline.
    pub fn draw(&self, img: &mut Mat, color: Scalar) -> opencv::Result<()> {
        for (start, end) in self.points.iter().zip(self.points.iter().skip(1)) {
            imgproc::line(
                img,
                Point::new(start.x as i32, start.y as i32),
                Point::new(end.x as i32, end.y as i32),
                color,
                2,
                imgproc::LINE_8,
                0,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_drops_oldest() {
        let mut trail = Trail::new(Some(3), f32::INFINITY);
        for i in 0..5 {
            assert!(trail.push(Point2f::new(i as f32, 0.0)));
        }
        assert_eq!(trail.points().count(), 3);
        let xs: Vec<f32> = trail.points().map(|p| p.x).collect();
        assert_eq!(xs, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_jumps_rejected_after_two_points() {
        let mut trail = Trail::new(None, 50.0);
        assert!(trail.push(Point2f::new(0.0, 0.0)));
        // the second point is never checked
        assert!(trail.push(Point2f::new(300.0, 400.0)));
        assert!(!trail.push(Point2f::new(0.0, 0.0)));
        assert!(trail.push(Point2f::new(320.0, 430.0)));
        assert_eq!(trail.points().count(), 3);
    }

    #[test]
    fn test_draw() {
        let mut trail = Trail::new(None, f32::INFINITY);
        trail.push(Point2f::new(1.0, 5.0));
        trail.push(Point2f::new(8.0, 5.0));
        let mut img =
            Mat::new_rows_cols_with_default(10, 10, opencv::core::CV_8UC3, Scalar::all(0.0))
                .unwrap();
        trail.draw(&mut img, Scalar::new(0.0, 255.0, 0.0, 0.0)).unwrap();
        assert_eq!(img.at_2d::<opencv::core::Vec3b>(5, 4).unwrap().0, [0, 255, 0]);
        assert_eq!(img.at_2d::<opencv::core::Vec3b>(0, 0).unwrap().0, [0, 0, 0]);
    }
}
