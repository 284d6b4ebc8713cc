use opencv::core::{Point, Rect};
use opencv::highgui;

/// Tracks a rectangle the user drags with the left mouse button.
///
/// Feed it the events of an OpenCV mouse callback. The rectangle is completed when the button is
/// released; a drag that encloses no area is discarded.
#[derive(Debug, Default, Clone)]
pub struct DragSelection {
    drag_start: Option<Point>,
    current: Option<Rect>,
    completed: Option<Rect>,
}

impl DragSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_mouse(&mut self, event: i32, x: i32, y: i32) {
        if event == highgui::EVENT_LBUTTONDOWN {
            self.drag_start = Some(Point::new(x, y));
            self.completed = None;
        }
        let Some(start) = self.drag_start else {
            return;
        };
        let rect = Rect::new(
            x.min(start.x),
            y.min(start.y),
            (x - start.x).abs(),
            (y - start.y).abs(),
        );
        self.current = Some(rect);
        if event == highgui::EVENT_LBUTTONUP {
            self.drag_start = None;
            self.current = None;
            if rect.width > 0 && rect.height > 0 {
                self.completed = Some(rect);
            }
        }
    }

    /// The rectangle being dragged right now, if any.
    pub fn in_progress(&self) -> Option<Rect> {
        self.current
    }

    /// Hand out the last completed selection. Each selection is returned only once.
    pub fn take_completed(&mut self) -> Option<Rect> {
        self.completed.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_normalizes_corners() {
        let mut selection = DragSelection::new();
        selection.on_mouse(highgui::EVENT_LBUTTONDOWN, 100, 80);
        assert_eq!(selection.in_progress(), Some(Rect::new(100, 80, 0, 0)));
        selection.on_mouse(highgui::EVENT_MOUSEMOVE, 60, 120);
        assert_eq!(selection.in_progress(), Some(Rect::new(60, 80, 40, 40)));
        assert_eq!(selection.take_completed(), None);
        selection.on_mouse(highgui::EVENT_LBUTTONUP, 40, 130);
        assert_eq!(selection.in_progress(), None);
        assert_eq!(selection.take_completed(), Some(Rect::new(40, 80, 60, 50)));
        assert_eq!(selection.take_completed(), None);
    }

    #[test]
    fn test_moves_without_drag_are_ignored() {
        let mut selection = DragSelection::new();
        selection.on_mouse(highgui::EVENT_MOUSEMOVE, 10, 10);
        selection.on_mouse(highgui::EVENT_LBUTTONUP, 20, 20);
        assert_eq!(selection.in_progress(), None);
        assert_eq!(selection.take_completed(), None);
    }

    #[test]
    fn test_click_without_area_is_discarded() {
        let mut selection = DragSelection::new();
        selection.on_mouse(highgui::EVENT_LBUTTONDOWN, 30, 30);
        selection.on_mouse(highgui::EVENT_LBUTTONUP, 30, 50);
        assert_eq!(selection.take_completed(), None);
    }
}
