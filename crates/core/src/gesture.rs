//! Tap-versus-drag classification for a single pointer press.

use crate::coords::Point;

/// Mouse movement beyond this many pixels on either axis turns a press into
/// a drag.
pub const MOUSE_PAN_THRESHOLD_PX: f64 = 5.0;

/// Touch movement beyond this many pixels on either axis turns a press into
/// a drag.
pub const TOUCH_PAN_THRESHOLD_PX: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
}

impl PointerKind {
    pub fn drag_threshold(self) -> f64 {
        match self {
            Self::Mouse => MOUSE_PAN_THRESHOLD_PX,
            Self::Touch => TOUCH_PAN_THRESHOLD_PX,
        }
    }

    /// Mice track from the first pixel; touches hold still until the
    /// threshold is crossed so small jitters never scroll the image.
    fn tracks_below_threshold(self) -> bool {
        matches!(self, Self::Mouse)
    }
}

/// How a press ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressOutcome {
    /// Movement stayed under the threshold: treat as a click.
    Tap,
    Drag,
}

/// Follows one pointer from down to up.
#[derive(Debug, Clone)]
pub struct DragTracker {
    kind: PointerKind,
    origin: Point,
    last: Point,
    exceeded: bool,
}

impl DragTracker {
    pub fn start(kind: PointerKind, at: Point) -> Self {
        Self {
            kind,
            origin: at,
            last: at,
            exceeded: false,
        }
    }

    /// Feed a pointer move. Returns the incremental delta to apply since the
    /// last applied position, or `None` while a touch is still under the
    /// threshold.
    pub fn update(&mut self, at: Point) -> Option<Point> {
        let total = at.delta_from(self.origin);
        let threshold = self.kind.drag_threshold();
        if total.x.abs() > threshold || total.y.abs() > threshold {
            self.exceeded = true;
        }
        if !self.exceeded && !self.kind.tracks_below_threshold() {
            return None;
        }
        let delta = at.delta_from(self.last);
        self.last = at;
        Some(delta)
    }

    pub fn exceeded_threshold(&self) -> bool {
        self.exceeded
    }

    /// Displacement from the press origin to the last applied position.
    pub fn total_delta(&self) -> Point {
        self.last.delta_from(self.origin)
    }

    pub fn finish(&self) -> PressOutcome {
        if self.exceeded {
            PressOutcome::Drag
        } else {
            PressOutcome::Tap
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mouse_small_move_is_a_tap() {
        let mut tracker = DragTracker::start(PointerKind::Mouse, Point::new(100.0, 100.0));
        let delta = tracker.update(Point::new(104.0, 97.0)).unwrap();
        assert_eq!(delta, Point::new(4.0, -3.0));
        assert_eq!(tracker.finish(), PressOutcome::Tap);
    }

    #[test]
    fn mouse_threshold_is_strict() {
        let mut tracker = DragTracker::start(PointerKind::Mouse, Point::ORIGIN);
        tracker.update(Point::new(5.0, 0.0));
        assert_eq!(tracker.finish(), PressOutcome::Tap);
        tracker.update(Point::new(5.5, 0.0));
        assert_eq!(tracker.finish(), PressOutcome::Drag);
    }

    #[test]
    fn mouse_deltas_are_incremental() {
        let mut tracker = DragTracker::start(PointerKind::Mouse, Point::ORIGIN);
        assert_eq!(tracker.update(Point::new(3.0, 0.0)), Some(Point::new(3.0, 0.0)));
        assert_eq!(tracker.update(Point::new(10.0, 2.0)), Some(Point::new(7.0, 2.0)));
        assert_eq!(tracker.total_delta(), Point::new(10.0, 2.0));
    }

    #[test]
    fn touch_holds_still_below_threshold() {
        let mut tracker = DragTracker::start(PointerKind::Touch, Point::ORIGIN);
        assert_eq!(tracker.update(Point::new(8.0, 8.0)), None);
        assert_eq!(tracker.total_delta(), Point::ORIGIN);
        assert_eq!(tracker.finish(), PressOutcome::Tap);
    }

    #[test]
    fn touch_applies_full_displacement_once_threshold_crossed() {
        let mut tracker = DragTracker::start(PointerKind::Touch, Point::ORIGIN);
        tracker.update(Point::new(6.0, 0.0));
        let delta = tracker.update(Point::new(12.0, 1.0)).unwrap();
        assert_eq!(delta, Point::new(12.0, 1.0));
        assert_eq!(tracker.finish(), PressOutcome::Drag);
    }

    #[test]
    fn touch_move_that_mouse_would_pan_is_still_a_tap() {
        let mut touch = DragTracker::start(PointerKind::Touch, Point::ORIGIN);
        let mut mouse = DragTracker::start(PointerKind::Mouse, Point::ORIGIN);
        touch.update(Point::new(0.0, 7.0));
        mouse.update(Point::new(0.0, 7.0));
        assert_eq!(touch.finish(), PressOutcome::Tap);
        assert_eq!(mouse.finish(), PressOutcome::Drag);
    }
}
