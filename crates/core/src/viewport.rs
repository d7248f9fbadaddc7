//! Viewport controller: pin zoom, manual zoom and clamped panning.
//!
//! The image layer carries two independent transforms:
//!
//! ```text
//! screen = C + zoom_level * ((translate + scale * p) - C)
//! ```
//!
//! where `p` is a point on the unscaled image, `C` the container center,
//! `scale`/`translate` the pin-zoom layer (top-left origin, scale 1 or 3) and
//! `zoom_level` the manual zoom layer (center origin, 0.5..=4).
//!
//! Translation is clamped so the pin-zoomed image always covers the
//! container: `translate.x ∈ [container.width - image.width * scale, 0]`,
//! and likewise for `y`.

use std::time::Duration;

use serde::Serialize;

use crate::coords::{self, Percent, Point, Rect, Size};
use crate::error::CoreError;
use crate::pins::PinId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Fixed scale used when zooming to a pin.
pub const PIN_ZOOM_SCALE: f64 = 3.0;

/// Manual zoom lower bound.
pub const MIN_ZOOM: f64 = 0.5;

/// Manual zoom upper bound.
pub const MAX_ZOOM: f64 = 4.0;

/// Manual zoom increment for the zoom buttons.
pub const ZOOM_STEP: f64 = 0.2;

/// Duration of the zoom-out animation in milliseconds.
pub const ZOOM_TRANSITION_MS: u64 = 500;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    /// Whole image visible, pin-zoom scale 1.
    Idle,
    /// Zoomed to `active_pin` at [`PIN_ZOOM_SCALE`].
    Zoomed { active_pin: PinId },
}

/// An animated transition the host should play before calling back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub duration: Duration,
}

/// Render instructions for the two image-layer transforms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewTransform {
    /// Pin-zoom layer translation, applied with a top-left origin.
    pub translate: Point,
    /// Pin-zoom layer scale, applied with a top-left origin.
    pub scale: f64,
    /// Manual zoom, applied around the container center.
    pub zoom_level: f64,
}

#[derive(Debug, Clone)]
pub struct Viewport {
    container: Size,
    image: Size,
    state: ViewState,
    translate: Point,
    zoom_level: f64,
}

impl Viewport {
    /// `image` is the rendered size of the image at scale 1.
    pub fn new(container: Size, image: Size) -> Result<Self, CoreError> {
        container.validate("container")?;
        image.validate("image")?;
        Ok(Self {
            container,
            image,
            state: ViewState::Idle,
            translate: Point::ORIGIN,
            zoom_level: 1.0,
        })
    }

    /// Apply a layout change and re-clamp the current translation.
    pub fn resize(&mut self, container: Size, image: Size) -> Result<(), CoreError> {
        container.validate("container")?;
        image.validate("image")?;
        self.container = container;
        self.image = image;
        self.translate = self.clamp_translate(self.translate);
        Ok(())
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn is_zoomed(&self) -> bool {
        matches!(self.state, ViewState::Zoomed { .. })
    }

    pub fn active_pin(&self) -> Option<&PinId> {
        match &self.state {
            ViewState::Zoomed { active_pin } => Some(active_pin),
            ViewState::Idle => None,
        }
    }

    /// Pin-zoom scale: 1 when idle, [`PIN_ZOOM_SCALE`] when zoomed.
    pub fn scale(&self) -> f64 {
        if self.is_zoomed() {
            PIN_ZOOM_SCALE
        } else {
            1.0
        }
    }

    pub fn translate(&self) -> Point {
        self.translate
    }

    pub fn zoom_level(&self) -> f64 {
        self.zoom_level
    }

    pub fn container(&self) -> Size {
        self.container
    }

    pub fn image(&self) -> Size {
        self.image
    }

    /// Combined on-screen magnification of the image.
    pub fn effective_scale(&self) -> f64 {
        self.scale() * self.zoom_level
    }

    pub fn transform(&self) -> ViewTransform {
        ViewTransform {
            translate: self.translate,
            scale: self.scale(),
            zoom_level: self.zoom_level,
        }
    }

    /// Valid `(min, max)` translation at the current scale.
    ///
    /// On an axis where the scaled image does not exceed the container the
    /// interval would be empty; that axis is pinned to 0.
    pub fn translate_bounds(&self) -> (Point, Point) {
        let scale = self.scale();
        let min_axis = |container: f64, image: f64| (container - image * scale).min(0.0);
        (
            Point::new(
                min_axis(self.container.width, self.image.width),
                min_axis(self.container.height, self.image.height),
            ),
            Point::ORIGIN,
        )
    }

    // -- Pin zoom -----------------------------------------------------------

    /// Zoom to `pin` at `at` and center it in the container as far as the
    /// clamp allows.
    pub fn pan_to_pin(&mut self, pin: &PinId, at: Percent) {
        self.state = ViewState::Zoomed {
            active_pin: pin.clone(),
        };
        let scaled = self.image.scaled(PIN_ZOOM_SCALE);
        let (fx, fy) = at.as_fraction();
        let center = self.container.center();
        let target = Point::new(center.x - fx * scaled.width, center.y - fy * scaled.height);
        self.translate = self.clamp_translate(target);
    }

    /// Return to scale 1 with no translation and reset the manual zoom.
    ///
    /// Returns the transition to animate, or `None` when already idle.
    pub fn zoom_out(&mut self) -> Option<Transition> {
        self.zoom_level = 1.0;
        if !self.is_zoomed() {
            return None;
        }
        self.state = ViewState::Idle;
        self.translate = Point::ORIGIN;
        Some(Transition {
            duration: Duration::from_millis(ZOOM_TRANSITION_MS),
        })
    }

    /// Pan by a screen-space delta. Only moves while zoomed; the result is
    /// clamped. Returns the translation now in effect.
    pub fn pan_by(&mut self, delta: Point) -> Point {
        if !self.is_zoomed() {
            return self.translate;
        }
        let target = Point::new(
            self.translate.x + delta.x / self.zoom_level,
            self.translate.y + delta.y / self.zoom_level,
        );
        self.translate = self.clamp_translate(target);
        self.translate
    }

    /// Whether `pin` should render dimmed: while zoomed, every pin except
    /// the active one is.
    pub fn is_dimmed(&self, pin: &PinId) -> bool {
        match &self.state {
            ViewState::Zoomed { active_pin } => active_pin != pin,
            ViewState::Idle => false,
        }
    }

    // -- Manual zoom --------------------------------------------------------

    /// Adjust the manual zoom by `delta`, clamped to `[MIN_ZOOM, MAX_ZOOM]`.
    pub fn manual_zoom(&mut self, delta: f64) -> f64 {
        self.set_manual_zoom(self.zoom_level + delta)
    }

    pub fn set_manual_zoom(&mut self, zoom: f64) -> f64 {
        if zoom.is_finite() {
            // Two decimals keeps repeated 0.2 steps from drifting.
            self.zoom_level = ((zoom.clamp(MIN_ZOOM, MAX_ZOOM)) * 100.0).round() / 100.0;
        }
        self.zoom_level
    }

    pub fn step_zoom_in(&mut self) -> f64 {
        self.manual_zoom(ZOOM_STEP)
    }

    pub fn step_zoom_out(&mut self) -> f64 {
        self.manual_zoom(-ZOOM_STEP)
    }

    pub fn reset_manual_zoom(&mut self) -> f64 {
        self.set_manual_zoom(1.0)
    }

    // -- Mapping ------------------------------------------------------------

    /// Unscaled image pixel to container coordinates.
    pub fn image_to_screen(&self, p: Point) -> Point {
        let scale = self.scale();
        let c = self.container.center();
        let inner = Point::new(self.translate.x + p.x * scale, self.translate.y + p.y * scale);
        Point::new(
            c.x + (inner.x - c.x) * self.zoom_level,
            c.y + (inner.y - c.y) * self.zoom_level,
        )
    }

    /// Container coordinates to unscaled image pixel.
    pub fn screen_to_image(&self, p: Point) -> Point {
        let scale = self.scale();
        let c = self.container.center();
        let inner = Point::new(
            c.x + (p.x - c.x) / self.zoom_level,
            c.y + (p.y - c.y) / self.zoom_level,
        );
        Point::new(
            (inner.x - self.translate.x) / scale,
            (inner.y - self.translate.y) / scale,
        )
    }

    pub fn percent_to_screen(&self, at: Percent) -> Point {
        let (fx, fy) = at.as_fraction();
        self.image_to_screen(Point::new(fx * self.image.width, fy * self.image.height))
    }

    /// Map a container-space pointer to image percentages, undoing both zoom
    /// layers first.
    pub fn screen_to_percent(&self, p: Point) -> Result<Percent, CoreError> {
        coords::to_percent(self.screen_to_image(p), Rect::from_size(self.image))
    }

    fn clamp_translate(&self, t: Point) -> Point {
        let (min, max) = self.translate_bounds();
        let clamp = |v: f64, lo: f64, hi: f64| if v.is_nan() { hi } else { v.clamp(lo, hi) };
        Point::new(clamp(t.x, min.x, max.x), clamp(t.y, min.y, max.y))
    }
}
