//! Pixel and percentage coordinate mapping.
//!
//! Pin positions are stored as percentages of the image's unscaled bounding
//! box, so they survive resizes, zoom and pan. Everything in this module is a
//! pure function of its inputs.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Lower bound of the nominal percentage range.
pub const PERCENT_MIN: f64 = 0.0;

/// Upper bound of the nominal percentage range.
pub const PERCENT_MAX: f64 = 100.0;

// ---------------------------------------------------------------------------
// Geometry types
// ---------------------------------------------------------------------------

/// A position in pixels. Which space it lives in (container, image) depends
/// on the caller.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise difference `self - other`.
    pub fn delta_from(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Both dimensions are finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn scaled(&self, factor: f64) -> Size {
        Size::new(self.width * factor, self.height * factor)
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Reject zero, negative or non-finite sizes.
    pub fn validate(&self, what: &str) -> Result<(), CoreError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(CoreError::Validation(format!(
                "{what} must have a finite, positive size, got {}x{}",
                self.width, self.height
            )))
        }
    }
}

/// An axis-aligned bounding box in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// A rectangle of the given size anchored at the origin.
    pub fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    fn validate(&self) -> Result<(), CoreError> {
        if !self.left.is_finite() || !self.top.is_finite() {
            return Err(CoreError::Validation(
                "image bounding box origin must be finite".to_string(),
            ));
        }
        self.size().validate("image bounding box")
    }
}

/// A position expressed as a percentage of the image's intrinsic dimensions.
///
/// The nominal range is `0..=100` on both axes, but values outside it are
/// representable: capture never clamps, only [`Percent::clamped`] does.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Percent {
    pub x: f64,
    pub y: f64,
}

impl Percent {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Both axes clamped into `[0, 100]`. NaN collapses to 0.
    pub fn clamped(self) -> Percent {
        Percent::new(clamp_percent(self.x), clamp_percent(self.y))
    }

    pub fn is_within_bounds(&self) -> bool {
        (PERCENT_MIN..=PERCENT_MAX).contains(&self.x)
            && (PERCENT_MIN..=PERCENT_MAX).contains(&self.y)
    }

    /// The position as a fraction in `0..=1` per axis.
    pub fn as_fraction(&self) -> (f64, f64) {
        (self.x / PERCENT_MAX, self.y / PERCENT_MAX)
    }
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

/// Map a pointer position to image-relative percentages.
///
/// `image` must be the *unscaled* bounding box of the image, in the same
/// space as `pointer`. Out-of-range results are returned as-is.
pub fn to_percent(pointer: Point, image: Rect) -> Result<Percent, CoreError> {
    image.validate()?;
    Ok(Percent::new(
        (pointer.x - image.left) / image.width * PERCENT_MAX,
        (pointer.y - image.top) / image.height * PERCENT_MAX,
    ))
}

/// Inverse of [`to_percent`].
pub fn from_percent(percent: Percent, image: Rect) -> Result<Point, CoreError> {
    image.validate()?;
    Ok(Point::new(
        image.left + percent.x / PERCENT_MAX * image.width,
        image.top + percent.y / PERCENT_MAX * image.height,
    ))
}

/// Clamp a single percentage into `[0, 100]`.
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        PERCENT_MIN
    } else {
        value.clamp(PERCENT_MIN, PERCENT_MAX)
    }
}

/// Scale `intrinsic` down (never up) so it fits inside `bounds`, keeping the
/// aspect ratio. This is how the host lays the image out at zoom 1.
pub fn fit_within(intrinsic: Size, bounds: Size) -> Result<Size, CoreError> {
    intrinsic.validate("image")?;
    bounds.validate("container")?;
    let factor = (bounds.width / intrinsic.width)
        .min(bounds.height / intrinsic.height)
        .min(1.0);
    Ok(intrinsic.scaled(factor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn to_percent_center_of_offset_image() {
        let image = Rect::new(100.0, 50.0, 400.0, 200.0);
        let p = to_percent(Point::new(300.0, 150.0), image).unwrap();
        assert!(approx_eq(p.x, 50.0));
        assert!(approx_eq(p.y, 50.0));
    }

    #[test]
    fn to_percent_corners() {
        let image = Rect::new(0.0, 0.0, 640.0, 480.0);
        assert_eq!(to_percent(Point::ORIGIN, image).unwrap(), Percent::new(0.0, 0.0));
        assert_eq!(
            to_percent(Point::new(640.0, 480.0), image).unwrap(),
            Percent::new(100.0, 100.0)
        );
    }

    #[test]
    fn to_percent_does_not_clamp() {
        let image = Rect::new(0.0, 0.0, 100.0, 100.0);
        let p = to_percent(Point::new(-10.0, 150.0), image).unwrap();
        assert!(approx_eq(p.x, -10.0));
        assert!(approx_eq(p.y, 150.0));
        assert!(!p.is_within_bounds());
    }

    #[test]
    fn to_percent_rejects_degenerate_box() {
        let err = to_percent(Point::ORIGIN, Rect::new(0.0, 0.0, 0.0, 10.0)).unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
        assert!(to_percent(Point::ORIGIN, Rect::new(0.0, 0.0, f64::NAN, 10.0)).is_err());
    }

    #[test]
    fn from_percent_inverts_to_percent() {
        let image = Rect::new(12.0, 34.0, 800.0, 600.0);
        let pointer = Point::new(212.5, 99.25);
        let back = from_percent(to_percent(pointer, image).unwrap(), image).unwrap();
        assert!(approx_eq(back.x, pointer.x));
        assert!(approx_eq(back.y, pointer.y));
    }

    #[test]
    fn clamped_limits_both_axes() {
        assert_eq!(Percent::new(-5.0, 250.0).clamped(), Percent::new(0.0, 100.0));
        assert_eq!(Percent::new(f64::NAN, 42.0).clamped(), Percent::new(0.0, 42.0));
    }

    #[test]
    fn fit_within_scales_down_preserving_aspect() {
        let fitted = fit_within(Size::new(2000.0, 1000.0), Size::new(800.0, 600.0)).unwrap();
        assert!(approx_eq(fitted.width, 800.0));
        assert!(approx_eq(fitted.height, 400.0));
    }

    #[test]
    fn fit_within_never_scales_up() {
        let fitted = fit_within(Size::new(100.0, 50.0), Size::new(800.0, 600.0)).unwrap();
        assert_eq!(fitted, Size::new(100.0, 50.0));
    }
}
