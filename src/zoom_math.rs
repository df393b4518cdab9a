//! Pan/zoom mathematics.
//!
//! Pure functions over the transform that maps natural image pixels to
//! container pixels, extracted for testability:
//!
//! ```text
//! screen = offset + image * scale
//! ```

use serde::{Deserialize, Serialize};

/// A 2D point, either in screen space or in image space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another point.
    pub fn distance_to(&self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Both dimensions are finite and strictly positive.
    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Scale both dimensions.
    pub fn scaled(&self, scale: f64) -> Size {
        Size::new(self.width * scale, self.height * scale)
    }
}

/// The affine map from natural image pixels to container pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub scale: f64,
    /// Container position of the image's top-left corner
    pub offset: Point,
}

impl Transform {
    /// Create a new transform with the given scale and offset.
    pub fn new(scale: f64, offset: Point) -> Self {
        Self { scale, offset }
    }

    /// Create an identity transform (scale=1, no offset).
    pub fn identity() -> Self {
        Self::new(1.0, Point::ORIGIN)
    }

    /// Map a natural image point to container space.
    pub fn image_to_screen(&self, image: Point) -> Point {
        Point::new(
            self.offset.x + image.x * self.scale,
            self.offset.y + image.y * self.scale,
        )
    }

    /// Map a container point back to natural image space.
    pub fn screen_to_image(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.offset.x) / self.scale,
            (screen.y - self.offset.y) / self.scale,
        )
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Smallest scale at which the image covers the whole container.
pub fn cover_scale(container: Size, natural: Size) -> f64 {
    (container.width / natural.width).max(container.height / natural.height)
}

/// Offset that centers the scaled image in the container.
pub fn centered_offset(container: Size, natural: Size, scale: f64) -> Point {
    let scaled = natural.scaled(scale);
    Point::new(
        (container.width - scaled.width) / 2.0,
        (container.height - scaled.height) / 2.0,
    )
}

/// Clamp one axis of the offset into `[min(0, container - image), 0]`.
pub fn clamp_axis(offset: f64, container: f64, image: f64) -> f64 {
    let lower = (container - image).min(0.0);
    offset.clamp(lower, 0.0)
}

/// Clamp an offset so the scaled image never reveals space beyond its edges.
pub fn clamp_offset(offset: Point, container: Size, natural: Size, scale: f64) -> Point {
    let scaled = natural.scaled(scale);
    Point::new(
        clamp_axis(offset.x, container.width, scaled.width),
        clamp_axis(offset.y, container.height, scaled.height),
    )
}

/// Fractional position of a screen point within the rendered image, each axis in [0, 1].
pub fn relative_position(screen: Point, transform: &Transform, natural: Size) -> Point {
    let image = transform.screen_to_image(screen);
    Point::new(
        (image.x / natural.width).clamp(0.0, 1.0),
        (image.y / natural.height).clamp(0.0, 1.0),
    )
}

/// Offset that places the fractional image position `rel` under `screen` at `scale`.
pub fn anchored_offset(screen: Point, rel: Point, natural: Size, scale: f64) -> Point {
    Point::new(
        screen.x - rel.x * natural.width * scale,
        screen.y - rel.y * natural.height * scale,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_identity_transform() {
        let t = Transform::identity();
        assert_eq!(t.scale, 1.0);
        assert_eq!(t.offset, Point::ORIGIN);
    }

    #[test]
    fn test_image_screen_roundtrip() {
        let t = Transform::new(0.75, Point::new(-120.0, -33.5));
        let image = Point::new(812.25, 407.0);
        let back = t.screen_to_image(t.image_to_screen(image));
        assert!(approx_eq(back.x, image.x));
        assert!(approx_eq(back.y, image.y));
    }

    #[test]
    fn test_cover_scale_picks_larger_ratio() {
        let container = Size::new(800.0, 600.0);
        let natural = Size::new(1600.0, 900.0);
        assert!(approx_eq(cover_scale(container, natural), 600.0 / 900.0));

        let tall = Size::new(400.0, 2000.0);
        assert!(approx_eq(cover_scale(container, tall), 2.0));
    }

    #[test]
    fn test_centered_offset() {
        let container = Size::new(800.0, 600.0);
        let natural = Size::new(1600.0, 900.0);
        let scale = cover_scale(container, natural);
        let offset = centered_offset(container, natural, scale);

        // Constraining axis is flush; the other axis overflows equally on both sides
        assert!(approx_eq(offset.y, 0.0));
        assert!(approx_eq(offset.x, (800.0 - 1600.0 * scale) / 2.0));
        assert!(offset.x < 0.0);
    }

    #[test]
    fn test_clamp_axis_bounds() {
        // Image wider than container: offset may range over [-200, 0]
        assert_eq!(clamp_axis(50.0, 800.0, 1000.0), 0.0);
        assert_eq!(clamp_axis(-500.0, 800.0, 1000.0), -200.0);
        assert_eq!(clamp_axis(-75.0, 800.0, 1000.0), -75.0);

        // Image exactly fills or is smaller: only 0 is allowed
        assert_eq!(clamp_axis(-10.0, 800.0, 800.0), 0.0);
        assert_eq!(clamp_axis(30.0, 800.0, 600.0), 0.0);
    }

    #[test]
    fn test_anchored_offset_keeps_point_under_cursor() {
        let natural = Size::new(1600.0, 900.0);
        let before = Transform::new(0.8, Point::new(-100.0, -40.0));
        let cursor = Point::new(310.0, 220.0);

        let rel = relative_position(cursor, &before, natural);
        let after = Transform::new(1.6, anchored_offset(cursor, rel, natural, 1.6));

        let image_before = before.screen_to_image(cursor);
        let image_after = after.screen_to_image(cursor);
        assert!(approx_eq(image_before.x, image_after.x));
        assert!(approx_eq(image_before.y, image_after.y));
    }

    #[test]
    fn test_relative_position_is_clamped() {
        let natural = Size::new(100.0, 100.0);
        let t = Transform::identity();
        let rel = relative_position(Point::new(-20.0, 250.0), &t, natural);
        assert_eq!(rel, Point::new(0.0, 1.0));
    }

    #[test]
    fn test_size_usable() {
        assert!(Size::new(1.0, 1.0).is_usable());
        assert!(!Size::new(0.0, 10.0).is_usable());
        assert!(!Size::new(10.0, f64::NAN).is_usable());
    }
}
