//! Conversion between percentage space and container space.
//!
//! Both directions go through natural image pixels and the current
//! transform, so they are exact inverses for in-range points.

use crate::model::PercentPoint;
use crate::zoom_math::{Point, Size, Transform};

/// The transform and image size needed to place markers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub transform: Transform,
    pub natural: Size,
}

impl Projection {
    pub fn new(transform: Transform, natural: Size) -> Self {
        Self { transform, natural }
    }

    /// Container position of a percentage coordinate.
    pub fn project(&self, position: PercentPoint) -> Point {
        to_screen(position, &self.transform, self.natural)
    }

    /// Percentage coordinate under a container point, clamped.
    pub fn unproject(&self, screen: Point) -> PercentPoint {
        to_percent(screen, &self.transform, self.natural)
    }
}

/// Container position of a percentage coordinate.
pub fn to_screen(position: PercentPoint, transform: &Transform, natural: Size) -> Point {
    transform.image_to_screen(position.to_image(natural))
}

/// Percentage coordinate under a container point, clamped to [0, 100].
pub fn to_percent(screen: Point, transform: &Transform, natural: Size) -> PercentPoint {
    PercentPoint::from_image(transform.screen_to_image(screen), natural)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn transforms() -> Vec<Transform> {
        vec![
            Transform::identity(),
            Transform::new(2.0 / 3.0, Point::new(-133.333, 0.0)),
            Transform::new(3.3, Point::new(-4000.5, -1200.25)),
            Transform::new(0.125, Point::new(12.0, 7.5)),
        ]
    }

    #[test]
    fn test_roundtrip_law() {
        let natural = Size::new(1600.0, 900.0);
        for t in transforms() {
            for xi in 0..=20 {
                for yi in 0..=20 {
                    let p = PercentPoint::new(f64::from(xi) * 5.0, f64::from(yi) * 5.0);
                    let back = to_percent(to_screen(p, &t, natural), &t, natural);
                    assert!((back.x - p.x).abs() < EPSILON, "{:?} -> {:?}", p, back);
                    assert!((back.y - p.y).abs() < EPSILON, "{:?} -> {:?}", p, back);
                }
            }
        }
    }

    #[test]
    fn test_to_screen_matches_formula() {
        let natural = Size::new(1600.0, 900.0);
        let t = Transform::new(0.5, Point::new(-100.0, -20.0));
        let screen = to_screen(PercentPoint::new(50.0, 50.0), &t, natural);
        assert_eq!(screen, Point::new(-100.0 + 800.0 * 0.5, -20.0 + 450.0 * 0.5));
    }

    #[test]
    fn test_outside_image_is_clamped() {
        let natural = Size::new(1000.0, 500.0);
        let t = Transform::new(1.0, Point::new(-50.0, -50.0));
        let p = to_percent(Point::new(-400.0, 10_000.0), &t, natural);
        assert_eq!(p, PercentPoint::new(0.0, 100.0));
    }
}
