use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::landmark::LANDMARK_COUNT;

/// A 2D point in integer pixel coordinates.
///
/// Coordinates are trusted as they arrive from detector output or annotation
/// strings; no range validation is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned bounding box: top-left corner plus width and height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub const fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub const fn right(&self) -> i32 {
        self.left + self.width
    }

    pub const fn bottom(&self) -> i32 {
        self.top + self.height
    }

    /// Minimal box covering all of the given landmark points.
    ///
    /// Fails if fewer than the full landmark set is supplied; extra points
    /// would silently change the box, so the count is exact.
    pub fn tight_around(points: &[Point]) -> Result<Self> {
        if points.len() != LANDMARK_COUNT {
            return Err(Error::InvalidPointSet {
                expected: LANDMARK_COUNT,
                got: points.len(),
            });
        }

        let left = points.iter().map(|p| p.x).min().unwrap_or(0);
        let right = points.iter().map(|p| p.x).max().unwrap_or(0);
        let top = points.iter().map(|p| p.y).min().unwrap_or(0);
        let bottom = points.iter().map(|p| p.y).max().unwrap_or(0);

        Ok(Self {
            left,
            top,
            width: right - left,
            height: bottom - top,
        })
    }

    /// Tight box widened to equal width and height.
    ///
    /// The side is `max(width, height)` of the tight box and the top-left
    /// corner is kept, so the padding extends rightward/downward rather than
    /// being centered. Training exports rely on this exact geometry; callers
    /// expecting a centered square will observe a systematic offset.
    pub fn square_around(points: &[Point]) -> Result<Self> {
        let tight = Self::tight_around(points)?;
        let side = tight.width.max(tight.height);
        Ok(Self {
            left: tight.left,
            top: tight.top,
            width: side,
            height: side,
        })
    }

    /// Intersection with an image of the given dimensions, for cropping.
    /// Returns `None` when the box lies entirely outside the image.
    pub fn clamped(&self, image_width: u32, image_height: u32) -> Option<(u32, u32, u32, u32)> {
        let left = self.left.max(0) as u32;
        let top = self.top.max(0) as u32;
        let right = (self.right().max(0) as u32).min(image_width);
        let bottom = (self.bottom().max(0) as u32).min(image_height);

        if left >= right || top >= bottom {
            return None;
        }
        Some((left, top, right - left, bottom - top))
    }
}

/// Which bounding-box derivation a dataset export uses.
///
/// `Square` is the training-export policy: the detector trains on a fixed
/// aspect ratio. The two are not interchangeable, so every export call names
/// its policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxStyle {
    Tight,
    Square,
}

impl BoxStyle {
    pub fn derive(self, points: &[Point]) -> Result<BoundingBox> {
        match self {
            BoxStyle::Tight => BoundingBox::tight_around(points),
            BoxStyle::Square => BoundingBox::square_around(points),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_points() -> Vec<Point> {
        vec![
            Point::new(175, 160),
            Point::new(239, 162),
            Point::new(199, 199),
            Point::new(149, 121),
            Point::new(137, 78),
            Point::new(166, 93),
            Point::new(281, 101),
            Point::new(312, 96),
            Point::new(296, 133),
        ]
    }

    #[test]
    fn tight_box_spans_extrema() {
        let bbox = BoundingBox::tight_around(&sample_points()).unwrap();
        assert_eq!(bbox.left, 137);
        assert_eq!(bbox.top, 78);
        assert_eq!(bbox.right(), 312);
        assert_eq!(bbox.bottom(), 199);
    }

    #[test]
    fn tight_box_is_translation_invariant() {
        let points = sample_points();
        let shifted: Vec<Point> = points.iter().map(|p| Point::new(p.x + 17, p.y - 5)).collect();

        let base = BoundingBox::tight_around(&points).unwrap();
        let moved = BoundingBox::tight_around(&shifted).unwrap();

        assert_eq!(moved.left, base.left + 17);
        assert_eq!(moved.top, base.top - 5);
        assert_eq!(moved.width, base.width);
        assert_eq!(moved.height, base.height);
    }

    #[test]
    fn square_box_uses_longer_side() {
        let points = sample_points();
        let tight = BoundingBox::tight_around(&points).unwrap();
        let square = BoundingBox::square_around(&points).unwrap();

        assert_eq!(square.width, square.height);
        assert_eq!(square.width, tight.width.max(tight.height));
        // Top-left corner is preserved, not re-centered.
        assert_eq!(square.left, tight.left);
        assert_eq!(square.top, tight.top);
    }

    #[test]
    fn too_few_points_are_rejected() {
        let points = vec![Point::new(0, 0); 8];
        match BoundingBox::tight_around(&points) {
            Err(crate::error::Error::InvalidPointSet { expected: 9, got: 8 }) => {}
            other => panic!("expected InvalidPointSet, got {:?}", other),
        }
    }

    #[test]
    fn clamped_crop_stays_inside_image() {
        let bbox = BoundingBox::new(-10, 20, 50, 300);
        let (x, y, w, h) = bbox.clamped(100, 100).unwrap();
        assert_eq!((x, y), (0, 20));
        assert_eq!((w, h), (40, 80));

        let outside = BoundingBox::new(200, 200, 10, 10);
        assert!(outside.clamped(100, 100).is_none());
    }
}
