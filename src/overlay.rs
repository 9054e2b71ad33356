//! Drawing overlays for detected faces.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use crate::face::Face;
use crate::landmark::Landmark;
use crate::types::{BoundingBox, Point};

/// Radius of the dot drawn at each landmark.
const DOT_RADIUS: i32 = 5;

/// Color of the landmark dots.
const DOT_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// The fixed set of line segments connecting landmarks: the eye/mouth
/// triangle, then the chain from the mouth around both ears and back.
pub const OUTLINE: [(Landmark, Landmark); 10] = [
    (Landmark::LeftEye, Landmark::RightEye),
    (Landmark::RightEye, Landmark::Mouth),
    (Landmark::Mouth, Landmark::LeftEye),
    (Landmark::Mouth, Landmark::LeftOfLeftEar),
    (Landmark::LeftOfLeftEar, Landmark::TipOfLeftEar),
    (Landmark::TipOfLeftEar, Landmark::RightOfLeftEar),
    (Landmark::RightOfLeftEar, Landmark::LeftOfRightEar),
    (Landmark::LeftOfRightEar, Landmark::TipOfRightEar),
    (Landmark::TipOfRightEar, Landmark::RightOfRightEar),
    (Landmark::RightOfRightEar, Landmark::Mouth),
];

/// Pixel-coordinate endpoint pairs for the face outline, in [`OUTLINE`]
/// order, for rendering by any backend.
pub fn outline_segments(face: &Face) -> impl Iterator<Item = (Point, Point)> + '_ {
    OUTLINE
        .iter()
        .map(move |&(a, b)| (face.landmark(a), face.landmark(b)))
}

/// Draw the landmark outline of a face onto an image: a dot per landmark
/// plus the connecting segments.
pub fn draw_landmarks(image: &mut RgbImage, face: &Face, color: [u8; 3]) {
    for (start, end) in outline_segments(face) {
        draw_line_segment_mut(
            image,
            (start.x as f32, start.y as f32),
            (end.x as f32, end.y as f32),
            Rgb(color),
        );
    }
    // Dots go on top so line endpoints never cover them.
    for point in face.landmarks() {
        draw_filled_circle_mut(image, (point.x, point.y), DOT_RADIUS, DOT_COLOR);
    }
}

/// Draw a hollow rectangle around a face box. `thickness` expands the
/// outline inward one pixel ring at a time.
pub fn draw_face_box(image: &mut RgbImage, bounds: BoundingBox, color: [u8; 3], thickness: i32) {
    for ring in 0..thickness.max(1) {
        let width = bounds.width - 2 * ring;
        let height = bounds.height - 2 * ring;
        if width <= 0 || height <= 0 {
            break;
        }
        let rect = Rect::at(bounds.left + ring, bounds.top + ring)
            .of_size(width as u32, height as u32);
        draw_hollow_rect_mut(image, rect, Rgb(color));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const SAMPLE: &str = "9 175 160 239 162 199 199 149 121 137 78 166 93 281 101 312 96 296 133";

    #[test]
    fn outline_has_ten_segments_touching_every_landmark() {
        assert_eq!(OUTLINE.len(), 10);

        let touched: HashSet<Landmark> = OUTLINE
            .iter()
            .flat_map(|&(a, b)| [a, b])
            .collect();
        assert_eq!(touched.len(), Landmark::ALL.len());
    }

    #[test]
    fn segments_follow_the_adjacency_list() {
        let face = Face::from_annotation("example.jpg", SAMPLE).unwrap();
        let segments: Vec<(Point, Point)> = outline_segments(&face).collect();

        assert_eq!(segments.len(), 10);
        assert_eq!(
            segments[0],
            (face.landmark(Landmark::LeftEye), face.landmark(Landmark::RightEye))
        );
        assert_eq!(
            segments[9],
            (face.landmark(Landmark::RightOfRightEar), face.landmark(Landmark::Mouth))
        );
    }

    #[test]
    fn drawing_marks_pixels() {
        let face = Face::from_annotation("example.jpg", SAMPLE).unwrap();
        let mut image = RgbImage::new(400, 300);

        draw_landmarks(&mut image, &face, [0, 255, 0]);
        let eye = face.landmark(Landmark::LeftEye);
        assert_eq!(*image.get_pixel(eye.x as u32, eye.y as u32), DOT_COLOR);

        draw_face_box(&mut image, face.bounds(), [10, 20, 30], 2);
        let bounds = face.bounds();
        assert_eq!(
            *image.get_pixel(bounds.left as u32, bounds.top as u32),
            Rgb([10, 20, 30])
        );
    }
}
