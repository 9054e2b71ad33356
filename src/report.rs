//! Console and JSON reporting of detection results.

use std::fmt::Write as _;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::face::Face;
use crate::landmark::{Landmark, LANDMARK_COUNT};
use crate::types::Point;

/// One face as exported by `--json`: `{"face": {...}}`.
#[derive(Serialize)]
pub struct FaceReport {
    pub face: FaceDetails,
}

#[derive(Serialize)]
pub struct FaceDetails {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub height: i32,
    pub width: i32,
    pub landmarks: LandmarkMap,
}

/// The landmark map, serialized as a JSON object keyed by display name in
/// canonical order.
pub struct LandmarkMap([Point; LANDMARK_COUNT]);

impl Serialize for LandmarkMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(LANDMARK_COUNT))?;
        for landmark in Landmark::ALL {
            let point = self.0[landmark.index()];
            map.serialize_entry(landmark.display_name(), &[point.x, point.y])?;
        }
        map.end()
    }
}

impl From<&Face> for FaceReport {
    fn from(face: &Face) -> Self {
        let bounds = face.bounds();
        Self {
            face: FaceDetails {
                left: bounds.left,
                top: bounds.top,
                right: bounds.right(),
                bottom: bounds.bottom(),
                height: bounds.height,
                width: bounds.width,
                landmarks: LandmarkMap(*face.landmarks()),
            },
        }
    }
}

/// Console block for one face: box corners, then every landmark by name.
pub fn face_summary(index: usize, face: &Face) -> String {
    let bounds = face.bounds();
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Face #{}: ({}, {}), ({}, {})",
        index,
        bounds.top,
        bounds.left,
        bounds.right(),
        bounds.bottom()
    );
    for landmark in Landmark::ALL {
        let point = face.landmark(landmark);
        let _ = writeln!(out, "   {}: ({}, {})", landmark.display_name(), point.x, point.y);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "9 175 160 239 162 199 199 149 121 137 78 166 93 281 101 312 96 296 133";

    #[test]
    fn json_export_carries_box_and_landmarks() {
        let face = Face::from_annotation("example.jpg", SAMPLE).unwrap();
        let value = serde_json::to_value(FaceReport::from(&face)).unwrap();

        assert_eq!(value["face"]["left"], 137);
        assert_eq!(value["face"]["top"], 78);
        assert_eq!(value["face"]["right"], 312);
        assert_eq!(value["face"]["bottom"], 199);
        assert_eq!(value["face"]["width"], 175);
        assert_eq!(value["face"]["height"], 121);

        let landmarks = value["face"]["landmarks"].as_object().unwrap();
        assert_eq!(landmarks.len(), LANDMARK_COUNT);
        assert_eq!(landmarks["Left Eye"], serde_json::json!([175, 160]));
        assert_eq!(landmarks["Right of Right Ear"], serde_json::json!([296, 133]));
    }

    #[test]
    fn json_landmarks_keep_canonical_order() {
        let face = Face::from_annotation("example.jpg", SAMPLE).unwrap();
        let json = serde_json::to_string(&FaceReport::from(&face)).unwrap();

        let positions: Vec<usize> = Landmark::ALL
            .iter()
            .map(|l| json.find(l.display_name()).unwrap())
            .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
    }

    #[test]
    fn console_summary_names_every_landmark() {
        let face = Face::from_annotation("example.jpg", SAMPLE).unwrap();
        let summary = face_summary(0, &face);

        assert!(summary.starts_with("Face #0: (78, 137), (312, 199)"));
        assert!(summary.contains("   Left Eye: (175, 160)"));
        assert!(summary.contains("   Mouth: (199, 199)"));
        assert_eq!(summary.lines().count(), 1 + LANDMARK_COUNT);
    }
}
