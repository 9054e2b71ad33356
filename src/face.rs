//! A single detected or hand-annotated cat face.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::landmark::{Landmark, LANDMARK_COUNT};
use crate::types::{BoundingBox, Point};

/// One cat face: source image, the 9 landmark points in canonical order and
/// a bounding box.
///
/// Records from live detection and records parsed from annotation strings
/// have the same shape, so drawing and export never care where a face came
/// from. The box is the detector's when one was available, otherwise the
/// tight box over the landmarks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Face {
    file: PathBuf,
    landmarks: [Point; LANDMARK_COUNT],
    bounds: BoundingBox,
}

impl Face {
    /// Build a face from a whitespace-delimited annotation string of the
    /// form `"<count> x1 y1 x2 y2 … x9 y9"`.
    ///
    /// The count token must equal 9 and exactly 18 coordinates must follow,
    /// consumed pairwise in canonical landmark order. Anything else fails
    /// with [`Error::MalformedAnnotation`]; a short string is never
    /// truncated into a partial record.
    pub fn from_annotation<P: AsRef<Path>>(file: P, annotation: &str) -> Result<Self> {
        let tokens: Vec<&str> = annotation.split_whitespace().collect();

        let count_token = tokens
            .first()
            .ok_or_else(|| Error::MalformedAnnotation("empty annotation".to_string()))?;
        let declared: usize = count_token.parse().map_err(|_| {
            Error::MalformedAnnotation(format!("point count is not an integer: {:?}", count_token))
        })?;
        if declared != LANDMARK_COUNT {
            return Err(Error::MalformedAnnotation(format!(
                "expected {} points, annotation declares {}",
                LANDMARK_COUNT, declared
            )));
        }

        let coords = &tokens[1..];
        if coords.len() != LANDMARK_COUNT * 2 {
            return Err(Error::MalformedAnnotation(format!(
                "expected {} coordinates, found {}",
                LANDMARK_COUNT * 2,
                coords.len()
            )));
        }

        let mut landmarks = [Point::new(0, 0); LANDMARK_COUNT];
        for (i, pair) in coords.chunks_exact(2).enumerate() {
            let x: i32 = pair[0].parse().map_err(|_| {
                Error::MalformedAnnotation(format!("non-integer coordinate: {:?}", pair[0]))
            })?;
            let y: i32 = pair[1].parse().map_err(|_| {
                Error::MalformedAnnotation(format!("non-integer coordinate: {:?}", pair[1]))
            })?;
            landmarks[i] = Point::new(x, y);
        }

        let bounds = BoundingBox::tight_around(&landmarks)?;
        Ok(Self {
            file: file.as_ref().to_path_buf(),
            landmarks,
            bounds,
        })
    }

    /// Build a face from live detector output: the detector's face box and
    /// the predicted shape, with points already in canonical landmark order.
    pub fn from_detection<P: AsRef<Path>>(
        file: P,
        bounds: BoundingBox,
        landmarks: [Point; LANDMARK_COUNT],
    ) -> Self {
        Self {
            file: file.as_ref().to_path_buf(),
            landmarks,
            bounds,
        }
    }

    /// Source image path.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Position of one landmark.
    pub fn landmark(&self, landmark: Landmark) -> Point {
        self.landmarks[landmark.index()]
    }

    /// All landmark points in canonical order.
    pub fn landmarks(&self) -> &[Point; LANDMARK_COUNT] {
        &self.landmarks
    }

    /// The face bounding box.
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }
}
