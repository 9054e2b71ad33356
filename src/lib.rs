//! # catfd
//!
//! Cat face and facial landmark detection.
//!
//! This crate provides:
//! - **Detection**: cat face boxes plus a fixed 9-point facial landmark
//!   scheme (eyes, mouth, three points per ear), with the trained models
//!   loaded from disk
//! - **Annotation**: landmark outlines, face rectangles and face crops
//!   rendered to image files, or structured JSON export
//! - **Training data**: reading and writing the imglab dataset XML the
//!   detector and shape-predictor trainers consume
//!
//! ## Quick Start
//!
//! ```rust
//! use catfd::{BoxStyle, Dataset, Face, Landmark};
//!
//! // One hand-annotated face: a point count followed by 9 (x, y) pairs in
//! // canonical landmark order.
//! let face = Face::from_annotation(
//!     "example.jpg",
//!     "9 175 160 239 162 199 199 149 121 137 78 166 93 281 101 312 96 296 133",
//! ).unwrap();
//!
//! assert_eq!(face.landmark(Landmark::Mouth).x, 199);
//! assert_eq!(face.bounds().left, 137);
//!
//! // Collect faces into a training dataset and serialize it for the
//! // trainer, with squared boxes so the detector sees one aspect ratio.
//! let dataset = Dataset::with_faces(vec![face]);
//! let xml = dataset.to_xml(BoxStyle::Square).unwrap();
//! assert!(xml.contains(r#"<part name="LEFT_EYE" x="175" y="160"/>"#));
//! ```
//!
//! ## Live detection
//!
//! ```no_run
//! use catfd::{CascadePredictor, Detector, SeetaFaceLocator};
//! use catfd::pipeline::{process_image, DetectOptions};
//! use std::path::Path;
//!
//! # fn main() -> catfd::Result<()> {
//! let locator = SeetaFaceLocator::from_model("data/detector.bin")?;
//! let predictor = CascadePredictor::load("data/predictor.bin")?;
//! let mut detector = Detector::new(locator, predictor);
//!
//! let options = DetectOptions {
//!     annotate_landmarks: true,
//!     ..DetectOptions::default()
//! };
//! let report = process_image(&mut detector, Path::new("cat.jpg"), &options)?;
//! println!("{} face(s)", report.faces.len());
//! # Ok(())
//! # }
//! ```

/// Dataset path configuration for training-data tooling
pub mod config;

/// imglab dataset XML reading and writing
pub mod dataset;

/// Face-locator and landmark-predictor seams, rustface backend
pub mod detector;

/// Error types and result handling
pub mod error;

/// The face record: landmarks plus bounding box
pub mod face;

/// The 9-point cat facial landmark scheme
pub mod landmark;

/// Landmark outlines and face-box drawing
pub mod overlay;

/// Per-image and folder batch processing
pub mod pipeline;

/// Cascade shape regression runtime
pub mod predictor;

/// Console and JSON reporting
pub mod report;

/// Points, bounding boxes and derivation policies
pub mod types;

pub use config::DatasetPaths;
pub use dataset::{Dataset, ImageEntry};
pub use detector::{Detector, FaceLocator, GrayFrame, LandmarkPredictor, SeetaFaceLocator};
pub use error::{Error, Result};
pub use face::Face;
pub use landmark::{Landmark, LANDMARK_COUNT};
pub use overlay::{outline_segments, OUTLINE};
pub use predictor::CascadePredictor;
pub use report::{face_summary, FaceReport};
pub use types::{BoundingBox, BoxStyle, Point};
