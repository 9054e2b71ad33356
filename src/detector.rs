//! Face detection seams and the detection pipeline head.
//!
//! Finding face boxes and regressing landmarks are delegated to trained
//! models behind the [`FaceLocator`] and [`LandmarkPredictor`] traits; the
//! rest of the crate only ever sees assembled [`Face`] records.

use std::path::Path;

use image::DynamicImage;

use crate::error::{Error, Result};
use crate::face::Face;
use crate::landmark::LANDMARK_COUNT;
use crate::types::{BoundingBox, Point};

/// A row-major grayscale pixel buffer.
///
/// Out-of-bounds reads return 0, so shape regression can sample around the
/// image border without bounds bookkeeping.
pub struct GrayFrame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl GrayFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(data.len(), (width * height) as usize);
        Self {
            data,
            width,
            height,
        }
    }

    /// Grayscale conversion of a decoded image.
    pub fn from_image(image: &DynamicImage) -> Self {
        let gray = image.to_luma8();
        let (width, height) = gray.dimensions();
        Self {
            data: gray.into_raw(),
            width,
            height,
        }
    }

    pub fn from_fn<F>(width: u32, height: u32, f: F) -> Self
    where
        F: Fn(u32, u32) -> u8,
    {
        let mut data = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            data,
            width,
            height,
        }
    }

    /// Intensity at (x, y), 0 outside the image.
    pub fn get(&self, x: i32, y: i32) -> u8 {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return 0;
        }
        self.data[(y as u32 * self.width + x as u32) as usize]
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Finds cat face boxes in a frame.
pub trait FaceLocator {
    fn locate(&mut self, frame: &GrayFrame) -> Result<Vec<BoundingBox>>;
}

/// Regresses the 9 landmark positions for one located face box, in
/// canonical landmark order.
pub trait LandmarkPredictor {
    fn predict(&self, frame: &GrayFrame, bounds: &BoundingBox) -> [Point; LANDMARK_COUNT];
}

/// Face locator backed by the `rustface` crate, with a trained cat-face
/// model loaded from disk.
pub struct SeetaFaceLocator {
    detector: Box<dyn rustface::Detector>,
}

impl SeetaFaceLocator {
    pub fn from_model<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path
            .as_ref()
            .to_str()
            .ok_or_else(|| Error::Detector("detector model path is not UTF-8".to_string()))?;
        let mut detector = rustface::create_detector(path)
            .map_err(|e| Error::Detector(format!("failed to load face detector: {}", e)))?;
        detector.set_min_face_size(20);
        detector.set_score_thresh(2.0);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);
        Ok(Self { detector })
    }
}

impl FaceLocator for SeetaFaceLocator {
    fn locate(&mut self, frame: &GrayFrame) -> Result<Vec<BoundingBox>> {
        let image = rustface::ImageData::new(frame.data(), frame.width(), frame.height());
        let faces = self.detector.detect(&image);

        Ok(faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                BoundingBox::new(bbox.x(), bbox.y(), bbox.width() as i32, bbox.height() as i32)
            })
            .collect())
    }
}

/// The pipeline head: locate boxes, predict landmarks, assemble records.
pub struct Detector<L, P> {
    locator: L,
    predictor: P,
}

impl<L: FaceLocator, P: LandmarkPredictor> Detector<L, P> {
    pub fn new(locator: L, predictor: P) -> Self {
        Self {
            locator,
            predictor,
        }
    }

    /// Detect every cat face in a decoded image. `file` is recorded as each
    /// face's source path.
    pub fn detect(&mut self, image: &DynamicImage, file: &Path) -> Result<Vec<Face>> {
        let frame = GrayFrame::from_image(image);
        let boxes = self.locator.locate(&frame)?;

        Ok(boxes
            .into_iter()
            .map(|bounds| {
                let landmarks = self.predictor.predict(&frame, &bounds);
                Face::from_detection(file, bounds, landmarks)
            })
            .collect())
    }
}
