//! Per-image detection processing and folder batches.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use image::GenericImageView;
use log::{debug, warn};

use crate::detector::{Detector, FaceLocator, LandmarkPredictor};
use crate::error::{Error, Result};
use crate::face::Face;
use crate::overlay;

/// What to do with each processed image beyond detection itself.
#[derive(Debug, Clone)]
pub struct DetectOptions {
    /// Directory for chips and annotated images, created on first use.
    pub output_dir: PathBuf,
    /// Save a cropped image of each detected face.
    pub save_chip: bool,
    /// Draw a rectangle around each detected face.
    pub annotate_faces: bool,
    /// Draw the landmark outline of each detected face.
    pub annotate_landmarks: bool,
    /// Face rectangle color.
    pub face_color: [u8; 3],
    /// Landmark line color.
    pub landmark_color: [u8; 3],
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            save_chip: false,
            annotate_faces: false,
            annotate_landmarks: false,
            face_color: [25, 255, 100],
            landmark_color: [255, 50, 100],
        }
    }
}

/// Detection results for one image.
#[derive(Debug)]
pub struct ImageReport {
    pub file: PathBuf,
    pub faces: Vec<Face>,
}

/// Folder batch results: per-image reports plus the files that failed.
#[derive(Debug)]
pub struct BatchSummary {
    pub reports: Vec<ImageReport>,
    pub failures: Vec<(PathBuf, Error)>,
}

/// Output path `<output_dir>/<input stem><suffix>.<ext>`, creating the
/// directory when missing.
pub fn output_file(output_dir: &Path, input: &Path, suffix: &str, ext: &str) -> Result<PathBuf> {
    if !output_dir.is_dir() {
        fs::create_dir_all(output_dir)?;
    }
    let stem = input
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or("output");
    Ok(output_dir.join(format!("{}{}.{}", stem, suffix, ext)))
}

/// Run detection on one image and apply the requested outputs.
pub fn process_image<L: FaceLocator, P: LandmarkPredictor>(
    detector: &mut Detector<L, P>,
    path: &Path,
    options: &DetectOptions,
) -> Result<ImageReport> {
    let image = image::open(path)?;
    let faces = detector.detect(&image, path)?;
    debug!("{}: {} face(s)", path.display(), faces.len());

    if options.save_chip {
        for (i, face) in faces.iter().enumerate() {
            let Some((x, y, w, h)) = face.bounds().clamped(image.width(), image.height()) else {
                warn!(
                    "{}: face {} box lies outside the image, no chip saved",
                    path.display(),
                    i
                );
                continue;
            };
            let chip = image.crop_imm(x, y, w, h);
            let chip_path = output_file(&options.output_dir, path, &format!("_face_{}", i), "jpg")?;
            chip.save(&chip_path)?;
        }
    }

    if (options.annotate_faces || options.annotate_landmarks) && !faces.is_empty() {
        let mut annotated = image.to_rgb8();
        let box_thickness = ((image.width() as f32 * 0.005) as i32).max(1);

        for face in &faces {
            if options.annotate_landmarks {
                overlay::draw_landmarks(&mut annotated, face, options.landmark_color);
            }
            if options.annotate_faces {
                overlay::draw_face_box(
                    &mut annotated,
                    face.bounds(),
                    options.face_color,
                    box_thickness,
                );
            }
        }

        let annotated_path = output_file(&options.output_dir, path, "_annotated", "jpg")?;
        annotated.save(&annotated_path)?;
    }

    Ok(ImageReport {
        file: path.to_path_buf(),
        faces,
    })
}

/// Process every JPEG directly inside a folder, one image at a time.
///
/// A file that fails to decode or detect is logged and recorded in the
/// summary; it never aborts the rest of the batch.
pub fn process_folder<L: FaceLocator, P: LandmarkPredictor>(
    detector: &mut Detector<L, P>,
    folder: &Path,
    options: &DetectOptions,
) -> Result<BatchSummary> {
    let mut files: Vec<PathBuf> = fs::read_dir(folder)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_jpeg(path))
        .collect();
    files.sort();

    let mut summary = BatchSummary {
        reports: Vec::new(),
        failures: Vec::new(),
    };

    for file in files {
        match process_image(detector, &file, options) {
            Ok(report) => summary.reports.push(report),
            Err(err) => {
                warn!("{}: {}", file.display(), err);
                summary.failures.push((file, err));
            }
        }
    }

    Ok(summary)
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::GrayFrame;
    use crate::landmark::LANDMARK_COUNT;
    use crate::types::{BoundingBox, Point};
    use image::RgbImage;

    struct OneBoxLocator;

    impl FaceLocator for OneBoxLocator {
        fn locate(&mut self, _frame: &GrayFrame) -> crate::error::Result<Vec<BoundingBox>> {
            Ok(vec![BoundingBox::new(8, 8, 16, 16)])
        }
    }

    struct GridPredictor;

    impl LandmarkPredictor for GridPredictor {
        fn predict(&self, _frame: &GrayFrame, bounds: &BoundingBox) -> [Point; LANDMARK_COUNT] {
            let mut points = [Point::new(0, 0); LANDMARK_COUNT];
            for (i, point) in points.iter_mut().enumerate() {
                *point = Point::new(bounds.left + i as i32, bounds.top + i as i32);
            }
            points
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("catfd_pipeline_{}", name));
        fs::remove_dir_all(&dir).ok();
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn jpeg_filter_matches_both_extensions() {
        assert!(is_jpeg(Path::new("a.jpg")));
        assert!(is_jpeg(Path::new("a.JPG")));
        assert!(is_jpeg(Path::new("a.jpeg")));
        assert!(!is_jpeg(Path::new("a.png")));
        assert!(!is_jpeg(Path::new("a")));
    }

    #[test]
    fn output_file_creates_directory() {
        let dir = scratch_dir("outfile").join("nested");
        let path = output_file(&dir, Path::new("photos/cat.jpg"), "_face_0", "jpg").unwrap();
        assert!(dir.is_dir());
        assert_eq!(path, dir.join("cat_face_0.jpg"));
        fs::remove_dir_all(dir.parent().unwrap()).ok();
    }

    #[test]
    fn process_image_writes_requested_outputs() {
        let dir = scratch_dir("single");
        let input = dir.join("cat.jpg");
        RgbImage::new(64, 64).save(&input).unwrap();

        let mut detector = Detector::new(OneBoxLocator, GridPredictor);
        let options = DetectOptions {
            output_dir: dir.clone(),
            save_chip: true,
            annotate_faces: true,
            annotate_landmarks: true,
            ..DetectOptions::default()
        };

        let report = process_image(&mut detector, &input, &options).unwrap();
        assert_eq!(report.faces.len(), 1);
        assert!(dir.join("cat_face_0.jpg").is_file());
        assert!(dir.join("cat_annotated.jpg").is_file());

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn corrupt_file_does_not_abort_the_batch() {
        let dir = scratch_dir("batch");
        RgbImage::new(32, 32).save(dir.join("good.jpg")).unwrap();
        fs::write(dir.join("broken.jpg"), b"not actually a jpeg").unwrap();
        fs::write(dir.join("ignored.txt"), b"skipped entirely").unwrap();

        let mut detector = Detector::new(OneBoxLocator, GridPredictor);
        let options = DetectOptions {
            output_dir: dir.clone(),
            ..DetectOptions::default()
        };

        let summary = process_folder(&mut detector, &dir, &options).unwrap();
        assert_eq!(summary.reports.len(), 1);
        assert_eq!(summary.failures.len(), 1);
        assert!(summary.failures[0].0.ends_with("broken.jpg"));

        fs::remove_dir_all(dir).ok();
    }
}
