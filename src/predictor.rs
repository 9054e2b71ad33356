//! Cascade shape regression for the 9 cat facial landmarks.
//!
//! A trained model is a mean shape plus a cascade of regression-tree
//! stages. Prediction starts from the mean shape scaled into the face box
//! and lets each stage nudge the shape by a sum of tree deltas, where every
//! tree split compares a pixel intensity difference against a threshold.
//! Models are produced offline by the external trainer and stored as
//! bincode files.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::detector::{GrayFrame, LandmarkPredictor};
use crate::error::{Error, Result};
use crate::landmark::LANDMARK_COUNT;
use crate::types::{BoundingBox, Point};

/// One (x, y) pair per landmark. Normalized to the face box in the mean
/// shape and in tree deltas; image coordinates during prediction.
pub type Shape = Vec<(f32, f32)>;

/// A split feature: the intensity difference between two probe pixels, each
/// anchored at a landmark plus a box-relative offset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SplitFeature {
    pub anchor1: u8,
    pub offset1: (f32, f32),
    pub anchor2: u8,
    pub offset2: (f32, f32),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    Split {
        feature: SplitFeature,
        threshold: f32,
        left: u32,
        right: u32,
    },
    Leaf {
        delta: Shape,
    },
}

/// A single regression tree. Node 0 is the root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    /// Walk to a leaf and return its delta. Splits go left when the feature
    /// value exceeds the threshold; trained models depend on this
    /// orientation.
    fn walk<F>(&self, get_feature: &F) -> &Shape
    where
        F: Fn(&SplitFeature) -> f32,
    {
        let mut index = 0usize;
        loop {
            match &self.nodes[index] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if get_feature(feature) > *threshold {
                        *left as usize
                    } else {
                        *right as usize
                    };
                }
                TreeNode::Leaf { delta } => return delta,
            }
        }
    }
}

/// One cascade stage: a forest whose per-tree deltas are summed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadeStage {
    pub trees: Vec<RegressionTree>,
}

impl CascadeStage {
    fn delta<F>(&self, get_feature: F) -> Shape
    where
        F: Fn(&SplitFeature) -> f32,
    {
        let mut total = vec![(0.0f32, 0.0f32); LANDMARK_COUNT];
        for tree in &self.trees {
            for (sum, d) in total.iter_mut().zip(tree.walk(&get_feature)) {
                sum.0 += d.0;
                sum.1 += d.1;
            }
        }
        total
    }
}

/// A trained cat landmark predictor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadePredictor {
    mean_shape: Shape,
    stages: Vec<CascadeStage>,
}

impl CascadePredictor {
    pub fn new(mean_shape: Shape, stages: Vec<CascadeStage>) -> Result<Self> {
        let predictor = Self { mean_shape, stages };
        predictor.validate()?;
        Ok(predictor)
    }

    /// Load a model file, rejecting anything that does not carry exactly
    /// the 9-point scheme.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let mut bytes = Vec::new();
        BufReader::new(file).read_to_end(&mut bytes)?;
        let predictor: Self = bincode::deserialize(&bytes)?;
        predictor.validate()?;
        Ok(predictor)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&bincode::serialize(self)?)?;
        Ok(())
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    fn validate(&self) -> Result<()> {
        if self.mean_shape.len() != LANDMARK_COUNT {
            return Err(Error::InvalidModel(format!(
                "mean shape has {} points, expected {}",
                self.mean_shape.len(),
                LANDMARK_COUNT
            )));
        }
        if self.stages.is_empty() {
            return Err(Error::InvalidModel("cascade has no stages".to_string()));
        }

        for (s, stage) in self.stages.iter().enumerate() {
            for tree in &stage.trees {
                for node in &tree.nodes {
                    match node {
                        TreeNode::Leaf { delta } => {
                            if delta.len() != LANDMARK_COUNT {
                                return Err(Error::InvalidModel(format!(
                                    "stage {} leaf delta has {} points, expected {}",
                                    s,
                                    delta.len(),
                                    LANDMARK_COUNT
                                )));
                            }
                        }
                        TreeNode::Split {
                            feature,
                            left,
                            right,
                            ..
                        } => {
                            let nodes = tree.nodes.len() as u32;
                            if *left >= nodes || *right >= nodes {
                                return Err(Error::InvalidModel(format!(
                                    "stage {} split points past the node table",
                                    s
                                )));
                            }
                            if feature.anchor1 as usize >= LANDMARK_COUNT
                                || feature.anchor2 as usize >= LANDMARK_COUNT
                            {
                                return Err(Error::InvalidModel(format!(
                                    "stage {} feature anchors an unknown landmark",
                                    s
                                )));
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

impl LandmarkPredictor for CascadePredictor {
    fn predict(&self, frame: &GrayFrame, bounds: &BoundingBox) -> [Point; LANDMARK_COUNT] {
        let box_w = bounds.width as f32;
        let box_h = bounds.height as f32;

        // Mean shape scaled into the face box.
        let mut shape: Shape = self
            .mean_shape
            .iter()
            .map(|&(nx, ny)| (bounds.left as f32 + nx * box_w, bounds.top as f32 + ny * box_h))
            .collect();

        for stage in &self.stages {
            let delta = stage.delta(|feature| feature_value(feature, &shape, bounds, frame));
            for (point, d) in shape.iter_mut().zip(delta) {
                point.0 += d.0 * box_w;
                point.1 += d.1 * box_h;
            }
        }

        let mut landmarks = [Point::new(0, 0); LANDMARK_COUNT];
        for (slot, &(x, y)) in landmarks.iter_mut().zip(shape.iter()) {
            *slot = Point::new(x.round() as i32, y.round() as i32);
        }
        landmarks
    }
}

/// Intensity difference between a feature's two probe pixels.
fn feature_value(
    feature: &SplitFeature,
    shape: &Shape,
    bounds: &BoundingBox,
    frame: &GrayFrame,
) -> f32 {
    let (a1x, a1y) = shape[feature.anchor1 as usize];
    let (a2x, a2y) = shape[feature.anchor2 as usize];

    let p1x = a1x + feature.offset1.0 * bounds.width as f32;
    let p1y = a1y + feature.offset1.1 * bounds.height as f32;
    let p2x = a2x + feature.offset2.0 * bounds.width as f32;
    let p2y = a2y + feature.offset2.1 * bounds.height as f32;

    sample_bilinear(frame, p1x, p1y) - sample_bilinear(frame, p2x, p2y)
}

/// Bilinear sub-pixel sampling.
fn sample_bilinear(frame: &GrayFrame, x: f32, y: f32) -> f32 {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = frame.get(x0, y0) as f32;
    let p10 = frame.get(x0 + 1, y0) as f32;
    let p01 = frame.get(x0, y0 + 1) as f32;
    let p11 = frame.get(x0 + 1, y0 + 1) as f32;

    let top = p00 * (1.0 - fx) + p10 * fx;
    let bottom = p01 * (1.0 - fx) + p11 * fx;
    top * (1.0 - fy) + bottom * fy
}

/// A plausible resting cat face in normalized box coordinates: eyes up
/// front, mouth below, ear chains above. Trained models replace this; it
/// anchors tests and freshly initialized cascades.
pub fn cat_mean_shape() -> Shape {
    vec![
        (0.30, 0.55), // left eye
        (0.70, 0.55), // right eye
        (0.50, 0.82), // mouth
        (0.05, 0.30), // left of left ear
        (0.18, 0.02), // tip of left ear
        (0.35, 0.20), // right of left ear
        (0.65, 0.20), // left of right ear
        (0.82, 0.02), // tip of right ear
        (0.95, 0.30), // right of right ear
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zero_delta_predictor() -> CascadePredictor {
        let tree = RegressionTree {
            nodes: vec![TreeNode::Leaf {
                delta: vec![(0.0, 0.0); LANDMARK_COUNT],
            }],
        };
        CascadePredictor::new(cat_mean_shape(), vec![CascadeStage { trees: vec![tree] }]).unwrap()
    }

    #[test]
    fn zero_cascade_lands_on_scaled_mean_shape() {
        let predictor = zero_delta_predictor();
        let frame = GrayFrame::from_fn(200, 200, |_, _| 128);
        let bounds = BoundingBox::new(50, 50, 100, 100);

        let landmarks = predictor.predict(&frame, &bounds);

        // left eye: (0.30, 0.55) in a 100x100 box at (50, 50)
        assert_eq!(landmarks[0], Point::new(80, 105));
        // mouth: (0.50, 0.82)
        assert_eq!(landmarks[2], Point::new(100, 132));
        for point in landmarks {
            assert!(point.x >= bounds.left && point.x <= bounds.right());
            assert!(point.y >= bounds.top && point.y <= bounds.bottom());
        }
    }

    #[test]
    fn splits_follow_intensity_differences() {
        // One split: probe landmark 0 against landmark 1 with no offsets.
        // Left leaf pulls everything up-left, right leaf down-right.
        let feature = SplitFeature {
            anchor1: 0,
            offset1: (0.0, 0.0),
            anchor2: 1,
            offset2: (0.0, 0.0),
        };
        let tree = RegressionTree {
            nodes: vec![
                TreeNode::Split {
                    feature,
                    threshold: 0.0,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf {
                    delta: vec![(-0.1, -0.1); LANDMARK_COUNT],
                },
                TreeNode::Leaf {
                    delta: vec![(0.1, 0.1); LANDMARK_COUNT],
                },
            ],
        };
        let predictor =
            CascadePredictor::new(cat_mean_shape(), vec![CascadeStage { trees: vec![tree] }])
                .unwrap();
        let bounds = BoundingBox::new(0, 0, 100, 100);

        // Bright on the left half: landmark 0 probe brighter than landmark 1,
        // difference positive, go left.
        let bright_left = GrayFrame::from_fn(100, 100, |x, _| if x < 50 { 200 } else { 10 });
        let zero = zero_delta_predictor().predict(&bright_left, &bounds);
        let shifted = predictor.predict(&bright_left, &bounds);
        assert_eq!(shifted[2], Point::new(zero[2].x - 10, zero[2].y - 10));

        // Bright on the right half: difference negative, go right.
        let bright_right = GrayFrame::from_fn(100, 100, |x, _| if x < 50 { 10 } else { 200 });
        let shifted = predictor.predict(&bright_right, &bounds);
        assert_eq!(shifted[2], Point::new(zero[2].x + 10, zero[2].y + 10));
    }

    #[test]
    fn stage_sums_tree_deltas() {
        let leaf = |dx: f32, dy: f32| RegressionTree {
            nodes: vec![TreeNode::Leaf {
                delta: vec![(dx, dy); LANDMARK_COUNT],
            }],
        };
        let stage = CascadeStage {
            trees: vec![leaf(0.1, 0.2), leaf(0.3, 0.4)],
        };
        let delta = stage.delta(|_| 0.0);
        assert!((delta[0].0 - 0.4).abs() < 1e-6);
        assert!((delta[0].1 - 0.6).abs() < 1e-6);
    }

    #[test]
    fn wrong_landmark_count_is_rejected() {
        let tree = RegressionTree {
            nodes: vec![TreeNode::Leaf {
                delta: vec![(0.0, 0.0); 5],
            }],
        };
        let result = CascadePredictor::new(cat_mean_shape(), vec![CascadeStage { trees: vec![tree] }]);
        assert!(matches!(result, Err(Error::InvalidModel(_))));

        let result = CascadePredictor::new(vec![(0.5, 0.5); 5], Vec::new());
        assert!(matches!(result, Err(Error::InvalidModel(_))));
    }

    #[test]
    fn save_and_load_round_trip() {
        let predictor = zero_delta_predictor();
        let path = std::env::temp_dir().join("catfd_predictor_test.bin");
        predictor.save(&path).unwrap();

        let loaded = CascadePredictor::load(&path).unwrap();
        assert_eq!(loaded.stage_count(), predictor.stage_count());

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn bilinear_sampling_interpolates() {
        let frame = GrayFrame::new(vec![0, 100, 200, 50], 2, 2);
        assert!((sample_bilinear(&frame, 0.0, 0.0) - 0.0).abs() < 0.01);
        assert!((sample_bilinear(&frame, 1.0, 0.0) - 100.0).abs() < 0.01);
        assert!((sample_bilinear(&frame, 0.5, 0.5) - 87.5).abs() < 0.01);
    }
}
