//! The fixed 9-point cat facial landmark scheme.
//!
//! Every consumer of landmark data — shape-prediction output, drawing,
//! console/JSON reporting and the dataset XML part names — indexes points
//! through this one table, so a point's meaning never depends on which code
//! path produced it.

use serde::{Deserialize, Serialize};

/// Number of landmarks in the scheme.
pub const LANDMARK_COUNT: usize = 9;

/// A named cat facial landmark.
///
/// Declaration order is the canonical positional order: `LeftEye` is point 0
/// of a predicted shape, `RightOfRightEar` is point 8. Annotation strings and
/// dataset XML parts use the same order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Landmark {
    LeftEye,
    RightEye,
    Mouth,
    LeftOfLeftEar,
    TipOfLeftEar,
    RightOfLeftEar,
    LeftOfRightEar,
    TipOfRightEar,
    RightOfRightEar,
}

impl Landmark {
    /// All landmarks in canonical order.
    pub const ALL: [Landmark; LANDMARK_COUNT] = [
        Landmark::LeftEye,
        Landmark::RightEye,
        Landmark::Mouth,
        Landmark::LeftOfLeftEar,
        Landmark::TipOfLeftEar,
        Landmark::RightOfLeftEar,
        Landmark::LeftOfRightEar,
        Landmark::TipOfRightEar,
        Landmark::RightOfRightEar,
    ];

    /// Positional index of this landmark within a predicted shape (0–8).
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Landmark at the given positional index, or `None` if out of range.
    pub fn from_index(index: usize) -> Option<Landmark> {
        Self::ALL.get(index).copied()
    }

    /// Part name used in the dataset XML and the imglab `--parts` list.
    pub const fn part_name(self) -> &'static str {
        match self {
            Landmark::LeftEye => "LEFT_EYE",
            Landmark::RightEye => "RIGHT_EYE",
            Landmark::Mouth => "MOUTH",
            Landmark::LeftOfLeftEar => "LEFT_OF_LEFT_EAR",
            Landmark::TipOfLeftEar => "TIP_OF_LEFT_EAR",
            Landmark::RightOfLeftEar => "RIGHT_OF_LEFT_EAR",
            Landmark::LeftOfRightEar => "LEFT_OF_RIGHT_EAR",
            Landmark::TipOfRightEar => "TIP_OF_RIGHT_EAR",
            Landmark::RightOfRightEar => "RIGHT_OF_RIGHT_EAR",
        }
    }

    /// Landmark for a dataset XML part name, or `None` if unknown.
    pub fn from_part_name(name: &str) -> Option<Landmark> {
        Self::ALL.iter().copied().find(|l| l.part_name() == name)
    }

    /// Human-readable name used in console output and JSON landmark keys.
    pub const fn display_name(self) -> &'static str {
        match self {
            Landmark::LeftEye => "Left Eye",
            Landmark::RightEye => "Right Eye",
            Landmark::Mouth => "Mouth",
            Landmark::LeftOfLeftEar => "Left of Left Ear",
            Landmark::TipOfLeftEar => "Tip of Left Ear",
            Landmark::RightOfLeftEar => "Right of Left Ear",
            Landmark::LeftOfRightEar => "Left of Right Ear",
            Landmark::TipOfRightEar => "Tip of Right Ear",
            Landmark::RightOfRightEar => "Right of Right Ear",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn all_covers_indices_without_gaps() {
        let indices: Vec<usize> = Landmark::ALL.iter().map(|l| l.index()).collect();
        assert_eq!(indices, (0..LANDMARK_COUNT).collect::<Vec<_>>());

        let distinct: HashSet<usize> = indices.into_iter().collect();
        assert_eq!(distinct.len(), LANDMARK_COUNT);
    }

    #[test]
    fn index_round_trip() {
        for landmark in Landmark::ALL {
            assert_eq!(Landmark::from_index(landmark.index()), Some(landmark));
        }
        assert_eq!(Landmark::from_index(LANDMARK_COUNT), None);
    }

    #[test]
    fn part_name_round_trip() {
        for landmark in Landmark::ALL {
            assert_eq!(Landmark::from_part_name(landmark.part_name()), Some(landmark));
        }
        assert_eq!(Landmark::from_part_name("RIGHT_OF_RIGTH_EAR"), None);
        assert_eq!(Landmark::from_part_name("left_eye"), None);
    }

    #[test]
    fn eyes_and_mouth_lead_the_order() {
        assert_eq!(Landmark::LeftEye.index(), 0);
        assert_eq!(Landmark::RightEye.index(), 1);
        assert_eq!(Landmark::Mouth.index(), 2);
        assert_eq!(Landmark::RightOfRightEar.index(), 8);
    }
}
