//! Dataset path configuration for the training-data tooling.
//!
//! The paths travel as an explicit value through every operation that needs
//! them; nothing here is process-global.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::landmark::Landmark;

/// Where the training, validation and testing dataset XML files live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetPaths {
    /// Directory holding the dataset files and images.
    pub data_dir: PathBuf,
    /// Training dataset file name, relative to `data_dir`.
    pub training_xml: String,
    /// Validation dataset file name, relative to `data_dir`.
    pub validation_xml: String,
    /// Testing dataset file name, relative to `data_dir`.
    pub testing_xml: String,
}

impl Default for DatasetPaths {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            training_xml: "training.xml".to_string(),
            validation_xml: "validation.xml".to_string(),
            testing_xml: "testing.xml".to_string(),
        }
    }
}

impl DatasetPaths {
    /// Load the paths from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Serialization(format!("failed to parse config: {}", e)))
    }

    pub fn training_path(&self) -> PathBuf {
        self.data_dir.join(&self.training_xml)
    }

    pub fn validation_path(&self) -> PathBuf {
        self.data_dir.join(&self.validation_xml)
    }

    pub fn testing_path(&self) -> PathBuf {
        self.data_dir.join(&self.testing_xml)
    }

    /// The imglab invocation for hand-correcting the training dataset, with
    /// the canonical part names.
    pub fn imglab_command(&self) -> String {
        let parts: Vec<&str> = Landmark::ALL.iter().map(|l| l.part_name()).collect();
        format!(
            "imglab {} --parts \"{}\"",
            self.training_path().display(),
            parts.join(" ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_into_data_dir() {
        let paths = DatasetPaths::default();
        assert_eq!(paths.training_path(), PathBuf::from("data/training.xml"));
        assert_eq!(paths.validation_path(), PathBuf::from("data/validation.xml"));
        assert_eq!(paths.testing_path(), PathBuf::from("data/testing.xml"));
    }

    #[test]
    fn imglab_command_lists_all_parts_in_order() {
        let command = DatasetPaths::default().imglab_command();
        assert!(command.starts_with("imglab data/training.xml --parts \"LEFT_EYE "));
        assert!(command.ends_with("RIGHT_OF_RIGHT_EAR\""));
    }

    #[test]
    fn partial_config_files_fall_back_to_defaults() {
        let path = std::env::temp_dir().join("catfd_paths_test.json");
        std::fs::write(&path, r#"{"data_dir": "elsewhere"}"#).unwrap();

        let paths = DatasetPaths::from_file(&path).unwrap();
        assert_eq!(paths.data_dir, PathBuf::from("elsewhere"));
        assert_eq!(paths.training_xml, "training.xml");

        std::fs::remove_file(path).ok();
    }
}
