use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Dataset XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Model deserialization error: {0}")]
    ModelFormat(#[from] bincode::Error),

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Detector error: {0}")]
    Detector(String),

    #[error("Malformed annotation: {0}")]
    MalformedAnnotation(String),

    #[error("Invalid point set: expected {expected} landmarks, got {got}")]
    InvalidPointSet { expected: usize, got: usize },

    #[error("Dataset serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, Error>;
