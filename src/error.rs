use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Face detector error: {0}")]
    Detector(String),

    #[error("Camera error: {0}")]
    Camera(String),

    #[error("Landmark index {index} out of range for a {len}-point shape")]
    LandmarkIndex { index: usize, len: usize },

    #[error("Expected 68 landmarks, got {0}")]
    LandmarkCount(usize),

    #[error("Display error: {0}")]
    Gui(String),
}

pub type Result<T> = std::result::Result<T, Error>;
