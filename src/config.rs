//! Startup settings.
//!
//! The program takes no flags and reads no environment; everything here is
//! fixed at build time and handed around by reference.

use std::path::PathBuf;
use std::time::Duration;

/// Tuning for the SeetaFace detector.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    pub min_face_size: u32,
    pub score_thresh: f64,
    pub pyramid_scale_factor: f32,
    pub window_step: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_face_size: 20,
            score_thresh: 2.0,
            pyramid_scale_factor: 0.8,
            window_step: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// dlib 68-point shape predictor, `.dat` or `.dat.bz2`.
    pub landmark_model: PathBuf,
    /// SeetaFace frontal detector model for rustface.
    pub detector_model: PathBuf,
    pub sprite: PathBuf,
    pub camera_index: u32,
    /// Applied to every captured frame; 1.0 leaves frames untouched.
    pub frame_scale: f32,
    pub window_title: String,
    /// How long the window waits for a key before showing the next frame.
    pub key_poll_interval: Duration,
    pub detector: DetectorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            landmark_model: PathBuf::from("shape_predictor_68_face_landmarks.dat"),
            detector_model: PathBuf::from("seeta_fd_frontal_v1.0.bin"),
            sprite: PathBuf::from("turd.png"),
            camera_index: 0,
            frame_scale: 1.0,
            window_title: "w".to_string(),
            key_poll_interval: Duration::from_millis(30),
            detector: DetectorConfig::default(),
        }
    }
}
