//! Face detection and landmark estimation behind trait seams.
//!
//! The pipeline only sees [`FaceLocator`] and [`LandmarkEstimator`]; the
//! default bindings are rustface's SeetaFace detector and the dlib-format
//! [`ShapePredictor`].

use std::path::Path;

use image::imageops;
use image::RgbImage;
use rustface::{Detector, ImageData};
use tracing::debug;

use crate::config::DetectorConfig;
use crate::error::{Error, Result};
use crate::geometry::{FaceRect, Rect};
use crate::landmarks::{Landmarks, NUM_LANDMARKS};
use crate::predictor::ShapePredictor;

/// Finds faces in a frame.
pub trait FaceLocator {
    /// Zero or more face rectangles, in no particular order.
    fn locate_faces(&mut self, frame: &RgbImage) -> Vec<FaceRect>;
}

/// Places the 68 landmarks for one face.
pub trait LandmarkEstimator {
    fn estimate_landmarks(&self, frame: &RgbImage, face: &Rect) -> Result<Landmarks>;
}

/// Pick one face out of many: the largest, then the leftmost, then the
/// topmost.
pub fn primary_face(faces: &[FaceRect]) -> Option<FaceRect> {
    faces
        .iter()
        .copied()
        .min_by_key(|f| (std::cmp::Reverse(f.area()), f.left, f.top))
}

impl LandmarkEstimator for ShapePredictor {
    fn estimate_landmarks(&self, frame: &RgbImage, face: &Rect) -> Result<Landmarks> {
        Landmarks::from_shape(&self.predict(frame, face))
    }
}

/// Load a 68-point predictor, refusing models with any other layout.
pub fn load_landmark_model<P: AsRef<Path>>(path: P) -> Result<ShapePredictor> {
    let model = crate::dlib::load_dlib_model(path)?;
    if model.num_landmarks() != NUM_LANDMARKS {
        return Err(Error::InvalidModel(format!(
            "model predicts {} landmarks, expected {}",
            model.num_landmarks(),
            NUM_LANDMARKS
        )));
    }
    Ok(model)
}

/// SeetaFace frontal detector from the rustface crate.
pub struct SeetaFaceLocator {
    detector: Box<dyn Detector>,
}

impl SeetaFaceLocator {
    pub fn load<P: AsRef<Path>>(path: P, config: &DetectorConfig) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path
            .to_str()
            .ok_or_else(|| Error::Detector(format!("invalid detector path {:?}", path)))?;
        let mut detector = rustface::create_detector(path_str)
            .map_err(|e| Error::Detector(format!("failed to load {}: {}", path.display(), e)))?;

        detector.set_min_face_size(config.min_face_size);
        detector.set_score_thresh(config.score_thresh);
        detector.set_pyramid_scale_factor(config.pyramid_scale_factor);
        detector.set_slide_window_step(config.window_step, config.window_step);

        Ok(Self { detector })
    }
}

impl FaceLocator for SeetaFaceLocator {
    fn locate_faces(&mut self, frame: &RgbImage) -> Vec<FaceRect> {
        let gray = imageops::grayscale(frame);
        let (width, height) = gray.dimensions();
        let faces = self.detector.detect(&ImageData::new(gray.as_raw(), width, height));

        debug!(count = faces.len(), "faces located");
        faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                FaceRect::new(
                    bbox.x(),
                    bbox.y(),
                    bbox.x() + bbox.width() as i32,
                    bbox.y() + bbox.height() as i32,
                )
            })
            .collect()
    }
}
