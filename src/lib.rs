//! # browmark
//!
//! Live facial landmark overlay for a webcam feed.
//!
//! Each frame goes through the same short pipeline:
//!
//! 1. A [`FaceLocator`] finds faces; the largest one is kept.
//! 2. A [`LandmarkEstimator`] places the 68 iBUG landmarks on it.
//! 3. The jaw line and both brows are outlined, and a sprite is blended
//!    onto the forehead, sized from the distance between the brows.
//!
//! The default estimator is a pure Rust ensemble-of-regression-trees
//! predictor that reads dlib's `shape_predictor_68_face_landmarks.dat`
//! directly; the default locator is rustface's SeetaFace detector.
//!
//! ## Example
//!
//! ```rust
//! use browmark::{FaceLocator, FaceRect, LandmarkEstimator, Landmarks, Pipeline, Rect, Result};
//! use image::RgbImage;
//!
//! struct OneFace;
//! impl FaceLocator for OneFace {
//!     fn locate_faces(&mut self, _frame: &RgbImage) -> Vec<FaceRect> {
//!         vec![FaceRect::new(40, 60, 140, 160)]
//!     }
//! }
//!
//! struct MeanFace;
//! impl LandmarkEstimator for MeanFace {
//!     fn estimate_landmarks(&self, _frame: &RgbImage, face: &Rect) -> Result<Landmarks> {
//!         Ok(Landmarks::reference_in(face))
//!     }
//! }
//!
//! let sprite = RgbImage::from_pixel(16, 16, image::Rgb([90, 60, 20]));
//! let mut pipeline = Pipeline::new(OneFace, MeanFace, sprite);
//!
//! let mut frame = RgbImage::new(200, 200);
//! let report = pipeline.process(&mut frame).unwrap();
//! println!("{:?}", report);
//! ```

#[cfg(feature = "webcam")]
pub mod camera;
pub mod config;
pub mod dlib;
mod error;
mod geometry;
pub mod landmarks;
mod locator;
pub mod overlay;
mod pipeline;
mod predictor;
mod tree;

pub use config::{Config, DetectorConfig};
pub use error::{Error, Result};
pub use geometry::{FaceRect, PixelPoint, Point, Rect, Shape};
pub use landmarks::Landmarks;
pub use locator::{
    load_landmark_model, primary_face, FaceLocator, LandmarkEstimator, SeetaFaceLocator,
};
pub use pipeline::{scale_frame, FrameReport, FrameSource, Pipeline, Session};
pub use predictor::{ImageAccess, ShapePredictor, SimilarityTransform, Stage};
pub use tree::{RegressionTree, Split};
