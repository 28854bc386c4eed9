//! Ensemble-of-regression-trees landmark predictor.
//!
//! This is the cascade from "One Millisecond Face Alignment with an Ensemble
//! of Regression Trees" (Kazemi & Sullivan, 2014), evaluated the same way
//! dlib's `shape_predictor` evaluates it so that dlib's trained models can be
//! used unchanged (see [`crate::dlib`]).
//!
//! Shapes are kept in normalized face-box coordinates while the cascade runs
//! and mapped into the image only at the end.

use image::{GrayImage, RgbImage};

use crate::error::{Error, Result};
use crate::geometry::{Point, Rect, Shape};
use crate::tree::RegressionTree;

/// Read access to pixel intensities.
pub trait ImageAccess {
    /// Intensity at (x, y), or `None` outside the image.
    fn intensity(&self, x: i32, y: i32) -> Option<u8>;
}

impl ImageAccess for GrayImage {
    fn intensity(&self, x: i32, y: i32) -> Option<u8> {
        if x < 0 || y < 0 {
            return None;
        }
        self.get_pixel_checked(x as u32, y as u32).map(|p| p[0])
    }
}

/// RGB intensity is the integer mean of the three channels.
impl ImageAccess for RgbImage {
    fn intensity(&self, x: i32, y: i32) -> Option<u8> {
        if x < 0 || y < 0 {
            return None;
        }
        self.get_pixel_checked(x as u32, y as u32).map(|p| {
            let [r, g, b] = p.0;
            ((u16::from(r) + u16::from(g) + u16::from(b)) / 3) as u8
        })
    }
}

/// The linear part of a similarity transform: rotation plus uniform scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityTransform {
    /// `scale * cos(theta)`
    pub a: f32,
    /// `scale * sin(theta)`
    pub b: f32,
}

impl SimilarityTransform {
    pub const IDENTITY: Self = Self { a: 1.0, b: 0.0 };

    /// Least-squares rotation and scale taking `from` onto `to`, both
    /// centred on their means. Translation is dropped.
    pub fn between(from: &Shape, to: &Shape) -> Self {
        debug_assert_eq!(from.num_landmarks(), to.num_landmarks());
        if from.num_landmarks() < 2 {
            return Self::IDENTITY;
        }

        let from_mean = from.mean();
        let to_mean = to.mean();

        let (mut dot, mut cross, mut norm) = (0.0f32, 0.0f32, 0.0f32);
        for (f, t) in from.points.iter().zip(&to.points) {
            let f = *f - from_mean;
            let t = *t - to_mean;
            dot += f.x * t.x + f.y * t.y;
            cross += f.x * t.y - f.y * t.x;
            norm += f.x * f.x + f.y * f.y;
        }

        if norm <= f32::EPSILON {
            return Self::IDENTITY;
        }
        Self {
            a: dot / norm,
            b: cross / norm,
        }
    }

    pub fn apply(&self, p: Point) -> Point {
        Point::new(self.a * p.x - self.b * p.y, self.b * p.x + self.a * p.y)
    }
}

/// One cascade level: where to sample pixels and the trees that consume them.
#[derive(Debug, Clone)]
pub struct Stage {
    /// Landmark each feature pixel is attached to.
    pub anchors: Vec<u16>,
    /// Offset from the anchor, in normalized coordinates.
    pub offsets: Vec<Point>,
    pub forest: Vec<RegressionTree>,
}

impl Stage {
    fn sample_features<I: ImageAccess>(
        &self,
        image: &I,
        face: &Rect,
        current: &Shape,
        tform: SimilarityTransform,
    ) -> Vec<f32> {
        self.anchors
            .iter()
            .zip(&self.offsets)
            .map(|(&anchor, &offset)| {
                let normalized = tform.apply(offset) + current[anchor as usize];
                let p = face.denormalize_point(normalized).to_pixel();
                image.intensity(p.x, p.y).map_or(0.0, f32::from)
            })
            .collect()
    }
}

/// A trained cascade of tree ensembles.
#[derive(Debug, Clone)]
pub struct ShapePredictor {
    /// Starting estimate in normalized [0,1] face-box coordinates.
    initial_shape: Shape,
    stages: Vec<Stage>,
}

impl ShapePredictor {
    /// Assemble a predictor, checking that every index it will follow at
    /// prediction time is in range.
    pub fn new(initial_shape: Shape, stages: Vec<Stage>) -> Result<Self> {
        let num_landmarks = initial_shape.num_landmarks();
        if num_landmarks == 0 {
            return Err(Error::InvalidModel("initial shape is empty".into()));
        }

        for (level, stage) in stages.iter().enumerate() {
            if stage.anchors.len() != stage.offsets.len() {
                return Err(Error::InvalidModel(format!(
                    "stage {level}: {} anchors but {} offsets",
                    stage.anchors.len(),
                    stage.offsets.len()
                )));
            }
            if let Some(&bad) = stage
                .anchors
                .iter()
                .find(|&&a| a as usize >= num_landmarks)
            {
                return Err(Error::InvalidModel(format!(
                    "stage {level}: anchor {bad} out of range for {num_landmarks} landmarks"
                )));
            }
            let num_features = stage.anchors.len();
            for tree in &stage.forest {
                let out_of_range = tree.splits().iter().any(|s| {
                    s.idx1 as usize >= num_features || s.idx2 as usize >= num_features
                });
                if out_of_range {
                    return Err(Error::InvalidModel(format!(
                        "stage {level}: split feature index past {num_features} features"
                    )));
                }
            }
        }

        Ok(Self {
            initial_shape,
            stages,
        })
    }

    pub fn num_landmarks(&self) -> usize {
        self.initial_shape.num_landmarks()
    }

    pub fn num_cascade_stages(&self) -> usize {
        self.stages.len()
    }

    /// Predict landmark positions, in image coordinates, for the face in `face`.
    pub fn predict<I: ImageAccess>(&self, image: &I, face: &Rect) -> Shape {
        let mut current = self.initial_shape.clone();

        for stage in &self.stages {
            let tform = SimilarityTransform::between(&self.initial_shape, &current);
            let features = stage.sample_features(image, face, &current, tform);
            for tree in &stage.forest {
                current.add_delta(tree.predict(&features));
            }
        }

        Shape::new(
            current
                .points
                .iter()
                .map(|p| face.denormalize_point(*p))
                .collect(),
        )
    }
}
