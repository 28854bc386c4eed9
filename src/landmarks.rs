//! The 68-point iBUG landmark layout.

use std::ops::RangeInclusive;

use crate::error::{Error, Result};
use crate::geometry::{PixelPoint, Point, Rect, Shape};

pub const NUM_LANDMARKS: usize = 68;

pub const JAW: RangeInclusive<usize> = 0..=16;
pub const RIGHT_EYEBROW: RangeInclusive<usize> = 17..=21;
pub const LEFT_EYEBROW: RangeInclusive<usize> = 22..=26;
pub const NOSE: RangeInclusive<usize> = 27..=35;
pub const RIGHT_EYE: RangeInclusive<usize> = 36..=41;
pub const LEFT_EYE: RangeInclusive<usize> = 42..=47;
pub const OUTER_LIP: RangeInclusive<usize> = 48..=59;
pub const INNER_LIP: RangeInclusive<usize> = 60..=67;

/// Outer end of the subject's right eyebrow (left side of the image).
pub const RIGHT_BROW_OUTER: usize = 17;
/// Inner end of the subject's left eyebrow.
pub const LEFT_BROW_INNER: usize = 22;

/// Exactly 68 integer landmark positions in image coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Landmarks {
    points: [PixelPoint; NUM_LANDMARKS],
}

impl Landmarks {
    pub fn new(points: [PixelPoint; NUM_LANDMARKS]) -> Self {
        Self { points }
    }

    /// Round a predicted shape to pixels. Fails unless it has 68 points.
    pub fn from_shape(shape: &Shape) -> Result<Self> {
        if shape.num_landmarks() != NUM_LANDMARKS {
            return Err(Error::LandmarkCount(shape.num_landmarks()));
        }
        let mut points = [PixelPoint::default(); NUM_LANDMARKS];
        for (dst, src) in points.iter_mut().zip(&shape.points) {
            *dst = src.to_pixel();
        }
        Ok(Self { points })
    }

    /// The reference face layout scaled into `face`.
    pub fn reference_in(face: &Rect) -> Self {
        let mut points = [PixelPoint::default(); NUM_LANDMARKS];
        for (dst, &(x, y)) in points.iter_mut().zip(REFERENCE_68.iter()) {
            *dst = face.denormalize_point(Point::new(x, y)).to_pixel();
        }
        Self { points }
    }

    pub fn get(&self, index: usize) -> Result<PixelPoint> {
        self.points
            .get(index)
            .copied()
            .ok_or(Error::LandmarkIndex {
                index,
                len: NUM_LANDMARKS,
            })
    }

    pub fn points(&self) -> &[PixelPoint; NUM_LANDMARKS] {
        &self.points
    }

    /// Replace one point, e.g. to build synthetic faces.
    pub fn with_point(mut self, index: usize, point: PixelPoint) -> Result<Self> {
        let slot = self.points.get_mut(index).ok_or(Error::LandmarkIndex {
            index,
            len: NUM_LANDMARKS,
        })?;
        *slot = point;
        Ok(self)
    }
}

impl std::ops::Index<usize> for Landmarks {
    type Output = PixelPoint;

    fn index(&self, idx: usize) -> &Self::Output {
        &self.points[idx]
    }
}

/// Approximate mean positions of the iBUG-68 points in a unit face box.
#[rustfmt::skip]
const REFERENCE_68: [(f32, f32); NUM_LANDMARKS] = [
    // jaw
    (0.10, 0.35), (0.11, 0.45), (0.12, 0.55), (0.14, 0.65), (0.18, 0.73),
    (0.24, 0.80), (0.32, 0.85), (0.41, 0.88), (0.50, 0.89), (0.59, 0.88),
    (0.68, 0.85), (0.76, 0.80), (0.82, 0.73), (0.86, 0.65), (0.88, 0.55),
    (0.89, 0.45), (0.90, 0.35),
    // brows
    (0.20, 0.26), (0.25, 0.22), (0.32, 0.21), (0.38, 0.23), (0.43, 0.27),
    (0.57, 0.27), (0.62, 0.23), (0.68, 0.21), (0.75, 0.22), (0.80, 0.26),
    // nose
    (0.50, 0.32), (0.50, 0.40), (0.50, 0.48), (0.50, 0.55),
    (0.40, 0.58), (0.45, 0.60), (0.50, 0.62), (0.55, 0.60), (0.60, 0.58),
    // eyes
    (0.24, 0.32), (0.28, 0.29), (0.34, 0.29), (0.38, 0.33), (0.34, 0.35), (0.28, 0.35),
    (0.62, 0.33), (0.66, 0.29), (0.72, 0.29), (0.76, 0.32), (0.72, 0.35), (0.66, 0.35),
    // lips
    (0.32, 0.72), (0.38, 0.68), (0.44, 0.66), (0.50, 0.67), (0.56, 0.66), (0.62, 0.68),
    (0.68, 0.72), (0.62, 0.78), (0.56, 0.80), (0.50, 0.81), (0.44, 0.80), (0.38, 0.78),
    (0.36, 0.72), (0.44, 0.70), (0.50, 0.70), (0.56, 0.70), (0.64, 0.72), (0.56, 0.74),
    (0.50, 0.75), (0.44, 0.74),
];
