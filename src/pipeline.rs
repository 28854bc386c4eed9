//! One pass per frame: locate, estimate, draw.

use image::imageops::{self, FilterType};
use image::RgbImage;
use tracing::{debug, warn};

use crate::error::Result;
use crate::geometry::FaceRect;
use crate::locator::{primary_face, FaceLocator, LandmarkEstimator};
use crate::overlay::{draw_exterior_outline, render_sprite_on_forehead, OUTLINE_END, OUTLINE_START};

/// Produces frames for the loop.
pub trait FrameSource {
    /// The latest frame, or `None` when this one was dropped.
    fn next_frame(&mut self) -> Option<RgbImage>;
}

/// What happened to a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameReport {
    /// Nothing was found; the frame is untouched.
    NoFace,
    /// The outline was drawn; the sprite too unless the brows were degenerate.
    Decorated { face: FaceRect, sprite_drawn: bool },
}

/// Locator, estimator and sprite, loaded once and reused for every frame.
pub struct Pipeline<L, E> {
    locator: L,
    estimator: E,
    sprite: RgbImage,
}

impl<L: FaceLocator, E: LandmarkEstimator> Pipeline<L, E> {
    pub fn new(locator: L, estimator: E, sprite: RgbImage) -> Self {
        Self {
            locator,
            estimator,
            sprite,
        }
    }

    /// Decorate `frame` in place for the primary face, if any.
    ///
    /// On error the frame has not been drawn on.
    pub fn process(&mut self, frame: &mut RgbImage) -> Result<FrameReport> {
        let faces = self.locator.locate_faces(frame);
        let Some(face) = primary_face(&faces) else {
            return Ok(FrameReport::NoFace);
        };

        let rect = face.to_rect();
        if rect.is_empty() {
            debug!(?face, "ignoring empty face rectangle");
            return Ok(FrameReport::NoFace);
        }

        let landmarks = self.estimator.estimate_landmarks(frame, &rect)?;
        draw_exterior_outline(frame, &landmarks, OUTLINE_START, OUTLINE_END)?;
        let sprite_drawn = render_sprite_on_forehead(frame, &self.sprite, &landmarks);
        if !sprite_drawn {
            debug!(?face, "brows too close for the sprite");
        }

        Ok(FrameReport::Decorated { face, sprite_drawn })
    }
}

/// Resize by `scale`; exactly 1.0 (or a nonsensical factor) is a no-op.
pub fn scale_frame(frame: RgbImage, scale: f32) -> RgbImage {
    if scale == 1.0 || !scale.is_finite() || scale <= 0.0 {
        return frame;
    }
    let width = ((frame.width() as f32 * scale).round() as u32).max(1);
    let height = ((frame.height() as f32 * scale).round() as u32).max(1);
    imageops::resize(&frame, width, height, FilterType::Triangle)
}

/// A frame source driving a pipeline.
pub struct Session<S, L, E> {
    source: S,
    pipeline: Pipeline<L, E>,
    frame_scale: f32,
}

impl<S: FrameSource, L: FaceLocator, E: LandmarkEstimator> Session<S, L, E> {
    pub fn new(source: S, pipeline: Pipeline<L, E>, frame_scale: f32) -> Self {
        Self {
            source,
            pipeline,
            frame_scale,
        }
    }

    /// Run one iteration. `None` means the source had no frame this time.
    ///
    /// A frame whose landmarks cannot be used is returned undecorated rather
    /// than ending the loop.
    pub fn tick(&mut self) -> Option<(RgbImage, FrameReport)> {
        let frame = self.source.next_frame()?;
        let mut frame = scale_frame(frame, self.frame_scale);

        let report = self.pipeline.process(&mut frame).unwrap_or_else(|e| {
            warn!("skipping overlay: {}", e);
            FrameReport::NoFace
        });
        Some((frame, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::geometry::Rect;
    use crate::landmarks::Landmarks;
    use image::Rgb;

    struct FixedFaces(Vec<FaceRect>);

    impl FaceLocator for FixedFaces {
        fn locate_faces(&mut self, _frame: &RgbImage) -> Vec<FaceRect> {
            self.0.clone()
        }
    }

    struct Reference;

    impl LandmarkEstimator for Reference {
        fn estimate_landmarks(&self, _frame: &RgbImage, face: &Rect) -> Result<Landmarks> {
            Ok(Landmarks::reference_in(face))
        }
    }

    struct Broken;

    impl LandmarkEstimator for Broken {
        fn estimate_landmarks(&self, _frame: &RgbImage, _face: &Rect) -> Result<Landmarks> {
            Err(Error::LandmarkCount(5))
        }
    }

    struct Frames(Vec<Option<RgbImage>>);

    impl FrameSource for Frames {
        fn next_frame(&mut self) -> Option<RgbImage> {
            if self.0.is_empty() {
                None
            } else {
                self.0.remove(0)
            }
        }
    }

    fn sprite() -> RgbImage {
        RgbImage::from_pixel(6, 4, Rgb([120, 120, 120]))
    }

    #[test]
    fn no_face_leaves_frame_untouched() {
        let mut pipeline = Pipeline::new(FixedFaces(vec![]), Reference, sprite());
        let original = RgbImage::from_fn(64, 48, |x, y| Rgb([x as u8, y as u8, 7]));
        let mut frame = original.clone();

        assert_eq!(pipeline.process(&mut frame).unwrap(), FrameReport::NoFace);
        assert_eq!(frame, original);
    }

    #[test]
    fn face_is_decorated() {
        let face = FaceRect::new(40, 60, 140, 160);
        let mut pipeline = Pipeline::new(FixedFaces(vec![face]), Reference, sprite());
        let mut frame = RgbImage::new(200, 200);

        let report = pipeline.process(&mut frame).unwrap();
        assert_eq!(
            report,
            FrameReport::Decorated {
                face,
                sprite_drawn: true
            }
        );
        assert!(frame.pixels().any(|p| p.0 != [0, 0, 0]));
    }

    #[test]
    fn empty_face_rect_is_ignored() {
        let mut pipeline =
            Pipeline::new(FixedFaces(vec![FaceRect::new(10, 10, 10, 40)]), Reference, sprite());
        let mut frame = RgbImage::new(50, 50);
        assert_eq!(pipeline.process(&mut frame).unwrap(), FrameReport::NoFace);
    }

    #[test]
    fn estimator_failure_skips_the_frame() {
        let pipeline = Pipeline::new(FixedFaces(vec![FaceRect::new(0, 0, 30, 30)]), Broken, sprite());
        let original = RgbImage::from_pixel(40, 40, Rgb([1, 2, 3]));
        let mut session = Session::new(Frames(vec![Some(original.clone())]), pipeline, 1.0);

        let (frame, report) = session.tick().unwrap();
        assert_eq!(report, FrameReport::NoFace);
        assert_eq!(frame, original);
    }

    #[test]
    fn dropped_frame_yields_nothing() {
        let pipeline = Pipeline::new(FixedFaces(vec![]), Reference, sprite());
        let mut session = Session::new(
            Frames(vec![None, Some(RgbImage::new(8, 8))]),
            pipeline,
            1.0,
        );
        assert!(session.tick().is_none());
        assert!(session.tick().is_some());
    }

    #[test]
    fn scale_is_noop_at_one() {
        let frame = RgbImage::from_pixel(10, 6, Rgb([9, 9, 9]));
        assert_eq!(scale_frame(frame.clone(), 1.0), frame);
        assert_eq!(scale_frame(frame.clone(), 0.0), frame);
        assert_eq!(scale_frame(frame, 0.5).dimensions(), (5, 3));
    }
}
