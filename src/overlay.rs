//! In-place drawing on a frame: the jaw-and-brow outline and the forehead
//! sprite.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_antialiased_line_segment_mut;
use imageproc::pixelops::interpolate;

use crate::error::Result;
use crate::geometry::{PixelPoint, Rect};
use crate::landmarks::{Landmarks, JAW, LEFT_BROW_INNER, RIGHT_BROW_OUTER, RIGHT_EYEBROW};

/// Pure blue.
pub const OUTLINE_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
pub const OUTLINE_THICKNESS: i32 = 2;

/// Landmark range walked by the outline: whole jaw, then both brows.
pub const OUTLINE_START: usize = 0;
pub const OUTLINE_END: usize = 26;

pub const FRAME_WEIGHT: f32 = 1.0;
pub const SPRITE_WEIGHT: f32 = 0.8;

/// Sprite width relative to the brow span; height keeps a 3:2 aspect.
const SPRITE_SCALE: f64 = 1.5;

/// Vertices of the exterior outline.
///
/// Walks `start..=16` up the jaw, then `end` down to 17 along the brows.
/// With `(0, 26)` that is 27 points. If `start > 16` or `end < 17` the
/// corresponding half is empty.
pub fn exterior_outline(landmarks: &Landmarks, start: usize, end: usize) -> Result<Vec<PixelPoint>> {
    let jaw_end = *JAW.end();
    let brow_start = *RIGHT_EYEBROW.start();

    (start..=jaw_end)
        .chain((brow_start..=end).rev())
        .map(|i| landmarks.get(i))
        .collect()
}

/// Draw the exterior outline as a closed anti-aliased polyline.
pub fn draw_exterior_outline(frame: &mut RgbImage, landmarks: &Landmarks, start: usize, end: usize) -> Result<()> {
    let vertices = exterior_outline(landmarks, start, end)?;
    draw_closed_polyline(frame, &vertices, OUTLINE_COLOR, OUTLINE_THICKNESS);
    Ok(())
}

/// Joins consecutive vertices and the last back to the first.
pub fn draw_closed_polyline(frame: &mut RgbImage, vertices: &[PixelPoint], color: Rgb<u8>, thickness: i32) {
    let Some(&last) = vertices.last() else {
        return;
    };

    let mut prev = last;
    for &next in vertices {
        draw_thick_segment(frame, prev, next, color, thickness);
        prev = next;
    }
}

/// Thickness is built from parallel one-pixel strokes offset along the
/// segment's minor axis.
fn draw_thick_segment(frame: &mut RgbImage, a: PixelPoint, b: PixelPoint, color: Rgb<u8>, thickness: i32) {
    let steep = (b.y - a.y).abs() > (b.x - a.x).abs();
    let first = -(thickness - 1) / 2;

    for k in first..first + thickness.max(1) {
        let (dx, dy) = if steep { (k, 0) } else { (0, k) };
        draw_antialiased_line_segment_mut(
            frame,
            (a.x + dx, a.y + dy),
            (b.x + dx, b.y + dy),
            color,
            interpolate,
        );
    }
}

/// Where the sprite goes for this face, or `None` when the brows are too
/// close together to give it a positive size.
///
/// The rectangle sits on top of the subject's right outer brow point and
/// extends upward.
pub fn forehead_placement(landmarks: &Landmarks) -> Option<Rect> {
    let right = landmarks[RIGHT_BROW_OUTER];
    let left = landmarks[LEFT_BROW_INNER];

    let width = (SPRITE_SCALE * f64::from((left.x - right.x).abs())) as i32;
    let height = (f64::from(width) / SPRITE_SCALE).round() as i32;

    let rect = Rect::new(right.x, right.y - height, width, height);
    (!rect.is_empty()).then_some(rect)
}

/// `1.0 * dst + 0.8 * src`, rounded and saturated to `[0, 255]`.
pub fn blend_pixel(dst: u8, src: u8) -> u8 {
    let value = FRAME_WEIGHT * f32::from(dst) + SPRITE_WEIGHT * f32::from(src);
    value.round().clamp(0.0, 255.0) as u8
}

/// Blend an already-sized sprite into `dest`, skipping any part that falls
/// outside the frame.
pub fn composite(frame: &mut RgbImage, sprite: &RgbImage, dest: Rect) {
    debug_assert_eq!(
        (sprite.width() as i32, sprite.height() as i32),
        (dest.width, dest.height)
    );
    let Some(visible) = dest.clip_to(frame.width(), frame.height()) else {
        return;
    };

    for y in visible.y..visible.y + visible.height {
        for x in visible.x..visible.x + visible.width {
            let src = sprite.get_pixel((x - dest.x) as u32, (y - dest.y) as u32);
            let dst = frame.get_pixel_mut(x as u32, y as u32);
            for (d, s) in dst.0.iter_mut().zip(src.0) {
                *d = blend_pixel(*d, s);
            }
        }
    }
}

/// Resize `sprite` to the forehead placement and blend it in.
///
/// Returns whether anything was attempted; `false` means the placement was
/// degenerate or the sprite is empty.
pub fn render_sprite_on_forehead(frame: &mut RgbImage, sprite: &RgbImage, landmarks: &Landmarks) -> bool {
    if sprite.width() == 0 || sprite.height() == 0 {
        return false;
    }
    let Some(dest) = forehead_placement(landmarks) else {
        return false;
    };

    let sized = imageops::resize(sprite, dest.width as u32, dest.height as u32, FilterType::Triangle);
    composite(frame, &sized, dest);
    true
}
