//! Webcam frame source.

use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;
use tracing::{error, info, warn};

use crate::error::{Error, Result};
use crate::pipeline::FrameSource;

/// A camera with an open stream. The stream stops on drop.
pub struct Webcam {
    camera: Camera,
}

impl Webcam {
    /// Open device `index` and start streaming.
    pub fn open(index: u32) -> Result<Self> {
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut camera = Camera::new(CameraIndex::Index(index), requested)
            .map_err(|e| Error::Camera(format!("device {index}: {e}")))?;
        camera
            .open_stream()
            .map_err(|e| Error::Camera(format!("device {index}: {e}")))?;

        let resolution = camera.resolution();
        info!(
            camera = %camera.info().human_name(),
            width = resolution.width(),
            height = resolution.height(),
            "camera opened"
        );
        Ok(Self { camera })
    }
}

impl FrameSource for Webcam {
    fn next_frame(&mut self) -> Option<RgbImage> {
        let buffer = match self.camera.frame() {
            Ok(buffer) => buffer,
            Err(e) => {
                warn!("Failed to capture frame: {}", e);
                return None;
            }
        };
        let decoded = match buffer.decode_image::<RgbFormat>() {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!("Failed to decode frame: {}", e);
                return None;
            }
        };

        let (width, height) = (decoded.width(), decoded.height());
        RgbImage::from_raw(width, height, decoded.into_raw())
    }
}

impl Drop for Webcam {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            error!("Error stopping camera stream: {}", e);
        }
    }
}
