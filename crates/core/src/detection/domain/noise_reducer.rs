use image::{GrayImage, RgbImage};
use imageproc::contrast::equalize_histogram;
use imageproc::filter::gaussian_blur_f32;

use crate::shared::frame::Frame;

/// Blur radius small enough to preserve facial features (a 3x3 kernel).
const BLUR_SIGMA: f32 = 0.8;

/// Stabilizes a frame before candidate generation: luminance conversion,
/// light Gaussian blur, global histogram equalization.
///
/// Purely an optimization for the detector; any internal failure falls back
/// to the unmodified input instead of failing the request.
pub struct NoiseReducer;

impl NoiseReducer {
    pub fn new() -> Self {
        Self
    }

    /// Returns a single-channel frame of identical dimensions, or the
    /// original frame when conversion is not possible.
    pub fn reduce(&self, frame: &Frame) -> Frame {
        match try_reduce(frame) {
            Some(reduced) => reduced,
            None => {
                log::warn!("noise reduction failed, continuing with unprocessed frame");
                frame.clone()
            }
        }
    }
}

impl Default for NoiseReducer {
    fn default() -> Self {
        Self::new()
    }
}

fn try_reduce(frame: &Frame) -> Option<Frame> {
    let gray = to_gray_image(frame)?;
    let blurred = gaussian_blur_f32(&gray, BLUR_SIGMA);
    let equalized = equalize_histogram(&blurred);

    let (w, h) = equalized.dimensions();
    Some(Frame::new(equalized.into_raw(), w, h, 1))
}

fn to_gray_image(frame: &Frame) -> Option<GrayImage> {
    match frame.channels() {
        1 => GrayImage::from_raw(frame.width(), frame.height(), frame.data().to_vec()),
        3 => {
            let rgb = RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())?;
            Some(image::DynamicImage::ImageRgb8(rgb).into_luma8())
        }
        _ => None,
    }
}
