use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};
use ndarray::Array4;
use thiserror::Error;

use crate::shared::constants::CLASSIFIER_INPUT_SIZE;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Why a candidate could not be turned into a classifier input.
///
/// Preprocessing failures are per-candidate: the orchestrator skips the
/// candidate and keeps processing the rest of the request.
#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("degenerate crop region {width}x{height}")]
    DegenerateCrop { width: i32, height: i32 },
    #[error("crop region ({x}, {y}) {width}x{height} outside frame bounds")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
    #[error("cannot grayscale a {0}-channel face crop")]
    UnsupportedChannels(u8),
    #[error("face crop buffer does not match its dimensions")]
    InvalidBuffer,
}

/// Domain interface for candidate-to-tensor preparation.
pub trait FacePreprocessor: Send {
    fn prepare(&self, frame: &Frame, region: &Region) -> Result<Array4<f32>, PreprocessError>;
}

/// The classifier-input pipeline: crop, grayscale, resize to the model
/// edge, scale to [0, 1], shape (batch=1, channel=1, size, size).
pub struct StandardFacePreprocessor;

impl StandardFacePreprocessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StandardFacePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl FacePreprocessor for StandardFacePreprocessor {
    fn prepare(&self, frame: &Frame, region: &Region) -> Result<Array4<f32>, PreprocessError> {
        if region.width <= 0 || region.height <= 0 {
            return Err(PreprocessError::DegenerateCrop {
                width: region.width,
                height: region.height,
            });
        }

        let roi = frame.crop(region).ok_or(PreprocessError::OutOfBounds {
            x: region.x,
            y: region.y,
            width: region.width,
            height: region.height,
        })?;

        let gray = gray_crop(&roi)?;
        let size = CLASSIFIER_INPUT_SIZE;
        let resized = imageops::resize(&gray, size, size, FilterType::Triangle);

        let mut tensor = Array4::<f32>::zeros((1, 1, size as usize, size as usize));
        for (x, y, pixel) in resized.enumerate_pixels() {
            tensor[[0, 0, y as usize, x as usize]] = pixel.0[0] as f32 / 255.0;
        }
        Ok(tensor)
    }
}

fn gray_crop(roi: &Frame) -> Result<GrayImage, PreprocessError> {
    match roi.channels() {
        1 => GrayImage::from_raw(roi.width(), roi.height(), roi.data().to_vec())
            .ok_or(PreprocessError::InvalidBuffer),
        3 => {
            let rgb = RgbImage::from_raw(roi.width(), roi.height(), roi.data().to_vec())
                .ok_or(PreprocessError::InvalidBuffer)?;
            Ok(image::DynamicImage::ImageRgb8(rgb).into_luma8())
        }
        other => Err(PreprocessError::UnsupportedChannels(other)),
    }
}
