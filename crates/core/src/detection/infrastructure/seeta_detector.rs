use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::detection::domain::face_detector::{FaceDetector, ScanParams};
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Detection score threshold; SeetaFace has no neighbor-vote stage, its
/// score threshold plays that role.
const SCORE_THRESH: f64 = 2.0;

/// Sliding-window step in pixels.
const WINDOW_STEP: u32 = 4;

/// Candidate generator backed by the `rustface` crate (SeetaFace engine).
///
/// The engine is consumed as an opaque detector: a fresh scanner is built
/// from the shared model on every call so scan parameters can vary per
/// request.
pub struct SeetaFaceDetector {
    model: rustface::Model,
}

impl SeetaFaceDetector {
    /// Load a SeetaFace detection model from disk.
    pub fn from_file(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let file = File::open(model_path).map_err(|e| {
            format!(
                "cannot open detection model {}: {e}",
                model_path.display()
            )
        })?;
        let model = rustface::read_model(BufReader::new(file))
            .map_err(|e| format!("invalid detection model {}: {e}", model_path.display()))?;
        Ok(Self { model })
    }
}

impl FaceDetector for SeetaFaceDetector {
    fn detect(
        &mut self,
        frame: &Frame,
        params: &ScanParams,
    ) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
        if !frame.is_grayscale() {
            return Err(format!(
                "candidate generator requires a single-channel frame, got {} channels",
                frame.channels()
            )
            .into());
        }

        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(min_face_edge(params));
        detector.set_score_thresh(SCORE_THRESH);
        detector.set_pyramid_scale_factor(pyramid_scale(params.scale_factor));
        detector.set_slide_window_step(WINDOW_STEP, WINDOW_STEP);

        let image = rustface::ImageData::new(frame.data(), frame.width(), frame.height());
        let faces = detector.detect(&image);

        Ok(faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                Region::new(
                    bbox.x(),
                    bbox.y(),
                    bbox.width() as i32,
                    bbox.height() as i32,
                )
            })
            .collect())
    }
}

fn min_face_edge(params: &ScanParams) -> u32 {
    // The engine rejects windows below 20px.
    params.min_size.0.min(params.min_size.1).max(20)
}

/// Map a cascade-style upscale step (> 1.0) onto the engine's downscale
/// pyramid factor in (0, 1).
fn pyramid_scale(scale_factor: f64) -> f32 {
    if scale_factor <= 1.0 {
        return 0.8;
    }
    (1.0 / scale_factor).clamp(0.5, 0.99) as f32
}
