use std::collections::BTreeMap;

use serde::Serialize;

use crate::shared::region::Region;

/// One classified face within a response. Immutable after creation.
#[derive(Clone, Debug, Serialize)]
pub struct FacePrediction {
    /// 1-based, dense within a single response.
    pub face_id: u32,
    pub bounding_box: Region,
    pub emotion: String,
    pub confidence: f32,
    pub prediction_time_ms: f64,
    /// Full per-class probability map; values sum to ≈1.
    pub all_predictions: BTreeMap<String, f32>,
}

/// Millisecond-resolution stage timings for observability.
#[derive(Clone, Debug, Default, Serialize)]
pub struct TimingBreakdown {
    pub face_detection: f64,
    pub model_prediction: f64,
    pub total: f64,
}

impl TimingBreakdown {
    pub fn new(face_detection: f64, model_prediction: f64, total: f64) -> Self {
        Self {
            face_detection: round2(face_detection),
            model_prediction: round2(model_prediction),
            total: round2(total),
        }
    }
}

/// The per-request result payload handed to the transport layer.
#[derive(Clone, Debug, Serialize)]
pub struct EmotionResponse {
    pub success: bool,
    pub faces_detected: usize,
    pub emotions: Vec<FacePrediction>,
    pub message: String,
    pub processing_time_ms: f64,
    pub timing_breakdown_ms: TimingBreakdown,
}

impl EmotionResponse {
    /// Zero surviving candidates. A normal outcome, not an error; the
    /// flag mirrors the original wire behavior.
    pub fn no_face(timing: TimingBreakdown) -> Self {
        Self {
            success: false,
            faces_detected: 0,
            emotions: Vec::new(),
            message: "No face detected".to_string(),
            processing_time_ms: timing.total,
            timing_breakdown_ms: timing,
        }
    }

    /// Successful detection with `faces_detected` filter survivors.
    ///
    /// `faces_detected` counts survivors, not predictions: a candidate
    /// skipped at preprocessing stays in the count.
    pub fn detected(
        faces_detected: usize,
        emotions: Vec<FacePrediction>,
        timing: TimingBreakdown,
    ) -> Self {
        Self {
            success: true,
            faces_detected,
            emotions,
            message: format!("Successfully detected {faces_detected} face(s)"),
            processing_time_ms: timing.total,
            timing_breakdown_ms: timing,
        }
    }

    /// Fatal-to-request failure: no partial predictions are returned.
    pub fn failure(message: impl Into<String>, total_ms: f64) -> Self {
        Self {
            success: false,
            faces_detected: 0,
            emotions: Vec::new(),
            message: message.into(),
            processing_time_ms: round2(total_ms),
            timing_breakdown_ms: TimingBreakdown::default(),
        }
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
