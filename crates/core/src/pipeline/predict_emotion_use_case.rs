use std::time::{Duration, Instant};

use crate::classification::domain::classifier::EmotionClassifier;
use crate::classification::domain::face_preprocessor::FacePreprocessor;
use crate::detection::domain::candidate_filter::{CandidateFilter, FilterConfig};
use crate::detection::domain::face_detector::{FaceDetector, ScanParams};
use crate::detection::domain::noise_reducer::NoiseReducer;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::response::{round2, EmotionResponse, FacePrediction, TimingBreakdown};
use crate::shared::frame::Frame;

/// Per-request pipeline tuning.
#[derive(Clone, Debug, Default)]
pub struct PipelineConfig {
    pub scan: ScanParams,
    pub filter: FilterConfig,
    /// When set, the request fails before a classifier call once the
    /// elapsed time passes the deadline. Classifier latency dominates, so
    /// this is the last point a request can still be aborted cheaply.
    pub deadline: Option<Duration>,
}

/// Single-image emotion prediction pipeline:
/// noise-reduce → generate candidates → filter → per-face classify.
///
/// Constructed once at startup with its collaborators injected; `execute`
/// converts every internal failure into a structured response and never
/// propagates an error to the caller.
pub struct PredictEmotionUseCase {
    detector: Box<dyn FaceDetector>,
    preprocessor: Box<dyn FacePreprocessor>,
    classifier: Box<dyn EmotionClassifier>,
    noise_reducer: NoiseReducer,
    filter: CandidateFilter,
    scan: ScanParams,
    deadline: Option<Duration>,
    logger: Box<dyn PipelineLogger>,
}

impl PredictEmotionUseCase {
    pub fn new(
        detector: Box<dyn FaceDetector>,
        preprocessor: Box<dyn FacePreprocessor>,
        classifier: Box<dyn EmotionClassifier>,
        config: PipelineConfig,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            detector,
            preprocessor,
            classifier,
            noise_reducer: NoiseReducer::new(),
            filter: CandidateFilter::new(config.filter),
            scan: config.scan,
            deadline: config.deadline,
            logger,
        }
    }

    /// Runs the full pipeline on one frame.
    pub fn execute(&mut self, frame: &Frame) -> EmotionResponse {
        let started = Instant::now();
        match self.run(frame, started) {
            Ok(response) => response,
            Err(e) => {
                log::error!("emotion prediction failed: {e}");
                EmotionResponse::failure(
                    format!("Error during prediction: {e}"),
                    elapsed_ms(started),
                )
            }
        }
    }

    fn run(
        &mut self,
        frame: &Frame,
        started: Instant,
    ) -> Result<EmotionResponse, Box<dyn std::error::Error>> {
        let detection_started = Instant::now();
        let reduced = self.noise_reducer.reduce(frame);
        let raw = self.detector.detect(&reduced, &self.scan)?;
        // Plausibility checks read the original frame: equalization would
        // inflate the variance of the flat regions they exist to reject.
        let survivors = self.filter.filter(&raw, frame);
        let face_detection_ms = elapsed_ms(detection_started);
        self.logger.timing("face_detection", face_detection_ms);

        if survivors.is_empty() {
            self.logger.info("no face detected");
            return Ok(EmotionResponse::no_face(TimingBreakdown::new(
                face_detection_ms,
                0.0,
                elapsed_ms(started),
            )));
        }

        let mut emotions: Vec<FacePrediction> = Vec::with_capacity(survivors.len());
        let mut model_prediction_ms = 0.0;

        for (index, region) in survivors.iter().enumerate() {
            if let Some(deadline) = self.deadline {
                if started.elapsed() > deadline {
                    return Err(format!(
                        "request deadline of {}ms exceeded before classification",
                        deadline.as_millis()
                    )
                    .into());
                }
            }

            let tensor = match self.preprocessor.prepare(frame, region) {
                Ok(tensor) => tensor,
                Err(e) => {
                    log::warn!("skipping candidate {}: {e}", index + 1);
                    continue;
                }
            };

            let prediction_started = Instant::now();
            let scores = self.classifier.infer(&tensor)?;
            let prediction_ms = elapsed_ms(prediction_started);
            model_prediction_ms += prediction_ms;

            let labels = self.classifier.labels();
            if scores.len() != labels.len() {
                return Err(format!(
                    "classifier produced {} scores for {} labels",
                    scores.len(),
                    labels.len()
                )
                .into());
            }
            let (best, confidence) = argmax(&scores).ok_or("classifier returned no scores")?;

            emotions.push(FacePrediction {
                face_id: emotions.len() as u32 + 1,
                bounding_box: region.clone(),
                emotion: labels[best].clone(),
                confidence,
                prediction_time_ms: round2(prediction_ms),
                all_predictions: labels
                    .iter()
                    .cloned()
                    .zip(scores.iter().copied())
                    .collect(),
            });
        }

        self.logger.timing("model_prediction", model_prediction_ms);
        self.logger
            .info(&format!("classified {} of {} face(s)", emotions.len(), survivors.len()));

        Ok(EmotionResponse::detected(
            survivors.len(),
            emotions,
            TimingBreakdown::new(face_detection_ms, model_prediction_ms, elapsed_ms(started)),
        ))
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Index and value of the highest score; ties resolve to the first index.
fn argmax(scores: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        match best {
            Some((_, value)) if score <= value => {}
            _ => best = Some((i, score)),
        }
    }
    best
}
