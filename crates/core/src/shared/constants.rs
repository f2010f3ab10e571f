/// Classifier input resolution: faces are resized to a square of this edge.
pub const CLASSIFIER_INPUT_SIZE: u32 = 48;

/// Emotion class labels in model output order.
pub const DEFAULT_EMOTION_LABELS: &[&str] = &["happy", "sad", "neutral"];

/// Upper bound on faces returned per request.
pub const MAX_FACES_PER_REQUEST: usize = 3;
