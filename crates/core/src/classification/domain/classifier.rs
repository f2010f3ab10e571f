use ndarray::Array4;

/// Domain interface for the emotion classifier.
///
/// `infer` consumes one preprocessed face tensor of shape
/// (1, 1, size, size) and returns one probability per label, non-negative
/// and summing to ≈1, in `labels()` order. Sessions may be stateful, hence
/// `&mut self`.
pub trait EmotionClassifier: Send {
    fn labels(&self) -> &[String];

    fn infer(&mut self, input: &Array4<f32>) -> Result<Vec<f32>, Box<dyn std::error::Error>>;
}
