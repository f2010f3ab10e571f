use std::path::Path;

use ndarray::Array4;

use crate::classification::domain::classifier::EmotionClassifier;

/// Emotion classifier backed by an ONNX Runtime session.
///
/// The model is a black box: fixed-size normalized face tensor in, one
/// probability per emotion class out. Labels are supplied at construction
/// in model output order.
#[derive(Debug)]
pub struct OnnxEmotionClassifier {
    session: ort::session::Session,
    labels: Vec<String>,
}

impl OnnxEmotionClassifier {
    /// Load a classifier ONNX model and bind its output classes to `labels`.
    pub fn from_file(
        model_path: &Path,
        labels: Vec<String>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        if labels.is_empty() {
            return Err("classifier needs at least one emotion label".into());
        }
        let session = ort::session::Session::builder()?.commit_from_file(model_path)?;
        Ok(Self { session, labels })
    }
}

impl EmotionClassifier for OnnxEmotionClassifier {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn infer(&mut self, input: &Array4<f32>) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
        let input_value = ort::value::Tensor::from_array(input.clone())?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        if outputs.len() < 1 {
            return Err("classifier model produced no outputs".into());
        }

        let scores = outputs[0].try_extract_array::<f32>()?;
        let flat: Vec<f32> = scores.iter().copied().collect();
        if flat.len() != self.labels.len() {
            return Err(format!(
                "classifier produced {} scores for {} labels",
                flat.len(),
                self.labels.len()
            )
            .into());
        }
        Ok(flat)
    }
}
