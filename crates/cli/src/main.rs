use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::Parser;

use moodlens_core::classification::domain::classifier::EmotionClassifier;
use moodlens_core::classification::domain::face_preprocessor::StandardFacePreprocessor;
use moodlens_core::classification::infrastructure::onnx_classifier::OnnxEmotionClassifier;
use moodlens_core::detection::domain::candidate_filter::FilterConfig;
use moodlens_core::detection::domain::face_detector::{FaceDetector, ScanParams};
use moodlens_core::detection::infrastructure::seeta_detector::SeetaFaceDetector;
use moodlens_core::pipeline::pipeline_logger::LogPipelineLogger;
use moodlens_core::pipeline::predict_emotion_use_case::{PipelineConfig, PredictEmotionUseCase};
use moodlens_core::shared::constants::DEFAULT_EMOTION_LABELS;
use moodlens_core::shared::frame::Frame;

/// Facial emotion recognition for still images.
#[derive(Parser)]
#[command(name = "moodlens")]
struct Cli {
    /// Input image file.
    input: PathBuf,

    /// Emotion classifier ONNX model.
    #[arg(long, env = "MOODLENS_MODEL")]
    model: PathBuf,

    /// SeetaFace detection model.
    #[arg(long, env = "MOODLENS_CASCADE")]
    cascade: PathBuf,

    /// Emotion labels in classifier output order (comma-separated).
    #[arg(long, value_delimiter = ',')]
    labels: Option<Vec<String>>,

    /// Detection pyramid scale step.
    #[arg(long, default_value = "1.1")]
    scale_factor: f64,

    /// Minimum neighboring hits to accept a detection window.
    #[arg(long, default_value = "4")]
    min_neighbors: u32,

    /// Smallest accepted face edge in pixels.
    #[arg(long, default_value = "30")]
    min_face_size: u32,

    /// Overlap ratio above which duplicate detections are suppressed.
    #[arg(long, default_value = "0.3")]
    iou_threshold: f64,

    /// Maximum faces returned per image.
    #[arg(long, default_value = "3")]
    max_faces: usize,

    /// Per-request deadline in milliseconds (0 disables it).
    #[arg(long, default_value = "0")]
    deadline_ms: u64,

    /// Pretty-print the JSON response.
    #[arg(long)]
    pretty: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let frame = load_frame(&cli.input)?;
    let detector: Box<dyn FaceDetector> = Box::new(SeetaFaceDetector::from_file(&cli.cascade)?);
    let classifier: Box<dyn EmotionClassifier> =
        Box::new(OnnxEmotionClassifier::from_file(&cli.model, labels(&cli))?);

    let mut use_case = PredictEmotionUseCase::new(
        detector,
        Box::new(StandardFacePreprocessor::new()),
        classifier,
        pipeline_config(&cli),
        Box::new(LogPipelineLogger),
    );

    let response = use_case.execute(&frame);
    log::info!(
        "{} in {:.1}ms",
        response.message,
        response.processing_time_ms
    );

    let json = if cli.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{json}");

    Ok(())
}

fn load_frame(path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
    let decoded = image::open(path)
        .map_err(|e| format!("cannot decode {}: {e}", path.display()))?
        .into_rgb8();
    let (width, height) = decoded.dimensions();
    Ok(Frame::new(decoded.into_raw(), width, height, 3))
}

fn labels(cli: &Cli) -> Vec<String> {
    match &cli.labels {
        Some(labels) => labels.clone(),
        None => DEFAULT_EMOTION_LABELS.iter().map(|s| s.to_string()).collect(),
    }
}

fn pipeline_config(cli: &Cli) -> PipelineConfig {
    PipelineConfig {
        scan: ScanParams {
            scale_factor: cli.scale_factor,
            min_neighbors: cli.min_neighbors,
            min_size: (cli.min_face_size, cli.min_face_size),
        },
        filter: FilterConfig {
            min_face_size: cli.min_face_size as i32,
            iou_threshold: cli.iou_threshold,
            max_faces: cli.max_faces,
            ..FilterConfig::default()
        },
        deadline: match cli.deadline_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        },
    }
}
