pub mod pipeline_logger;
pub mod predict_emotion_use_case;
pub mod response;
