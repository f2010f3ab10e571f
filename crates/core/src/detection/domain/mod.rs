pub mod candidate_filter;
pub mod face_detector;
pub mod noise_reducer;
