pub mod classification;
pub mod detection;
pub mod pipeline;
pub mod shared;
