use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Scan parameters handed to the candidate generator.
///
/// Backends map these onto their own tuning knobs; a backend without an
/// equivalent for a given parameter may ignore it.
#[derive(Clone, Debug, PartialEq)]
pub struct ScanParams {
    /// Pyramid step between successive scan scales.
    pub scale_factor: f64,
    /// Minimum neighboring hits required to accept a window.
    pub min_neighbors: u32,
    /// Smallest face size considered, in pixels (width, height).
    pub min_size: (u32, u32),
}

impl Default for ScanParams {
    fn default() -> Self {
        Self {
            scale_factor: 1.1,
            min_neighbors: 4,
            min_size: (30, 30),
        }
    }
}

/// Domain interface for raw face-candidate generation.
///
/// Output is noisy and over-inclusive by design: no ordering, non-overlap,
/// or bounded-count guarantee. Implementations may be stateful, hence
/// `&mut self`.
pub trait FaceDetector: Send {
    fn detect(
        &mut self,
        frame: &Frame,
        params: &ScanParams,
    ) -> Result<Vec<Region>, Box<dyn std::error::Error>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scan_params() {
        let params = ScanParams::default();
        assert_eq!(params.min_neighbors, 4);
        assert_eq!(params.min_size, (30, 30));
        assert!((params.scale_factor - 1.1).abs() < f64::EPSILON);
    }
}
