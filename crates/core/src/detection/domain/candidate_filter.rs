use crate::shared::constants::MAX_FACES_PER_REQUEST;
use crate::shared::frame::Frame;
use crate::shared::region::{Region, DEFAULT_IOU_THRESHOLD};

/// Thresholds for the false-positive filter stages.
#[derive(Clone, Debug)]
pub struct FilterConfig {
    /// Smallest accepted face edge, in pixels.
    pub min_face_size: i32,
    /// Largest accepted face edge, in pixels.
    pub max_face_size: i32,
    /// Accepted width/height ratio range; faces are square-to-portrait.
    pub min_aspect_ratio: f64,
    pub max_aspect_ratio: f64,
    /// Minimum pixel-value variance inside a candidate region.
    pub min_variance: f64,
    /// Overlap above which the smaller of two candidates is suppressed.
    pub iou_threshold: f64,
    /// Survivor cap per request, largest-area-first when truncating.
    pub max_faces: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_face_size: 30,
            max_face_size: 300,
            min_aspect_ratio: 0.6,
            max_aspect_ratio: 1.4,
            min_variance: 100.0,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            max_faces: MAX_FACES_PER_REQUEST,
        }
    }
}

/// Reduces raw detector output to a small, non-overlapping, plausible set.
///
/// Stages run in a fixed order: size bound, aspect-ratio bound, frame-bounds
/// check, texture-variance check, coarse center-proximity deduplication,
/// largest-area non-maximum suppression, survivor cap. The variance check
/// reads the *pre-denoise* frame: equalization would inflate the variance of
/// flat regions the stage exists to reject.
///
/// Deterministic for identical inputs; area ties keep discovery order.
pub struct CandidateFilter {
    config: FilterConfig,
}

impl CandidateFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// `frame` is the original captured frame the candidates refer to.
    pub fn filter(&self, candidates: &[Region], frame: &Frame) -> Vec<Region> {
        let cfg = &self.config;

        let plausible: Vec<Region> = candidates
            .iter()
            .filter(|r| self.size_ok(r))
            .filter(|r| self.aspect_ok(r))
            .filter(|r| r.in_bounds(frame.width(), frame.height()))
            .filter(|r| self.variance_ok(r, frame))
            .cloned()
            .collect();

        let deduplicated = coarse_deduplicate(plausible);
        let survivors = non_max_suppression(deduplicated, cfg.iou_threshold);

        let dropped = survivors.len().saturating_sub(cfg.max_faces);
        if dropped > 0 {
            log::debug!("candidate cap dropped {dropped} smaller detection(s)");
        }
        survivors.into_iter().take(cfg.max_faces).collect()
    }

    fn size_ok(&self, r: &Region) -> bool {
        r.width >= self.config.min_face_size
            && r.width <= self.config.max_face_size
            && r.height >= self.config.min_face_size
            && r.height <= self.config.max_face_size
    }

    fn aspect_ok(&self, r: &Region) -> bool {
        let ratio = r.aspect_ratio();
        ratio >= self.config.min_aspect_ratio && ratio <= self.config.max_aspect_ratio
    }

    fn variance_ok(&self, r: &Region, frame: &Frame) -> bool {
        match region_variance(frame, r) {
            Some(v) => v >= self.config.min_variance,
            None => false,
        }
    }
}

impl Default for CandidateFilter {
    fn default() -> Self {
        Self::new(FilterConfig::default())
    }
}

/// Population variance of the pixel values under `region`, across channels.
fn region_variance(frame: &Frame, region: &Region) -> Option<f64> {
    let roi = frame.crop(region)?;
    let pixels = roi.data();
    if pixels.is_empty() {
        return None;
    }

    let n = pixels.len() as f64;
    let mean = pixels.iter().map(|&p| p as f64).sum::<f64>() / n;
    let variance = pixels
        .iter()
        .map(|&p| {
            let d = p as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    Some(variance)
}

/// Cheap pairwise proximity test ahead of NMS: a candidate whose center
/// falls within half its own box dimensions of an already-kept center is
/// a near-identical duplicate.
fn coarse_deduplicate(candidates: Vec<Region>) -> Vec<Region> {
    let mut kept: Vec<Region> = Vec::with_capacity(candidates.len());
    for r in candidates {
        let (cx, cy) = r.center();
        let duplicate = kept.iter().any(|k| {
            let (kx, ky) = k.center();
            (cx - kx).abs() < r.width as f64 / 2.0 && (cy - ky).abs() < r.height as f64 / 2.0
        });
        if !duplicate {
            kept.push(r);
        }
    }
    kept
}

/// Greedy non-maximum suppression biased toward larger detections.
///
/// Repeatedly keeps the largest-area remaining candidate and discards every
/// candidate overlapping it beyond `iou_threshold`. The returned set is
/// mutually non-overlapping beyond the threshold, ordered largest-first;
/// the sort is stable so area ties keep discovery order.
fn non_max_suppression(mut candidates: Vec<Region>, iou_threshold: f64) -> Vec<Region> {
    candidates.sort_by(|a, b| b.area().cmp(&a.area()));

    let mut keep = Vec::with_capacity(candidates.len());
    let mut suppressed = vec![false; candidates.len()];

    for i in 0..candidates.len() {
        if suppressed[i] {
            continue;
        }
        for j in (i + 1)..candidates.len() {
            if !suppressed[j] && candidates[i].iou(&candidates[j]) > iou_threshold {
                suppressed[j] = true;
            }
        }
        keep.push(candidates[i].clone());
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn region(x: i32, y: i32, w: i32, h: i32) -> Region {
        Region::new(x, y, w, h)
    }

    /// Checkerboard frame: every region has variance far above threshold.
    fn textured_frame(w: u32, h: u32) -> Frame {
        let data: Vec<u8> = (0..h)
            .flat_map(|y| (0..w).map(move |x| if (x + y) % 2 == 0 { 0 } else { 255 }))
            .collect();
        Frame::new(data, w, h, 1)
    }

    fn uniform_frame(w: u32, h: u32, value: u8) -> Frame {
        Frame::new(vec![value; (w * h) as usize], w, h, 1)
    }

    // ── Plausibility gates ───────────────────────────────────────────

    #[rstest]
    #[case::below_min(region(0, 0, 10, 10))]
    #[case::above_max(region(0, 0, 310, 310))]
    #[case::wide_aspect(region(0, 0, 300, 50))]
    #[case::tall_aspect(region(0, 0, 50, 120))]
    fn test_implausible_geometry_discarded(#[case] candidate: Region) {
        let frame = textured_frame(400, 400);
        let filter = CandidateFilter::default();
        assert!(filter.filter(&[candidate], &frame).is_empty());
    }

    #[test]
    fn test_out_of_frame_candidate_discarded() {
        let frame = textured_frame(100, 100);
        let filter = CandidateFilter::default();
        // Plausible size and aspect, but extends past the right edge.
        assert!(filter.filter(&[region(70, 10, 50, 50)], &frame).is_empty());
    }

    #[test]
    fn test_uniform_region_discarded_regardless_of_geometry() {
        let frame = uniform_frame(200, 200, 128);
        let filter = CandidateFilter::default();
        assert!(filter.filter(&[region(20, 20, 60, 60)], &frame).is_empty());
    }

    #[test]
    fn test_textured_candidate_survives() {
        let frame = textured_frame(200, 200);
        let filter = CandidateFilter::default();
        let result = filter.filter(&[region(20, 20, 60, 60)], &frame);
        assert_eq!(result, vec![region(20, 20, 60, 60)]);
    }

    // ── Variance helper ──────────────────────────────────────────────

    #[test]
    fn test_region_variance_uniform_is_zero() {
        let frame = uniform_frame(50, 50, 77);
        let v = region_variance(&frame, &region(5, 5, 30, 30)).unwrap();
        assert!(v < f64::EPSILON);
    }

    #[test]
    fn test_region_variance_checkerboard() {
        // Half 0, half 255: variance = (127.5)^2
        let frame = textured_frame(50, 50);
        let v = region_variance(&frame, &region(0, 0, 50, 50)).unwrap();
        assert!((v - 127.5 * 127.5).abs() < 1.0);
    }

    #[test]
    fn test_region_variance_out_of_bounds_is_none() {
        let frame = uniform_frame(20, 20, 0);
        assert!(region_variance(&frame, &region(10, 10, 20, 20)).is_none());
    }

    // ── Coarse deduplication ─────────────────────────────────────────

    #[test]
    fn test_coarse_dedup_drops_near_identical() {
        let kept = coarse_deduplicate(vec![region(18, 18, 44, 44), region(20, 20, 40, 40)]);
        assert_eq!(kept, vec![region(18, 18, 44, 44)]);
    }

    #[test]
    fn test_coarse_dedup_keeps_distant() {
        let kept = coarse_deduplicate(vec![region(0, 0, 40, 40), region(100, 100, 40, 40)]);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_coarse_dedup_first_discovery_wins() {
        let kept = coarse_deduplicate(vec![region(20, 20, 40, 40), region(18, 18, 44, 44)]);
        assert_eq!(kept, vec![region(20, 20, 40, 40)]);
    }

    // ── Non-maximum suppression ──────────────────────────────────────

    #[test]
    fn test_nms_suppresses_overlap_keeps_larger() {
        let kept = non_max_suppression(
            vec![region(20, 20, 40, 40), region(18, 18, 44, 44)],
            DEFAULT_IOU_THRESHOLD,
        );
        assert_eq!(kept, vec![region(18, 18, 44, 44)]);
    }

    #[test]
    fn test_nms_keeps_disjoint() {
        let kept = non_max_suppression(
            vec![region(0, 0, 50, 50), region(200, 200, 50, 50)],
            DEFAULT_IOU_THRESHOLD,
        );
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_nms_overlap_invariant() {
        let candidates = vec![
            region(0, 0, 60, 60),
            region(10, 10, 60, 60),
            region(20, 20, 60, 60),
            region(100, 0, 50, 50),
            region(110, 5, 55, 55),
        ];
        let kept = non_max_suppression(candidates, DEFAULT_IOU_THRESHOLD);
        for i in 0..kept.len() {
            for j in (i + 1)..kept.len() {
                assert!(kept[i].iou(&kept[j]) <= DEFAULT_IOU_THRESHOLD);
            }
        }
    }

    #[test]
    fn test_nms_idempotent() {
        let candidates = vec![
            region(0, 0, 60, 60),
            region(10, 10, 60, 60),
            region(100, 0, 50, 50),
        ];
        let once = non_max_suppression(candidates, DEFAULT_IOU_THRESHOLD);
        let twice = non_max_suppression(once.clone(), DEFAULT_IOU_THRESHOLD);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_nms_orders_largest_first() {
        let kept = non_max_suppression(
            vec![region(0, 0, 40, 40), region(100, 100, 80, 80)],
            DEFAULT_IOU_THRESHOLD,
        );
        assert_eq!(kept[0], region(100, 100, 80, 80));
    }

    #[test]
    fn test_nms_area_tie_keeps_discovery_order() {
        let kept = non_max_suppression(
            vec![region(200, 200, 50, 50), region(0, 0, 50, 50)],
            DEFAULT_IOU_THRESHOLD,
        );
        assert_eq!(kept, vec![region(200, 200, 50, 50), region(0, 0, 50, 50)]);
    }

    // ── Cap and end-to-end filter ────────────────────────────────────

    #[test]
    fn test_cap_keeps_three_largest() {
        let frame = textured_frame(600, 600);
        let filter = CandidateFilter::default();
        let candidates = vec![
            region(0, 0, 40, 40),
            region(150, 0, 80, 80),
            region(300, 0, 60, 60),
            region(0, 150, 100, 100),
            region(150, 150, 50, 50),
        ];
        let result = filter.filter(&candidates, &frame);
        assert_eq!(result.len(), 3);
        assert_eq!(
            result,
            vec![
                region(0, 150, 100, 100),
                region(150, 0, 80, 80),
                region(300, 0, 60, 60),
            ]
        );
    }

    #[test]
    fn test_filter_never_exceeds_cap() {
        let frame = textured_frame(600, 600);
        let filter = CandidateFilter::default();
        let candidates: Vec<Region> = (0..8)
            .map(|i| region((i % 4) * 150, (i / 4) * 150, 50 + i, 50 + i))
            .collect();
        assert!(filter.filter(&candidates, &frame).len() <= 3);
    }

    #[test]
    fn test_filter_deterministic() {
        let frame = textured_frame(400, 400);
        let filter = CandidateFilter::default();
        let candidates = vec![
            region(10, 10, 60, 60),
            region(12, 12, 60, 60),
            region(200, 200, 80, 80),
            region(100, 100, 45, 45),
        ];
        let first = filter.filter(&candidates, &frame);
        let second = filter.filter(&candidates, &frame);
        assert_eq!(first, second);
    }

    #[test]
    fn test_filter_empty_input() {
        let frame = textured_frame(100, 100);
        assert!(CandidateFilter::default().filter(&[], &frame).is_empty());
    }
}
