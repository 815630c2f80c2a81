//! One-dimensional non-maximum suppression over correlation offsets.

use crate::detect::Detection;
use std::cmp::Ordering;

fn detection_cmp_desc(a: &Detection, b: &Detection) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.offset_idx.cmp(&b.offset_idx))
        .then_with(|| a.template_idx.cmp(&b.template_idx))
}

/// Sorts detections by descending score with deterministic tie-breaking.
pub(crate) fn sort_detections_desc(detections: &mut [Detection]) {
    detections.sort_by(detection_cmp_desc);
}

/// Keeps detections at least `min_separation` offsets away from every
/// stronger kept detection.
///
/// Input is sorted in place by descending score; the kept detections are
/// returned in that order.
pub fn nms_1d(detections: &mut [Detection], min_separation: usize) -> Vec<Detection> {
    sort_detections_desc(detections);
    if min_separation == 0 {
        return detections.to_owned();
    }

    let mut kept: Vec<Detection> = Vec::new();
    'outer: for det in detections.iter().copied() {
        for other in kept.iter() {
            if det.offset_idx.abs_diff(other.offset_idx) < min_separation {
                continue 'outer;
            }
        }
        kept.push(det);
    }
    kept
}
