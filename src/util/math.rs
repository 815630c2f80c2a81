//! Numeric helpers for normalization and detection statistics.

use crate::util::{MatchedFilterError, MatchedFilterResult};

/// Multiplies sizes, reporting overflow with the given context.
pub(crate) fn checked_len(dims: &[usize], context: &'static str) -> MatchedFilterResult<usize> {
    dims.iter().try_fold(1usize, |acc, &d| {
        acc.checked_mul(d)
            .ok_or(MatchedFilterError::SizeOverflow { context })
    })
}

/// Median of a slice (mean of the two middle values for even lengths).
///
/// Returns 0 for an empty slice.
pub(crate) fn median(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        0.5 * (sorted[mid - 1] + sorted[mid])
    } else {
        sorted[mid]
    }
}

/// Median absolute deviation around the median.
pub(crate) fn median_abs_deviation(values: &[f32]) -> f32 {
    let center = median(values);
    let deviations: Vec<f32> = values.iter().map(|v| (v - center).abs()).collect();
    median(&deviations)
}
