//! Moveout bookkeeping and the output-length law.

/// Largest moveout usable at offset 0.
///
/// Only moveouts in `[0, n_samples_data - n_samples_template]` are
/// considered; anything outside that range can never produce a full window at
/// a non-negative offset and is skipped per channel. Returns 0 when no moveout
/// qualifies or when the template is longer than the data.
pub fn max_moveout(moveouts: &[i32], n_samples_template: usize, n_samples_data: usize) -> usize {
    let Some(limit) = n_samples_data.checked_sub(n_samples_template) else {
        return 0;
    };
    moveouts
        .iter()
        .filter_map(|&m| usize::try_from(m).ok())
        .filter(|&m| m <= limit)
        .max()
        .unwrap_or(0)
}

/// Number of moveouts larger than `n_samples_data - n_samples_template`.
pub(crate) fn count_out_of_range(
    moveouts: &[i32],
    n_samples_template: usize,
    n_samples_data: usize,
) -> usize {
    let limit = n_samples_data.saturating_sub(n_samples_template);
    moveouts
        .iter()
        .filter(|&&m| usize::try_from(m).is_ok_and(|m| m > limit))
        .count()
}

/// Number of offsets with a full window for every usable moveout:
/// `floor((n_samples_data - n_samples_template - max_moveout) / step) + 1`,
/// clipped to 0.
///
/// Returns 0 for `step == 0`.
pub fn correlation_len(
    n_samples_data: usize,
    n_samples_template: usize,
    max_moveout: usize,
    step: usize,
) -> usize {
    if step == 0 {
        return 0;
    }
    n_samples_template
        .checked_add(max_moveout)
        .and_then(|needed| n_samples_data.checked_sub(needed))
        .map_or(0, |span| span / step + 1)
}
