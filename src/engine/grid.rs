//! Evaluation of the (template, offset) grid.
//!
//! Both the sequential and the parallel drivers call [`fill_offsets`] on
//! disjoint output slices; the per-cell arithmetic, including the channel
//! reduction order, is identical in both.

use crate::engine::layout::Layout;
use crate::kernel::Kernel;

/// Fills `out` with scores for `template_idx` at offset indices
/// `first_offset..first_offset + out.len()`.
///
/// Returns the number of channel evaluations skipped because the shifted
/// window left the data.
pub(crate) fn fill_offsets<K: Kernel>(
    layout: &Layout<'_>,
    template_idx: usize,
    first_offset: usize,
    out: &mut [f32],
) -> usize {
    let mut skipped = 0usize;
    for (k, cell) in out.iter_mut().enumerate() {
        let offset_idx = first_offset + k;
        if offset_idx >= layout.n_valid {
            *cell = 0.0;
            continue;
        }
        let (score, skipped_here) = score_at::<K>(layout, template_idx, offset_idx * layout.step);
        *cell = score;
        skipped += skipped_here;
    }
    skipped
}

/// Weighted average correlation of one template at one sample offset.
///
/// Channels are reduced station-major, component-minor. Zero-weight channels
/// are not evaluated; they would add nothing to either sum. Both sums run in
/// `f64` so large finite weights cannot overflow, and the quotient is narrowed
/// once.
#[inline]
pub(crate) fn score_at<K: Kernel>(
    layout: &Layout<'_>,
    template_idx: usize,
    offset: usize,
) -> (f32, usize) {
    let n = layout.n_samples_template;
    let base = template_idx * layout.n_channels;

    let mut weighted_sum = 0.0f64;
    let mut weight_total = 0.0f64;
    let mut skipped = 0usize;

    for channel in 0..layout.n_channels {
        let weight = layout.weights[layout.weight_index(template_idx, channel)];
        if weight == 0.0 {
            continue;
        }
        let tpl_channel = base + channel;
        let start = offset as i64 + i64::from(layout.moveouts[tpl_channel]);
        let Some(window) = layout.data.window(channel, start, n) else {
            skipped += 1;
            continue;
        };
        let Some(template) = layout.templates.channel(tpl_channel) else {
            skipped += 1;
            continue;
        };
        let corr = K::correlate(template, layout.sum_square[tpl_channel], window);
        weighted_sum += f64::from(weight) * f64::from(corr);
        weight_total += f64::from(weight);
    }

    if weight_total <= 0.0 {
        return (0.0, skipped);
    }
    let score = (weighted_sum / weight_total) as f32;
    if score.is_finite() {
        (score, skipped)
    } else {
        (0.0, skipped)
    }
}
