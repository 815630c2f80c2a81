//! Cutting detected events out of the continuous data.

use crate::detect::Detection;
use crate::util::math::checked_len;
use crate::util::{MatchedFilterError, MatchedFilterResult};
use crate::waveform::ChannelView;

/// Extracts the data windows a detection was scored on.
///
/// `data` is `[n_stations * n_components, n_samples_data]` and `moveouts` is
/// the full `[n_templates, n_stations, n_components]` table. The result is a
/// flat `[n_stations, n_components, n_samples_template]` buffer holding, for
/// every channel, the samples starting at
/// `detection.sample + moveouts[template, station, component]`. Channels
/// whose window leaves the data are zero-filled.
pub fn extract_waveforms(
    data: &ChannelView<'_, f32>,
    detection: &Detection,
    moveouts: &[i32],
    n_samples_template: usize,
) -> MatchedFilterResult<Vec<f32>> {
    let n_channels = data.n_channels();
    let first = checked_len(&[detection.template_idx, n_channels], "moveouts")?;
    let end = first
        .checked_add(n_channels)
        .ok_or(MatchedFilterError::SizeOverflow { context: "moveouts" })?;
    let Some(table) = moveouts.get(first..end) else {
        return Err(MatchedFilterError::DimensionMismatch {
            buffer: "moveouts",
            expected: end,
            got: moveouts.len(),
        });
    };
    let sample = i64::try_from(detection.sample)
        .map_err(|_| MatchedFilterError::SizeOverflow { context: "detection sample" })?;

    let mut out = vec![0.0f32; checked_len(&[n_channels, n_samples_template], "waveforms")?];
    for (channel, (dst, &moveout)) in out
        .chunks_exact_mut(n_samples_template.max(1))
        .zip(table)
        .enumerate()
    {
        let start = sample + i64::from(moveout);
        if let Some(window) = data.window(channel, start, n_samples_template) {
            dst.copy_from_slice(window);
        }
    }
    Ok(out)
}
