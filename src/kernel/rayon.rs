//! Rayon-parallel grid driver (feature-gated).
//!
//! The output is split into per-template rows and each row into contiguous
//! offset chunks. Every chunk is owned by exactly one task, so no cell is
//! written twice and no synchronization is needed; inputs are only read.

use crate::engine::grid::fill_offsets;
use crate::engine::layout::Layout;
use crate::kernel::Kernel;
use rayon::prelude::*;

/// Computes the full grid in parallel and returns the skipped-channel count.
///
/// `cc_out.len()` must equal `n_templates * n_corr`; `n_corr` and
/// `offset_chunk` must be positive.
pub(crate) fn fill_grid_par<K: Kernel>(
    layout: &Layout<'_>,
    offset_chunk: usize,
    cc_out: &mut [f32],
) -> usize {
    cc_out
        .par_chunks_mut(layout.n_corr)
        .enumerate()
        .map(|(template_idx, row)| {
            row.par_chunks_mut(offset_chunk)
                .enumerate()
                .map(|(chunk_idx, chunk)| {
                    fill_offsets::<K>(layout, template_idx, chunk_idx * offset_chunk, chunk)
                })
                .sum::<usize>()
        })
        .sum()
}
