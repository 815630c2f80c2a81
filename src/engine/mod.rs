//! The correlation engine.
//!
//! For each template `t` and offset index `i < n_corr`, with sample offset
//! `o = i * step`:
//!
//! 1. offsets at or beyond the valid range (see
//!    [`correlation_len`](crate::correlation_len)) are written as 0;
//! 2. every `(station, component)` channel with a non-zero weight is
//!    correlated against `data[s, c, o + moveout[t, s, c]..][..n_samples_template]`;
//!    channels whose shifted window leaves the data are skipped;
//! 3. the cell holds the weighted average of the channel correlations, or 0
//!    when no weight remains.
//!
//! # Reduction order
//!
//! Inside a window the kernel decides the sample order (index order for the
//! scalar kernel, 8 lane partial sums then the tail for the SIMD kernel).
//! Across channels the sum runs over stations, then components, in index
//! order, accumulating in `f64` before one narrowing division. Parallel execution only partitions the output grid, so for a given
//! kernel sequential and parallel runs are bit-identical.

pub(crate) mod grid;
pub(crate) mod layout;

pub use layout::WeightLayout;

use crate::kernel::Kernel;
use crate::template::{correlation_len, max_moveout};
use crate::trace::{trace_debug, trace_event, trace_span};
use crate::util::math::checked_len;
use crate::util::{MatchedFilterError, MatchedFilterResult};
use layout::Layout;

#[cfg(not(feature = "simd"))]
use crate::kernel::scalar::ScalarKernel as DefaultKernel;
#[cfg(feature = "simd")]
use crate::kernel::simd::SimdKernel as DefaultKernel;

/// Declared sizes of one compute call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Dimensions {
    pub n_templates: usize,
    pub n_stations: usize,
    pub n_components: usize,
    pub n_samples_template: usize,
    pub n_samples_data: usize,
    /// Requested output length per template.
    pub n_corr: usize,
}

impl Dimensions {
    /// Number of `(station, component)` channels.
    pub fn n_channels(&self) -> MatchedFilterResult<usize> {
        checked_len(&[self.n_stations, self.n_components], "channel count")
    }

    /// Output length implied by a moveout table and a step.
    pub fn correlation_len_for(&self, moveouts: &[i32], step: usize) -> usize {
        let max = max_moveout(moveouts, self.n_samples_template, self.n_samples_data);
        correlation_len(self.n_samples_data, self.n_samples_template, max, step)
    }
}

/// Borrowed input buffers for one compute call.
///
/// All buffers are flat and row-major:
/// `templates` is `[n_templates, n_stations, n_components, n_samples_template]`,
/// `sum_square_templates` and `moveouts` are `[n_templates, n_stations, n_components]`,
/// `data` is `[n_stations, n_components, n_samples_data]`, and `weights` is
/// either `[n_stations, n_components]` or `[n_templates, n_stations, n_components]`.
#[derive(Clone, Copy, Debug)]
pub struct MatchedFilterInputs<'a> {
    pub templates: &'a [f32],
    pub sum_square_templates: &'a [f32],
    pub moveouts: &'a [i32],
    pub data: &'a [f32],
    pub weights: &'a [f32],
    pub dims: Dimensions,
}

/// Engine configuration.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Fan the grid out over the rayon thread pool (requires the `rayon`
    /// feature; ignored otherwise).
    pub parallel: bool,
    /// Offsets evaluated per parallel task.
    pub offset_chunk: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            offset_chunk: 256,
        }
    }
}

impl EngineConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> MatchedFilterResult<()> {
        if self.offset_chunk == 0 {
            return Err(MatchedFilterError::InvalidInput("offset_chunk must be >= 1"));
        }
        Ok(())
    }
}

/// Summary of a successful compute call.
///
/// Recoverable conditions are reported here rather than as errors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ComputeReport {
    /// Requested offsets per template.
    pub n_corr: usize,
    /// Offsets actually evaluated per template; `n_valid..n_corr` hold 0.
    pub n_valid: usize,
    /// Largest moveout within `[0, n_samples_data - n_samples_template]`.
    pub max_moveout: usize,
    /// Moveouts larger than `n_samples_data - n_samples_template`; their
    /// channels never contribute.
    pub invalid_moveouts: usize,
    /// Channel evaluations skipped because the shifted window left the data.
    pub skipped_channels: usize,
}

/// Matched-filter correlation engine.
///
/// The engine holds only its configuration; it is `Send + Sync` and can be
/// shared across threads and calls.
#[derive(Clone, Debug, Default)]
pub struct CorrelationEngine {
    cfg: EngineConfig,
}

impl CorrelationEngine {
    /// Creates an engine with the given configuration.
    pub fn new(cfg: EngineConfig) -> Self {
        Self { cfg }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// Computes `cc_out` (`[n_templates, n_corr]`) with the default kernel.
    ///
    /// The default kernel is SIMD when the `simd` feature is enabled and
    /// scalar otherwise.
    pub fn compute(
        &self,
        inputs: &MatchedFilterInputs<'_>,
        step: usize,
        cc_out: &mut [f32],
    ) -> MatchedFilterResult<ComputeReport> {
        self.compute_with::<DefaultKernel>(inputs, step, cc_out)
    }

    /// Computes `cc_out` with an explicit kernel.
    ///
    /// All validation happens before the first output cell is written.
    pub fn compute_with<K: Kernel>(
        &self,
        inputs: &MatchedFilterInputs<'_>,
        step: usize,
        cc_out: &mut [f32],
    ) -> MatchedFilterResult<ComputeReport> {
        self.cfg.validate()?;
        let layout = Layout::resolve(inputs, step, cc_out.len())?;

        let dims = inputs.dims;
        let _span = trace_span!(
            "matched_filter",
            kernel = K::NAME,
            n_templates = dims.n_templates,
            n_channels = layout.n_channels,
            n_corr = dims.n_corr,
            step = step
        )
        .entered();

        let skipped_channels = if dims.n_templates == 0 || dims.n_corr == 0 {
            0
        } else {
            self.fill_grid::<K>(&layout, cc_out)
        };

        let report = ComputeReport {
            n_corr: dims.n_corr,
            n_valid: layout.n_valid.min(dims.n_corr),
            max_moveout: layout.max_moveout,
            invalid_moveouts: layout.invalid_moveouts,
            skipped_channels,
        };
        trace_event!(
            "matched_filter_done",
            n_valid = report.n_valid,
            invalid_moveouts = report.invalid_moveouts,
            skipped_channels = report.skipped_channels
        );
        Ok(report)
    }

    #[cfg(feature = "rayon")]
    fn fill_grid<K: Kernel>(&self, layout: &Layout<'_>, cc_out: &mut [f32]) -> usize {
        if self.cfg.parallel {
            return crate::kernel::rayon::fill_grid_par::<K>(layout, self.cfg.offset_chunk, cc_out);
        }
        fill_grid_seq::<K>(layout, cc_out)
    }

    #[cfg(not(feature = "rayon"))]
    fn fill_grid<K: Kernel>(&self, layout: &Layout<'_>, cc_out: &mut [f32]) -> usize {
        fill_grid_seq::<K>(layout, cc_out)
    }
}

fn fill_grid_seq<K: Kernel>(layout: &Layout<'_>, cc_out: &mut [f32]) -> usize {
    let mut skipped = 0usize;
    for (template_idx, row) in cc_out.chunks_mut(layout.n_corr).enumerate() {
        let skipped_row = grid::fill_offsets::<K>(layout, template_idx, 0, row);
        trace_debug!("template_done", template = template_idx, skipped = skipped_row);
        skipped += skipped_row;
    }
    skipped
}

/// Flat entry point with the binding-layer parameter order.
///
/// Inputs are borrowed read-only; only `cc_out` (`[n_templates, n_corr]`) is
/// written. Sizes are checked against buffer lengths before any computation
/// and inconsistencies fail with
/// [`DimensionMismatch`](crate::MatchedFilterError::DimensionMismatch).
/// Offsets `i >= correlation_len(...)` are written as 0. The grid runs on the
/// rayon pool when the `rayon` feature is enabled.
#[allow(clippy::too_many_arguments)]
pub fn matched_filter(
    templates: &[f32],
    sum_square_templates: &[f32],
    moveouts: &[i32],
    data: &[f32],
    weights: &[f32],
    step: usize,
    n_samples_template: usize,
    n_samples_data: usize,
    n_templates: usize,
    n_stations: usize,
    n_components: usize,
    n_corr: usize,
    cc_out: &mut [f32],
) -> MatchedFilterResult<ComputeReport> {
    let inputs = MatchedFilterInputs {
        templates,
        sum_square_templates,
        moveouts,
        data,
        weights,
        dims: Dimensions {
            n_templates,
            n_stations,
            n_components,
            n_samples_template,
            n_samples_data,
            n_corr,
        },
    };
    let cfg = EngineConfig {
        parallel: true,
        ..EngineConfig::default()
    };
    CorrelationEngine::new(cfg).compute(&inputs, step, cc_out)
}
