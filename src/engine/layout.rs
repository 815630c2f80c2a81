//! Validation of declared sizes against buffer lengths.
//!
//! Every check runs before any output cell is written, so a call either
//! fails here or computes the whole grid.

use crate::engine::{Dimensions, MatchedFilterInputs};
use crate::template::{correlation_len, count_out_of_range, max_moveout};
use crate::util::math::checked_len;
use crate::util::{MatchedFilterError, MatchedFilterResult};
use crate::waveform::ChannelView;

/// How the weight buffer is indexed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeightLayout {
    /// One weight per `(station, component)`, shared by every template.
    Shared,
    /// One weight per `(template, station, component)`.
    PerTemplate,
}

impl WeightLayout {
    /// Resolves the layout from the weight buffer length.
    ///
    /// With a single template both layouts have the same length and the
    /// same meaning; `Shared` is reported.
    pub fn resolve(dims: &Dimensions, len: usize) -> MatchedFilterResult<Self> {
        let shared = dims.n_channels()?;
        let per_template = checked_len(&[dims.n_templates, shared], "weights")?;
        if len == shared {
            Ok(Self::Shared)
        } else if len == per_template {
            Ok(Self::PerTemplate)
        } else {
            Err(MatchedFilterError::DimensionMismatch {
                buffer: "weights",
                expected: per_template,
                got: len,
            })
        }
    }
}

/// Validated, borrowed view of one compute call.
pub(crate) struct Layout<'a> {
    pub(crate) templates: ChannelView<'a, f32>,
    pub(crate) data: ChannelView<'a, f32>,
    pub(crate) sum_square: &'a [f32],
    pub(crate) moveouts: &'a [i32],
    pub(crate) weights: &'a [f32],
    pub(crate) weight_layout: WeightLayout,
    pub(crate) n_channels: usize,
    pub(crate) n_samples_template: usize,
    pub(crate) n_corr: usize,
    pub(crate) step: usize,
    pub(crate) n_valid: usize,
    pub(crate) max_moveout: usize,
    pub(crate) invalid_moveouts: usize,
}

impl<'a> Layout<'a> {
    pub(crate) fn resolve(
        inputs: &MatchedFilterInputs<'a>,
        step: usize,
        cc_out_len: usize,
    ) -> MatchedFilterResult<Self> {
        let dims = inputs.dims;
        if step == 0 {
            return Err(MatchedFilterError::InvalidStep { step });
        }
        if dims.n_samples_template > dims.n_samples_data {
            return Err(MatchedFilterError::TemplateLongerThanData {
                n_samples_template: dims.n_samples_template,
                n_samples_data: dims.n_samples_data,
            });
        }

        let n_channels = dims.n_channels()?;
        let table_len = checked_len(&[dims.n_templates, n_channels], "template channels")?;
        let templates = ChannelView::new(
            inputs.templates,
            table_len,
            dims.n_samples_template,
            "templates",
        )?;
        check_len("sum_square_templates", table_len, inputs.sum_square_templates.len())?;
        check_len("moveouts", table_len, inputs.moveouts.len())?;
        let data = ChannelView::new(inputs.data, n_channels, dims.n_samples_data, "data")?;
        let weight_layout = WeightLayout::resolve(&dims, inputs.weights.len())?;
        let out_len = checked_len(&[dims.n_templates, dims.n_corr], "cc_out")?;
        check_len("cc_out", out_len, cc_out_len)?;

        if let Some((index, &value)) = inputs
            .weights
            .iter()
            .enumerate()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(MatchedFilterError::InvalidWeight { index, value });
        }

        let max_moveout = max_moveout(
            inputs.moveouts,
            dims.n_samples_template,
            dims.n_samples_data,
        );
        let n_valid = correlation_len(
            dims.n_samples_data,
            dims.n_samples_template,
            max_moveout,
            step,
        );
        let invalid_moveouts = count_out_of_range(
            inputs.moveouts,
            dims.n_samples_template,
            dims.n_samples_data,
        );

        Ok(Self {
            templates,
            data,
            sum_square: inputs.sum_square_templates,
            moveouts: inputs.moveouts,
            weights: inputs.weights,
            weight_layout,
            n_channels,
            n_samples_template: dims.n_samples_template,
            n_corr: dims.n_corr,
            step,
            n_valid,
            max_moveout,
            invalid_moveouts,
        })
    }

    /// Index into the weight buffer for `(template, channel)`.
    #[inline]
    pub(crate) fn weight_index(&self, template_idx: usize, channel: usize) -> usize {
        match self.weight_layout {
            WeightLayout::Shared => channel,
            WeightLayout::PerTemplate => template_idx * self.n_channels + channel,
        }
    }
}

fn check_len(buffer: &'static str, expected: usize, got: usize) -> MatchedFilterResult<()> {
    if expected == got {
        Ok(())
    } else {
        Err(MatchedFilterError::DimensionMismatch {
            buffer,
            expected,
            got,
        })
    }
}
