//! Template storage and precomputation.
//!
//! A [`TemplateBank`] owns everything that describes the searched-for events:
//! the waveforms, their per-channel energies, the moveout table and the
//! channel weights. Building the bank once amortizes the energy computation
//! across many data chunks.

mod moveout;
mod norms;

pub use moveout::{correlation_len, max_moveout};
pub(crate) use moveout::count_out_of_range;
pub use norms::sum_square_templates;

use crate::engine::{Dimensions, MatchedFilterInputs};
use crate::util::math::checked_len;
use crate::util::{MatchedFilterError, MatchedFilterResult};

/// Owned template waveforms with moveouts, weights and energies.
#[derive(Clone, Debug)]
pub struct TemplateBank {
    templates: Vec<f32>,
    sum_square: Vec<f32>,
    moveouts: Vec<i32>,
    weights: Vec<f32>,
    n_templates: usize,
    n_stations: usize,
    n_components: usize,
    n_samples_template: usize,
}

impl TemplateBank {
    /// Builds a bank from flat row-major buffers.
    ///
    /// `templates` is `[n_templates, n_stations, n_components, n_samples_template]`;
    /// `n_templates` is derived from its length. `moveouts` is
    /// `[n_templates, n_stations, n_components]`, and `weights` is either
    /// shared (`[n_stations, n_components]`) or per template.
    pub fn new(
        templates: Vec<f32>,
        moveouts: Vec<i32>,
        weights: Vec<f32>,
        n_stations: usize,
        n_components: usize,
        n_samples_template: usize,
    ) -> MatchedFilterResult<Self> {
        let n_channels = checked_len(&[n_stations, n_components], "channel count")?;
        if n_channels == 0 || n_samples_template == 0 {
            return Err(MatchedFilterError::InvalidInput(
                "template bank needs at least one channel and one sample",
            ));
        }
        let per_template = checked_len(&[n_channels, n_samples_template], "template size")?;
        if templates.len() % per_template != 0 {
            return Err(MatchedFilterError::DimensionMismatch {
                buffer: "templates",
                expected: (templates.len() / per_template + 1) * per_template,
                got: templates.len(),
            });
        }
        let n_templates = templates.len() / per_template;

        let table_len = n_templates * n_channels;
        if moveouts.len() != table_len {
            return Err(MatchedFilterError::DimensionMismatch {
                buffer: "moveouts",
                expected: table_len,
                got: moveouts.len(),
            });
        }
        if weights.len() != n_channels && weights.len() != table_len {
            return Err(MatchedFilterError::DimensionMismatch {
                buffer: "weights",
                expected: n_channels,
                got: weights.len(),
            });
        }

        let sum_square = sum_square_templates(&templates, n_samples_template)?;
        Ok(Self {
            templates,
            sum_square,
            moveouts,
            weights,
            n_templates,
            n_stations,
            n_components,
            n_samples_template,
        })
    }

    /// Replaces the computed energies with caller-provided ones.
    pub fn with_sum_square(mut self, sum_square: Vec<f32>) -> MatchedFilterResult<Self> {
        if sum_square.len() != self.sum_square.len() {
            return Err(MatchedFilterError::DimensionMismatch {
                buffer: "sum_square_templates",
                expected: self.sum_square.len(),
                got: sum_square.len(),
            });
        }
        self.sum_square = sum_square;
        Ok(self)
    }

    pub fn n_templates(&self) -> usize {
        self.n_templates
    }

    pub fn n_stations(&self) -> usize {
        self.n_stations
    }

    pub fn n_components(&self) -> usize {
        self.n_components
    }

    pub fn n_samples_template(&self) -> usize {
        self.n_samples_template
    }

    /// Template waveforms in row-major order.
    pub fn templates(&self) -> &[f32] {
        &self.templates
    }

    /// Per-channel template energies.
    pub fn sum_square(&self) -> &[f32] {
        &self.sum_square
    }

    pub fn moveouts(&self) -> &[i32] {
        &self.moveouts
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Largest usable moveout for data of the given length.
    pub fn max_moveout(&self, n_samples_data: usize) -> usize {
        max_moveout(&self.moveouts, self.n_samples_template, n_samples_data)
    }

    /// Number of valid offsets for data of the given length.
    pub fn correlation_len(&self, n_samples_data: usize, step: usize) -> usize {
        correlation_len(
            n_samples_data,
            self.n_samples_template,
            self.max_moveout(n_samples_data),
            step,
        )
    }

    /// Borrows the bank together with a data buffer as engine inputs.
    pub fn inputs<'a>(
        &'a self,
        data: &'a [f32],
        n_samples_data: usize,
        n_corr: usize,
    ) -> MatchedFilterInputs<'a> {
        MatchedFilterInputs {
            templates: &self.templates,
            sum_square_templates: &self.sum_square,
            moveouts: &self.moveouts,
            data,
            weights: &self.weights,
            dims: Dimensions {
                n_templates: self.n_templates,
                n_stations: self.n_stations,
                n_components: self.n_components,
                n_samples_template: self.n_samples_template,
                n_samples_data,
                n_corr,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TemplateBank;
    use crate::util::MatchedFilterError;

    #[test]
    fn bank_derives_template_count_and_energies() {
        let templates = vec![1.0f32, 1.0, 2.0, 0.0, 0.0, 3.0, 1.0, 1.0];
        let bank = TemplateBank::new(templates, vec![0, 1, 2, 3], vec![1.0, 1.0], 1, 2, 2).unwrap();
        assert_eq!(bank.n_templates(), 2);
        assert_eq!(bank.sum_square(), &[2.0, 4.0, 9.0, 2.0]);
        assert_eq!(bank.max_moveout(10), 3);
        assert_eq!(bank.correlation_len(10, 1), 6);
    }

    #[test]
    fn bank_rejects_mismatched_moveouts() {
        let err = TemplateBank::new(vec![1.0; 4], vec![0; 3], vec![1.0; 2], 1, 2, 2)
            .err()
            .unwrap();
        assert_eq!(
            err,
            MatchedFilterError::DimensionMismatch {
                buffer: "moveouts",
                expected: 2,
                got: 3,
            }
        );
    }

    #[test]
    fn caller_energies_must_match_channel_count() {
        let bank = TemplateBank::new(vec![1.0; 4], vec![0; 2], vec![1.0; 2], 1, 2, 2).unwrap();
        assert!(bank.clone().with_sum_square(vec![2.0, 2.0]).is_ok());
        assert!(bank.with_sum_square(vec![2.0]).is_err());
    }
}
