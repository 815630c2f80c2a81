//! Template energy precomputation.

use crate::util::{MatchedFilterError, MatchedFilterResult};

/// Computes the per-channel sum of squared samples of a template buffer.
///
/// `templates` is split into consecutive rows of `n_samples_template`
/// samples; each row yields one entry. Sums are accumulated in `f64` and
/// narrowed once, so the result does not depend on template length the way an
/// `f32` running sum would.
pub fn sum_square_templates(
    templates: &[f32],
    n_samples_template: usize,
) -> MatchedFilterResult<Vec<f32>> {
    if n_samples_template == 0 {
        return Err(MatchedFilterError::InvalidInput(
            "n_samples_template must be positive to split template channels",
        ));
    }
    if templates.len() % n_samples_template != 0 {
        let channels = templates.len() / n_samples_template + 1;
        return Err(MatchedFilterError::DimensionMismatch {
            buffer: "templates",
            expected: channels * n_samples_template,
            got: templates.len(),
        });
    }
    Ok(templates
        .chunks_exact(n_samples_template)
        .map(|row| {
            row.iter()
                .map(|&v| {
                    let v = v as f64;
                    v * v
                })
                .sum::<f64>() as f32
        })
        .collect())
}
