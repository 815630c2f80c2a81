//! Per-window correlation kernels.
//!
//! A kernel scores one template channel against one equal-length data
//! window. The engine owns everything around it (moveout shifts, bounds,
//! weighting), so kernels only differ in how they accumulate the dot
//! product and the window energy.

/// Kernel trait for single-window normalized cross-correlation.
pub trait Kernel {
    /// Short name used in trace output.
    const NAME: &'static str;

    /// Returns `dot(template, window) / sqrt(sum_square_template * sum(window^2))`.
    ///
    /// `template` and `window` have equal length. Returns 0 when either
    /// energy is not positive or the quotient is not finite.
    fn correlate(template: &[f32], sum_square_template: f32, window: &[f32]) -> f32;
}

/// Normalizes a dot product by the two channel energies.
///
/// The square roots are taken separately so that tiny or huge energies do
/// not under- or overflow in the product.
#[inline]
pub(crate) fn normalized_score(dot: f32, sum_square_template: f32, sum_square_window: f32) -> f32 {
    if sum_square_template.is_nan()
        || sum_square_window.is_nan()
        || sum_square_template <= 0.0
        || sum_square_window <= 0.0
    {
        return 0.0;
    }
    let denom = sum_square_template.sqrt() * sum_square_window.sqrt();
    let score = dot / denom;
    if score.is_finite() {
        score
    } else {
        0.0
    }
}

pub mod scalar;

#[cfg(feature = "simd")]
pub mod simd;

#[cfg(feature = "rayon")]
pub(crate) mod rayon;

#[cfg(test)]
mod tests {
    use super::normalized_score;

    #[test]
    fn zero_energy_yields_zero() {
        assert_eq!(normalized_score(1.0, 0.0, 4.0), 0.0);
        assert_eq!(normalized_score(1.0, 4.0, 0.0), 0.0);
        assert_eq!(normalized_score(1.0, f32::NAN, 4.0), 0.0);
    }

    #[test]
    fn extreme_energies_stay_finite() {
        let score = normalized_score(1e-30, 1e-30, 1e-30);
        assert!((score - 1.0).abs() < 1e-5);
        let score = normalized_score(1e30, 1e30, 1e30);
        assert!((score - 1.0).abs() < 1e-5);
    }
}
