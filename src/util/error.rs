//! Error types for matchedfilter.

use thiserror::Error;

/// Result alias for matchedfilter operations.
pub type MatchedFilterResult<T> = std::result::Result<T, MatchedFilterError>;

/// Errors that reject a call before any correlation is computed.
///
/// Recoverable per-channel conditions (out-of-range moveouts, zero-norm
/// windows, zero total weight) never surface here; they are counted in
/// [`crate::ComputeReport`] instead.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum MatchedFilterError {
    /// A buffer length does not match the declared dimensions.
    #[error("dimension mismatch for `{buffer}`: expected {expected} elements, got {got}")]
    DimensionMismatch {
        buffer: &'static str,
        expected: usize,
        got: usize,
    },
    /// A size product does not fit in `usize`.
    #[error("size overflow while computing {context}")]
    SizeOverflow { context: &'static str },
    /// The offset stride must be at least one sample.
    #[error("invalid step {step}: must be >= 1")]
    InvalidStep { step: usize },
    /// Templates cannot be longer than the data they are slid along.
    #[error("template length {n_samples_template} exceeds data length {n_samples_data}")]
    TemplateLongerThanData {
        n_samples_template: usize,
        n_samples_data: usize,
    },
    /// Channel weights must be finite and non-negative.
    #[error("invalid weight {value} at index {index}: weights must be finite and >= 0")]
    InvalidWeight { index: usize, value: f32 },
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
}
