//! matchedfilter is a CPU matched-filter library for multi-station,
//! multi-component waveform data.
//!
//! Each template is slid along continuous data; at every evaluated offset the
//! normalized cross-correlation of each moveout-shifted channel is combined
//! into a weighted average. The scalar kernel is the reference; the `simd`
//! feature switches the default kernel to `wide::f32x8`, and the `rayon`
//! feature lets the engine fan the (template, offset) grid out over threads.
//!
//! ```
//! use matchedfilter::{matched_filter, sum_square_templates};
//!
//! let template = [1.0f32, 1.0, 1.0, 1.0];
//! let data = [0.0f32, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0];
//! let sum_square = sum_square_templates(&template, 4).unwrap();
//! let mut cc = vec![0.0f32; 7];
//! matched_filter(
//!     &template, &sum_square, &[0], &data, &[1.0], 1, 4, 10, 1, 1, 1, 7, &mut cc,
//! )
//! .unwrap();
//! assert!((cc[2] - 1.0).abs() < 1e-6);
//! ```

pub mod detect;
pub mod engine;
pub mod kernel;
pub mod lowlevel;
pub mod template;
mod trace;
pub mod util;
pub mod waveform;

pub use detect::{
    detect_all, detect_row, extract_waveforms, DetectConfig, Detection, Threshold,
};
pub use engine::{
    matched_filter, ComputeReport, CorrelationEngine, Dimensions, EngineConfig,
    MatchedFilterInputs, WeightLayout,
};
pub use template::{correlation_len, max_moveout, sum_square_templates, TemplateBank};
pub use util::{MatchedFilterError, MatchedFilterResult};
