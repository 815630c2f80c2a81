//! Low-level building blocks for custom pipelines.
//!
//! These expose the per-window kernels, channel views and detection
//! primitives used inside the engine. Most users should prefer
//! [`CorrelationEngine`](crate::CorrelationEngine) or the flat
//! [`matched_filter`](crate::matched_filter) entry point.

pub use crate::detect::{nms_1d, threshold_value};
pub use crate::kernel::scalar::ScalarKernel;
#[cfg(feature = "simd")]
pub use crate::kernel::simd::SimdKernel;
pub use crate::kernel::Kernel;
pub use crate::waveform::ChannelView;
