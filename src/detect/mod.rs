//! Event detection on correlation traces.
//!
//! A detection is a local maximum of one template's `cc_out` row that rises
//! strictly above a threshold, kept after 1-D non-maximum suppression. On a
//! flat top only the first sample counts as the peak. The
//! usual matched-filter threshold is a multiple of the trace's median
//! absolute deviation, which stays robust when the trace contains a few
//! strong events.

mod nms;
mod waveforms;

pub use nms::nms_1d;
pub use waveforms::extract_waveforms;

use crate::trace::trace_event;
use crate::util::math::median_abs_deviation;
use crate::util::{MatchedFilterError, MatchedFilterResult};

/// Detection threshold rule.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Threshold {
    /// Fixed correlation value.
    Absolute(f32),
    /// `factor * MAD` of the valid part of the trace.
    Mad(f32),
}

/// Configuration for detection extraction.
#[derive(Clone, Debug)]
pub struct DetectConfig {
    pub threshold: Threshold,
    /// Minimum distance, in offset indices, between kept detections; 0 and 1
    /// both disable suppression.
    pub min_separation: usize,
    /// Cap on detections per template (`None` keeps all).
    pub max_detections: Option<usize>,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            threshold: Threshold::Mad(8.0),
            min_separation: 1,
            max_detections: None,
        }
    }
}

impl DetectConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> MatchedFilterResult<()> {
        match self.threshold {
            Threshold::Absolute(value) if !value.is_finite() => Err(
                MatchedFilterError::InvalidInput("absolute threshold must be finite"),
            ),
            Threshold::Mad(factor) if !factor.is_finite() || factor <= 0.0 => Err(
                MatchedFilterError::InvalidInput("MAD factor must be finite and > 0"),
            ),
            _ => Ok(()),
        }
    }
}

/// A detected event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    /// Template that produced the detection.
    pub template_idx: usize,
    /// Offset index into the `cc_out` row.
    pub offset_idx: usize,
    /// Sample offset into the data (`offset_idx * step`).
    pub sample: usize,
    /// Weighted correlation coefficient at the peak.
    pub score: f32,
}

/// Resolves a threshold rule to a value for the given trace.
pub fn threshold_value(trace: &[f32], threshold: Threshold) -> f32 {
    match threshold {
        Threshold::Absolute(value) => value,
        Threshold::Mad(factor) => factor * median_abs_deviation(trace),
    }
}

/// Extracts detections from one template's correlation trace.
///
/// Only the first `n_valid` entries are considered; trailing sentinel zeros
/// would otherwise bias the MAD.
pub fn detect_row(
    trace: &[f32],
    template_idx: usize,
    n_valid: usize,
    step: usize,
    cfg: &DetectConfig,
) -> MatchedFilterResult<Vec<Detection>> {
    cfg.validate()?;
    let valid = &trace[..n_valid.min(trace.len())];
    if valid.is_empty() {
        return Ok(Vec::new());
    }
    let threshold = threshold_value(valid, cfg.threshold);

    let mut candidates = Vec::new();
    for (idx, &score) in valid.iter().enumerate() {
        if score <= threshold {
            continue;
        }
        let left_ok = idx == 0 || score > valid[idx - 1];
        let right_ok = idx + 1 == valid.len() || score >= valid[idx + 1];
        if left_ok && right_ok {
            candidates.push(Detection {
                template_idx,
                offset_idx: idx,
                sample: idx * step,
                score,
            });
        }
    }

    let mut kept = nms_1d(&mut candidates, cfg.min_separation);
    if let Some(max) = cfg.max_detections {
        kept.truncate(max);
    }
    trace_event!(
        "detections",
        template = template_idx,
        threshold = threshold,
        count = kept.len()
    );
    Ok(kept)
}

/// Extracts detections for every template of a `[n_templates, n_corr]` output.
pub fn detect_all(
    cc_out: &[f32],
    n_templates: usize,
    n_corr: usize,
    n_valid: usize,
    step: usize,
    cfg: &DetectConfig,
) -> MatchedFilterResult<Vec<Detection>> {
    let expected = n_templates
        .checked_mul(n_corr)
        .ok_or(MatchedFilterError::SizeOverflow { context: "cc_out" })?;
    if cc_out.len() != expected {
        return Err(MatchedFilterError::DimensionMismatch {
            buffer: "cc_out",
            expected,
            got: cc_out.len(),
        });
    }
    if n_corr == 0 {
        return Ok(Vec::new());
    }

    let mut all = Vec::new();
    for (template_idx, row) in cc_out.chunks_exact(n_corr).enumerate() {
        all.extend(detect_row(row, template_idx, n_valid, step, cfg)?);
    }
    Ok(all)
}
