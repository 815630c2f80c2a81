//! Scalar reference kernel.

use crate::kernel::{normalized_score, Kernel};

/// Scalar kernel; accumulates samples strictly in index order.
pub struct ScalarKernel;

impl Kernel for ScalarKernel {
    const NAME: &'static str = "scalar";

    fn correlate(template: &[f32], sum_square_template: f32, window: &[f32]) -> f32 {
        let mut dot = 0.0f32;
        let mut sum_w2 = 0.0f32;
        for (&t, &w) in template.iter().zip(window.iter()) {
            dot += t * w;
            sum_w2 += w * w;
        }
        normalized_score(dot, sum_square_template, sum_w2)
    }
}
