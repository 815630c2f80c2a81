//! SIMD kernel using the `wide` crate.
//!
//! The window loop processes 8 samples at a time with `f32x8`. Lane partial
//! sums are reduced lane 0 through lane 7, then the scalar tail is added, so
//! results differ from [`ScalarKernel`](crate::kernel::scalar::ScalarKernel)
//! only by summation order.

use crate::kernel::{normalized_score, Kernel};
use wide::f32x8;

const LANES: usize = 8;

/// Load 8 f32 values into f32x8.
#[inline]
fn load_f32x8(slice: &[f32]) -> f32x8 {
    f32x8::from([
        slice[0], slice[1], slice[2], slice[3], slice[4], slice[5], slice[6], slice[7],
    ])
}

/// Horizontal sum of f32x8.
#[inline]
fn hsum(v: f32x8) -> f32 {
    let arr = v.to_array();
    arr[0] + arr[1] + arr[2] + arr[3] + arr[4] + arr[5] + arr[6] + arr[7]
}

/// SIMD-accelerated correlation kernel.
pub struct SimdKernel;

impl Kernel for SimdKernel {
    const NAME: &'static str = "simd";

    fn correlate(template: &[f32], sum_square_template: f32, window: &[f32]) -> f32 {
        let len = template.len().min(window.len());
        let simd_end = len / LANES * LANES;

        let mut dot_vec = f32x8::ZERO;
        let mut sum_w2_vec = f32x8::ZERO;

        let mut idx = 0;
        while idx < simd_end {
            let tpl_vals = load_f32x8(&template[idx..]);
            let win_vals = load_f32x8(&window[idx..]);
            dot_vec += tpl_vals * win_vals;
            sum_w2_vec += win_vals * win_vals;
            idx += LANES;
        }

        let mut dot_s = 0.0f32;
        let mut sum_w2_s = 0.0f32;
        while idx < len {
            let w = window[idx];
            dot_s += template[idx] * w;
            sum_w2_s += w * w;
            idx += 1;
        }

        let dot = hsum(dot_vec) + dot_s;
        let sum_w2 = hsum(sum_w2_vec) + sum_w2_s;
        normalized_score(dot, sum_square_template, sum_w2)
    }
}
