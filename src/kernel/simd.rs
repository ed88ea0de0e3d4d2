//! SIMD-accelerated SSD kernel using the `wide` crate.
//!
//! The channel loop is vectorized eight samples at a time in `i32x8`. Integer
//! lanes keep the sum exact, so results match the scalar kernel bit for bit.

use crate::candidate::topk::Peak;
use crate::image::Rgba;
use crate::kernel::scalar::{row_sse_scalar, ssd_best_in_row, window_sse};
use crate::kernel::Kernel;
use crate::template::SsdTemplatePlan;
use crate::ImageView;
use wide::i32x8;

const LANES: usize = 8;

/// Lane accumulators are flushed before `FLUSH_EVERY * 255^2` can overflow `i32`.
const FLUSH_EVERY: usize = 16_384;

#[inline]
fn load_u8x8(slice: &[u8]) -> i32x8 {
    i32x8::from([
        slice[0] as i32,
        slice[1] as i32,
        slice[2] as i32,
        slice[3] as i32,
        slice[4] as i32,
        slice[5] as i32,
        slice[6] as i32,
        slice[7] as i32,
    ])
}

#[inline]
fn hsum(v: i32x8) -> u64 {
    v.to_array().iter().map(|&lane| lane as u64).sum()
}

pub(crate) fn row_sse_simd(image: &[u8], tpl: &[u8]) -> u64 {
    let len = image.len().min(tpl.len());
    let simd_end = len / LANES * LANES;

    let mut total = 0u64;
    let mut acc = i32x8::splat(0);
    let mut pending = 0usize;
    let mut i = 0;
    while i < simd_end {
        let d = load_u8x8(&image[i..]) - load_u8x8(&tpl[i..]);
        acc += d * d;
        pending += 1;
        if pending == FLUSH_EVERY {
            total += hsum(acc);
            acc = i32x8::splat(0);
            pending = 0;
        }
        i += LANES;
    }

    total + hsum(acc) + row_sse_scalar(&image[simd_end..len], &tpl[simd_end..len])
}

/// SIMD-accelerated SSD kernel over RGBA channels.
pub struct SsdSimd;

impl Kernel for SsdSimd {
    type Pixel = Rgba;
    type Plan = SsdTemplatePlan;

    fn plan_size(plan: &Self::Plan) -> (usize, usize) {
        (plan.width(), plan.height())
    }

    fn score_at(image: ImageView<'_, Rgba>, plan: &Self::Plan, x: usize, y: usize) -> f64 {
        match window_sse(image, plan, x, y, u64::MAX, row_sse_simd) {
            Some(sse) => -(sse as f64),
            None => f64::NEG_INFINITY,
        }
    }

    fn best_in_row(
        image: ImageView<'_, Rgba>,
        plan: &Self::Plan,
        y: usize,
        max_x: usize,
    ) -> Option<Peak> {
        ssd_best_in_row(image, plan, y, max_x, row_sse_simd)
    }
}
