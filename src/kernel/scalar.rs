//! Scalar reference kernels for placement scoring.

use crate::candidate::topk::Peak;
use crate::image::Rgba;
use crate::kernel::Kernel;
use crate::template::{SsdTemplatePlan, ZnccTemplatePlan};
use crate::ImageView;

/// Sum of squared differences between two equally long byte rows.
pub(crate) type RowSse = fn(&[u8], &[u8]) -> u64;

/// Scalar SSD kernel over RGBA channels.
pub struct SsdScalar;

/// Scalar ZNCC kernel over a luma plane.
pub struct ZnccScalar;

pub(crate) fn row_sse_scalar(image: &[u8], tpl: &[u8]) -> u64 {
    image
        .iter()
        .zip(tpl)
        .map(|(&a, &b)| {
            let d = a.abs_diff(b) as u64;
            d * d
        })
        .sum()
}

/// SSD of the placement at `(x, y)`, or `None` once the running sum exceeds
/// `bound`. Abandoning only on a strict excess keeps ties intact.
pub(crate) fn window_sse(
    image: ImageView<'_, Rgba>,
    plan: &SsdTemplatePlan,
    x: usize,
    y: usize,
    bound: u64,
    row_sse: RowSse,
) -> Option<u64> {
    let width = plan.width();
    let mut sse = 0u64;
    for ty in 0..plan.height() {
        let img_row = image.row(y + ty)?;
        let window = img_row.get(x..x + width)?.as_flattened();
        sse += row_sse(window, plan.row(ty));
        if sse > bound {
            return None;
        }
    }
    Some(sse)
}

pub(crate) fn ssd_best_in_row(
    image: ImageView<'_, Rgba>,
    plan: &SsdTemplatePlan,
    y: usize,
    max_x: usize,
    row_sse: RowSse,
) -> Option<Peak> {
    let mut best: Option<(usize, u64)> = None;
    for x in 0..=max_x {
        let bound = best.map_or(u64::MAX, |(_, sse)| sse);
        if let Some(sse) = window_sse(image, plan, x, y, bound, row_sse) {
            if best.map_or(true, |(_, current)| sse < current) {
                best = Some((x, sse));
            }
        }
    }
    best.map(|(x, sse)| Peak {
        x,
        y,
        score: -(sse as f64),
    })
}

impl Kernel for SsdScalar {
    type Pixel = Rgba;
    type Plan = SsdTemplatePlan;

    fn plan_size(plan: &Self::Plan) -> (usize, usize) {
        (plan.width(), plan.height())
    }

    fn score_at(image: ImageView<'_, Rgba>, plan: &Self::Plan, x: usize, y: usize) -> f64 {
        match window_sse(image, plan, x, y, u64::MAX, row_sse_scalar) {
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
        ssd_best_in_row(image, plan, y, max_x, row_sse_scalar)
    }
}

impl Kernel for ZnccScalar {
    type Pixel = u8;
    type Plan = ZnccTemplatePlan;

    fn plan_size(plan: &Self::Plan) -> (usize, usize) {
        (plan.width(), plan.height())
    }

    fn score_at(image: ImageView<'_, u8>, plan: &Self::Plan, x: usize, y: usize) -> f64 {
        let tpl_width = plan.width();
        let tpl_height = plan.height();
        let t_prime = plan.t_prime();
        let n = (tpl_width * tpl_height) as f64;

        let mut dot = 0.0f64;
        let mut sum_i = 0.0f64;
        let mut sum_i2 = 0.0f64;
        for ty in 0..tpl_height {
            let window = match image.row(y + ty).and_then(|row| row.get(x..x + tpl_width)) {
                Some(window) => window,
                None => return f64::NEG_INFINITY,
            };
            let base = ty * tpl_width;
            for (tx, &value) in window.iter().enumerate() {
                let value = value as f64;
                dot += t_prime[base + tx] * value;
                sum_i += value;
                sum_i2 += value * value;
            }
        }

        let var_i = sum_i2 - (sum_i * sum_i) / n;
        if var_i <= 1e-8 {
            return f64::NEG_INFINITY;
        }
        let score = dot / (plan.var_t() * var_i).sqrt();
        if score.is_finite() {
            score
        } else {
            f64::NEG_INFINITY
        }
    }

    fn best_in_row(
        image: ImageView<'_, u8>,
        plan: &Self::Plan,
        y: usize,
        max_x: usize,
    ) -> Option<Peak> {
        let mut best: Option<Peak> = None;
        for x in 0..=max_x {
            let score = Self::score_at(image, plan, x, y);
            if score == f64::NEG_INFINITY {
                continue;
            }
            if best.map_or(true, |peak| score > peak.score) {
                best = Some(Peak { x, y, score });
            }
        }
        best
    }
}
