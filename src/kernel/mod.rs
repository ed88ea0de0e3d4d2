//! Template scoring kernels.
//!
//! A kernel scores every placement of one template row by row and reports the
//! best placement of each row. Rows are independent, which lets the scan run
//! sequentially or in parallel with the same result.

use crate::candidate::topk::{BestPeak, Peak};
use crate::util::{VtError, VtResult};
use crate::ImageView;

/// Kernel trait for row-wise best-placement search.
pub trait Kernel {
    /// Pixel type of the searched image.
    type Pixel: Copy + Send + Sync;
    /// Precomputed template data.
    type Plan: Sync;

    /// Template `(width, height)`.
    fn plan_size(plan: &Self::Plan) -> (usize, usize);

    /// Scores the placement with top-left corner `(x, y)`.
    fn score_at(image: ImageView<'_, Self::Pixel>, plan: &Self::Plan, x: usize, y: usize) -> f64;

    /// Returns the best placement in row `y` over `x in 0..=max_x`.
    ///
    /// Ties keep the lowest `x`.
    fn best_in_row(
        image: ImageView<'_, Self::Pixel>,
        plan: &Self::Plan,
        y: usize,
        max_x: usize,
    ) -> Option<Peak>;
}

/// Returns the largest valid top-left coordinates `(max_x, max_y)`.
pub fn placement_range(
    image_size: (usize, usize),
    tpl_size: (usize, usize),
) -> VtResult<(usize, usize)> {
    let (img_width, img_height) = image_size;
    let (tpl_width, tpl_height) = tpl_size;
    if tpl_width > img_width || tpl_height > img_height {
        return Err(VtError::InvalidParameter(format!(
            "template {tpl_width}x{tpl_height} is larger than image {img_width}x{img_height}"
        )));
    }
    Ok((img_width - tpl_width, img_height - tpl_height))
}

/// Scans every valid placement and returns the best one.
pub fn scan_full<K: Kernel>(
    image: ImageView<'_, K::Pixel>,
    plan: &K::Plan,
) -> VtResult<Option<Peak>> {
    let (max_x, max_y) = placement_range(image.dimensions(), K::plan_size(plan))?;
    let mut best = BestPeak::default();
    for y in 0..=max_y {
        if let Some(peak) = K::best_in_row(image, plan, y, max_x) {
            best.push(peak);
        }
    }
    Ok(best.into_inner())
}

pub mod scalar;

#[cfg(feature = "simd")]
pub mod simd;

#[cfg(feature = "rayon")]
pub mod rayon;
