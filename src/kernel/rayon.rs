//! Rayon-parallel scan (feature-gated).
//!
//! Rows of placements are distributed across threads and the per-row winners
//! are reduced with the same total ordering as the sequential scan.

use crate::candidate::topk::{better_peak, Peak};
use crate::kernel::{placement_range, Kernel};
use crate::util::VtResult;
use crate::ImageView;
use rayon::prelude::*;

/// Row-parallel counterpart of [`crate::kernel::scan_full`].
pub fn scan_full_par<K: Kernel>(
    image: ImageView<'_, K::Pixel>,
    plan: &K::Plan,
) -> VtResult<Option<Peak>> {
    let (max_x, max_y) = placement_range(image.dimensions(), K::plan_size(plan))?;
    Ok((0..=max_y)
        .into_par_iter()
        .filter_map(|y| K::best_in_row(image, plan, y, max_x))
        .reduce_with(better_peak))
}
