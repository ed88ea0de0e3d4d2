//! Pixel comparison under a noise tolerance and an exclusion mask.
//!
//! A pixel differs when the largest absolute RGBA channel delta exceeds the
//! tolerance. Excluded pixels are never counted. The differing-pixel count is a
//! sum of per-row integer counts, so row-parallel evaluation yields the same
//! result as the sequential loop.

use crate::image::{ImageView, Rgba};
use crate::region::{ExclusionMask, Rect};
use crate::trace::{trace_event, trace_span};
use crate::util::{VtError, VtResult};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

pub mod diff;

/// Opaque caller metadata, echoed verbatim in every response.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Minimum similarity used when a front end leaves it unset.
pub const DEFAULT_MIN_SIMILARITY: i32 = 95;
/// Noise tolerance used when a front end leaves it unset.
pub const DEFAULT_NOISE_TOLERANCE: i32 = 20;

/// Parameters of one comparison request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComparisonConfig {
    /// Minimum similarity percentage for `passed`, in `[0, 100]`.
    pub min_similarity: i32,
    /// Largest per-channel delta still treated as equal, in `[0, 255]`.
    pub noise_tolerance: i32,
    pub excluded_regions: Vec<Rect>,
    pub metadata: Metadata,
}

impl ComparisonConfig {
    pub fn new(min_similarity: i32, noise_tolerance: i32) -> Self {
        Self {
            min_similarity,
            noise_tolerance,
            ..Self::default()
        }
    }

    pub fn with_excluded_regions(mut self, regions: Vec<Rect>) -> Self {
        self.excluded_regions = regions;
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Checks ranges and returns `(min_similarity, noise_tolerance)`.
    pub fn validate(&self) -> VtResult<(f64, u8)> {
        if !(0..=100).contains(&self.min_similarity) {
            return Err(VtError::InvalidParameter(format!(
                "min similarity {} is outside [0, 100]",
                self.min_similarity
            )));
        }
        let tolerance = u8::try_from(self.noise_tolerance).map_err(|_| {
            VtError::InvalidParameter(format!(
                "noise tolerance {} is outside [0, 255]",
                self.noise_tolerance
            ))
        })?;
        Ok((self.min_similarity as f64, tolerance))
    }
}

/// Per-pixel outcome of a comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelClass {
    Same,
    Differing,
    Excluded,
}

/// Full per-pixel comparison of two equally sized images.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelDiff {
    width: usize,
    height: usize,
    classes: Vec<PixelClass>,
    diff_pixel_count: u64,
    excluded_pixel_count: u64,
}

impl PixelDiff {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn classes(&self) -> &[PixelClass] {
        &self.classes
    }

    pub fn class_at(&self, x: usize, y: usize) -> Option<PixelClass> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.classes.get(y * self.width + x).copied()
    }

    pub fn diff_pixel_count(&self) -> u64 {
        self.diff_pixel_count
    }

    pub fn excluded_pixel_count(&self) -> u64 {
        self.excluded_pixel_count
    }

    pub fn total_pixel_count(&self) -> u64 {
        (self.width * self.height) as u64
    }

    /// Pixels that took part in the comparison.
    pub fn considered_pixel_count(&self) -> u64 {
        self.total_pixel_count() - self.excluded_pixel_count
    }

    /// Percentage of considered pixels that do not differ; 100 when none are considered.
    pub fn similarity(&self) -> f64 {
        let considered = self.considered_pixel_count();
        if considered == 0 {
            return 100.0;
        }
        100.0 * (1.0 - self.diff_pixel_count as f64 / considered as f64)
    }
}

/// Summary of a comparison without the diff artifact.
#[derive(Clone, Debug, PartialEq)]
pub struct Comparison {
    pub diff: PixelDiff,
    pub obtained_similarity: f64,
    pub passed: bool,
}

#[inline]
fn max_channel_delta(a: Rgba, b: Rgba) -> u8 {
    a.iter()
        .zip(b.iter())
        .map(|(&p, &q)| p.abs_diff(q))
        .max()
        .unwrap_or(0)
}

fn classify_row(
    baseline: &[Rgba],
    candidate: &[Rgba],
    mask: &[bool],
    tolerance: u8,
    out: &mut [PixelClass],
) -> u64 {
    let mut differing = 0u64;
    for (((&b, &c), &skip), class) in baseline
        .iter()
        .zip(candidate.iter())
        .zip(mask.iter())
        .zip(out.iter_mut())
    {
        *class = if skip {
            PixelClass::Excluded
        } else if max_channel_delta(b, c) > tolerance {
            differing += 1;
            PixelClass::Differing
        } else {
            PixelClass::Same
        };
    }
    differing
}

fn check_dimensions(baseline: ImageView<'_, Rgba>, candidate: ImageView<'_, Rgba>) -> VtResult<()> {
    if baseline.dimensions() != candidate.dimensions() {
        return Err(VtError::DimensionMismatch {
            baseline_width: baseline.width(),
            baseline_height: baseline.height(),
            candidate_width: candidate.width(),
            candidate_height: candidate.height(),
        });
    }
    Ok(())
}

/// Classifies every pixel of `candidate` against `baseline`.
///
/// `mask` must match the image size. With the `rayon` feature and
/// `parallel == true`, rows are evaluated concurrently.
pub fn diff_pixels(
    baseline: ImageView<'_, Rgba>,
    candidate: ImageView<'_, Rgba>,
    mask: &ExclusionMask,
    tolerance: u8,
    parallel: bool,
) -> VtResult<PixelDiff> {
    check_dimensions(baseline, candidate)?;
    let (width, height) = baseline.dimensions();
    if (mask.width(), mask.height()) != (width, height) {
        return Err(VtError::InternalFailure(format!(
            "mask is {}x{} but images are {width}x{height}",
            mask.width(),
            mask.height()
        )));
    }

    let _span = trace_span!("diff_pixels", width = width, height = height, parallel = parallel)
        .entered();

    let mut classes = vec![PixelClass::Same; width * height];
    let row_count = |(y, out): (usize, &mut [PixelClass])| -> u64 {
        match (baseline.row(y), candidate.row(y), mask.row(y)) {
            (Some(b), Some(c), Some(m)) => classify_row(b, c, m, tolerance, out),
            _ => 0,
        }
    };

    #[cfg(feature = "rayon")]
    let diff_pixel_count: u64 = if parallel {
        classes.par_chunks_mut(width).enumerate().map(row_count).sum()
    } else {
        classes.chunks_mut(width).enumerate().map(row_count).sum()
    };
    #[cfg(not(feature = "rayon"))]
    let diff_pixel_count: u64 = {
        let _ = parallel;
        classes.chunks_mut(width).enumerate().map(row_count).sum()
    };

    let diff = PixelDiff {
        width,
        height,
        classes,
        diff_pixel_count,
        excluded_pixel_count: mask.excluded_count() as u64,
    };
    trace_event!(
        "pixel_diff",
        diff_pixels = diff.diff_pixel_count,
        excluded_pixels = diff.excluded_pixel_count
    );
    Ok(diff)
}

/// Validates `config`, builds the exclusion mask and compares the images.
///
/// Size mismatch is reported before any per-pixel work.
pub fn compare_images(
    baseline: ImageView<'_, Rgba>,
    candidate: ImageView<'_, Rgba>,
    config: &ComparisonConfig,
    parallel: bool,
) -> VtResult<Comparison> {
    let (min_similarity, tolerance) = config.validate()?;
    check_dimensions(baseline, candidate)?;
    let mask = ExclusionMask::build(baseline.width(), baseline.height(), &config.excluded_regions)?;
    let diff = diff_pixels(baseline, candidate, &mask, tolerance, parallel)?;
    let obtained_similarity = diff.similarity();
    Ok(Comparison {
        passed: obtained_similarity >= min_similarity,
        obtained_similarity,
        diff,
    })
}
