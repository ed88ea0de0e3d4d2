//! Exhaustive template search.
//!
//! Every placement of the child inside the parent is scored; the best one is
//! turned into a confidence in `[0, 100]` and accepted when it reaches the
//! configured threshold. A rejected match is a normal `found == false` result.

use crate::candidate::topk::Peak;
use crate::image::{luma_plane, Rgba};
use crate::kernel::scalar::ZnccScalar;
use crate::kernel::{placement_range, scan_full, Kernel};
use crate::region::Rect;
use crate::template::{SsdTemplatePlan, ZnccTemplatePlan};
use crate::trace::{trace_event, trace_span};
use crate::util::VtResult;
use crate::ImageView;
use serde::{Deserialize, Serialize};

#[cfg(not(feature = "simd"))]
use crate::kernel::scalar::SsdScalar as Ssd;
#[cfg(feature = "simd")]
use crate::kernel::simd::SsdSimd as Ssd;

/// Default confidence a match must reach to count as found.
pub const DEFAULT_ACCEPTANCE_THRESHOLD: f64 = 95.0;

/// Placement scoring metric.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Sum of squared RGBA differences; confidence `100 * (1 - rms / 255)`.
    #[default]
    Ssd,
    /// Zero-mean normalized cross-correlation on luma; confidence `100 * max(r, 0)`.
    Zncc,
}

/// Configuration for template search.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchConfig {
    pub metric: Metric,
    /// Minimum confidence for `found`, in `[0, 100]`.
    pub acceptance_threshold: f64,
    /// Scan rows in parallel when the `rayon` feature is enabled.
    pub parallel: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            metric: Metric::Ssd,
            acceptance_threshold: DEFAULT_ACCEPTANCE_THRESHOLD,
            parallel: true,
        }
    }
}

/// Outcome of one template search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchResult {
    pub found: bool,
    pub confidence: f64,
    /// Inclusive bounding box in parent coordinates; present iff `found`.
    pub bounding_box: Option<Rect>,
}

impl MatchResult {
    /// A not-found result carrying the best confidence seen.
    pub fn not_found(confidence: f64) -> Self {
        Self {
            found: false,
            confidence,
            bounding_box: None,
        }
    }

    /// Top-left corner of the match, if found.
    pub fn top_left(&self) -> Option<(i64, i64)> {
        self.bounding_box.map(|rect| (rect.x1, rect.y1))
    }
}

/// Best placement before thresholding.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub x: usize,
    pub y: usize,
    pub confidence: f64,
}

fn ssd_confidence(sse: f64, samples: usize) -> f64 {
    let rms = (sse / samples as f64).sqrt();
    (100.0 * (1.0 - rms / 255.0)).clamp(0.0, 100.0)
}

fn zncc_confidence(score: f64) -> f64 {
    (100.0 * score.clamp(0.0, 1.0)).clamp(0.0, 100.0)
}

fn run_scan<K: Kernel>(
    image: ImageView<'_, K::Pixel>,
    plan: &K::Plan,
    parallel: bool,
) -> VtResult<Option<Peak>> {
    #[cfg(feature = "rayon")]
    {
        if parallel {
            return crate::kernel::rayon::scan_full_par::<K>(image, plan);
        }
    }
    let _ = parallel;
    scan_full::<K>(image, plan)
}

/// Template matcher; holds configuration only.
#[derive(Clone, Debug, Default)]
pub struct Matcher {
    cfg: MatchConfig,
}

impl Matcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, cfg: MatchConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn config(&self) -> &MatchConfig {
        &self.cfg
    }

    /// Finds the best placement of `child` in `parent` regardless of threshold.
    ///
    /// Returns `None` only when no placement can be scored (ZNCC over a flat
    /// parent). A child larger than the parent is an `InvalidParameter` error.
    pub fn best_placement(
        &self,
        parent: ImageView<'_, Rgba>,
        child: ImageView<'_, Rgba>,
    ) -> VtResult<Option<Placement>> {
        placement_range(parent.dimensions(), child.dimensions())?;
        let _span = trace_span!(
            "template_scan",
            parent_w = parent.width(),
            parent_h = parent.height(),
            child_w = child.width(),
            child_h = child.height(),
        )
        .entered();

        let placement = match self.cfg.metric {
            Metric::Ssd => {
                let plan = SsdTemplatePlan::from_view(child)?;
                run_scan::<Ssd>(parent, &plan, self.cfg.parallel)?.map(|peak| Placement {
                    x: peak.x,
                    y: peak.y,
                    confidence: ssd_confidence(-peak.score, plan.sample_count()),
                })
            }
            Metric::Zncc => {
                let plan = ZnccTemplatePlan::from_view(child)?;
                let plane = luma_plane(parent);
                let plane_view = ImageView::from_slice(&plane, parent.width(), parent.height())?;
                run_scan::<ZnccScalar>(plane_view, &plan, self.cfg.parallel)?.map(|peak| {
                    Placement {
                        x: peak.x,
                        y: peak.y,
                        confidence: zncc_confidence(peak.score),
                    }
                })
            }
        };
        Ok(placement)
    }

    /// Searches `parent` for `child` and applies the acceptance threshold.
    pub fn find(
        &self,
        parent: ImageView<'_, Rgba>,
        child: ImageView<'_, Rgba>,
    ) -> VtResult<MatchResult> {
        let Some(best) = self.best_placement(parent, child)? else {
            return Ok(MatchResult::not_found(0.0));
        };
        trace_event!("template_best", x = best.x, y = best.y, confidence = best.confidence);

        if best.confidence < self.cfg.acceptance_threshold {
            return Ok(MatchResult::not_found(best.confidence));
        }
        Ok(MatchResult {
            found: true,
            confidence: best.confidence,
            bounding_box: Some(Rect::from_origin_size(
                best.x,
                best.y,
                child.width(),
                child.height(),
            )),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ssd_confidence, zncc_confidence, MatchConfig, Matcher, Metric};
    use crate::image::OwnedImage;
    use crate::region::Rect;
    use crate::util::ErrorKind;

    fn scene() -> OwnedImage {
        OwnedImage::from_fn(40, 30, |x, y| {
            let v = ((x * 13) ^ (y * 7) ^ (x * y)) as u8;
            [v, v.wrapping_add(40), 255 - v, 255]
        })
        .unwrap()
    }

    #[test]
    fn confidence_scales_are_bounded() {
        assert_eq!(ssd_confidence(0.0, 16), 100.0);
        assert_eq!(ssd_confidence(255.0 * 255.0 * 16.0, 16), 0.0);
        assert_eq!(zncc_confidence(1.0), 100.0);
        assert_eq!(zncc_confidence(-0.4), 0.0);
    }

    #[test]
    fn exact_crop_is_found_at_origin() {
        let parent = scene();
        let child = parent.crop(11, 7, 9, 6).unwrap();
        let result = Matcher::new()
            .with_config(MatchConfig {
                parallel: false,
                ..MatchConfig::default()
            })
            .find(parent.view(), child.view())
            .unwrap();
        assert!(result.found);
        assert_eq!(result.confidence, 100.0);
        assert_eq!(result.bounding_box, Some(Rect::new(11, 7, 19, 12)));
    }

    #[test]
    fn zncc_finds_exact_crop() {
        let parent = scene();
        let child = parent.crop(20, 3, 8, 8).unwrap();
        let result = Matcher::new()
            .with_config(MatchConfig {
                metric: Metric::Zncc,
                parallel: false,
                ..MatchConfig::default()
            })
            .find(parent.view(), child.view())
            .unwrap();
        assert!(result.found);
        assert!(result.confidence > 99.99);
        assert_eq!(result.top_left(), Some((20, 3)));
    }

    #[test]
    fn unrelated_child_is_not_found() {
        let parent = OwnedImage::filled(20, 20, [255, 255, 255, 255]).unwrap();
        let child = OwnedImage::filled(4, 4, [0, 0, 0, 255]).unwrap();
        let result = Matcher::new().find(parent.view(), child.view()).unwrap();
        assert!(!result.found);
        assert!(result.bounding_box.is_none());
        // Three of four channels are maximally off: rms = 255 * sqrt(3/4).
        assert!((result.confidence - 13.40).abs() < 0.01);
    }

    #[test]
    fn child_larger_than_parent_is_invalid() {
        let parent = OwnedImage::filled(5, 5, [0, 0, 0, 255]).unwrap();
        let child = OwnedImage::filled(6, 2, [0, 0, 0, 255]).unwrap();
        let err = Matcher::new().find(parent.view(), child.view()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    }
}
