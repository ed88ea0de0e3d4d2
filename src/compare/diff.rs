//! Diff artifact rendering.
//!
//! Differing pixels are painted an opaque overlay color; the rest of the
//! baseline is shown as muted grayscale, darker where a region was excluded.

use crate::compare::{PixelClass, PixelDiff};
use crate::image::{luma, ImageView, OwnedImage, Rgba};
use crate::util::{VtError, VtResult};

/// Overlay color for differing pixels.
pub const DIFF_COLOR: Rgba = [255, 0, 0, 255];

fn muted(px: Rgba) -> Rgba {
    let l = luma(px) as u16;
    let v = ((l + 2 * 255) / 3) as u8;
    [v, v, v, 255]
}

fn dimmed(px: Rgba) -> Rgba {
    let l = luma(px) as u16;
    let v = (l / 3 + 64) as u8;
    [v, v, v, 255]
}

/// Renders the diff image for `baseline` from a finished comparison.
pub fn render_diff(baseline: ImageView<'_, Rgba>, diff: &PixelDiff) -> VtResult<OwnedImage> {
    let (width, height) = baseline.dimensions();
    if (diff.width(), diff.height()) != (width, height) {
        return Err(VtError::InternalFailure(format!(
            "diff is {}x{} but baseline is {width}x{height}",
            diff.width(),
            diff.height()
        )));
    }

    let mut out = Vec::with_capacity(width * height);
    for (y, classes) in diff.classes().chunks(width).enumerate() {
        let row = baseline.row(y).ok_or(VtError::BufferTooSmall {
            needed: (y + 1) * baseline.stride(),
            got: baseline.as_slice().len(),
        })?;
        out.extend(row.iter().zip(classes).map(|(&px, class)| match class {
            PixelClass::Differing => DIFF_COLOR,
            PixelClass::Same => muted(px),
            PixelClass::Excluded => dimmed(px),
        }));
    }
    OwnedImage::new(out, width, height)
}

#[cfg(test)]
mod tests {
    use super::{render_diff, DIFF_COLOR};
    use crate::compare::{compare_images, ComparisonConfig};
    use crate::image::OwnedImage;
    use crate::region::Rect;

    #[test]
    fn differing_pixels_use_overlay_and_rest_is_gray() {
        let base = OwnedImage::filled(3, 2, [10, 200, 30, 255]).unwrap();
        let cand = OwnedImage::from_fn(3, 2, |x, y| {
            if (x, y) == (1, 0) {
                [250, 0, 0, 255]
            } else {
                [10, 200, 30, 255]
            }
        })
        .unwrap();
        let cfg = ComparisonConfig::new(0, 0).with_excluded_regions(vec![Rect::new(2, 1, 2, 1)]);
        let cmp = compare_images(base.view(), cand.view(), &cfg, false).unwrap();
        let img = render_diff(base.view(), &cmp.diff).unwrap();

        assert_eq!(img.pixel(1, 0), Some(DIFF_COLOR));
        let same = img.pixel(0, 0).unwrap();
        let excluded = img.pixel(2, 1).unwrap();
        assert_eq!(same[0], same[1]);
        assert_eq!(same[1], same[2]);
        assert!(excluded[0] < same[0]);
    }

    #[test]
    fn rendering_is_deterministic() {
        let base = OwnedImage::from_fn(8, 8, |x, y| [(x * 30) as u8, (y * 30) as u8, 0, 255]).unwrap();
        let cand = OwnedImage::from_fn(8, 8, |x, y| [(x * 31) as u8, (y * 30) as u8, 0, 255]).unwrap();
        let cmp = compare_images(base.view(), cand.view(), &ComparisonConfig::new(0, 3), false).unwrap();
        let a = render_diff(base.view(), &cmp.diff).unwrap();
        let b = render_diff(base.view(), &cmp.diff).unwrap();
        assert_eq!(a, b);
    }
}
