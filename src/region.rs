//! Excluded regions and the ignore mask built from them.
//!
//! Rectangles use inclusive corners and signed coordinates: negative values
//! are clamped to zero and values past the image are clamped to its last
//! row/column. A rectangle entirely outside the image contributes nothing.

use crate::util::{VtError, VtResult};
use serde::{Deserialize, Serialize};

/// Inclusive rectangle `(x1, y1)`-`(x2, y2)` in pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    #[serde(rename = "topLeftX")]
    pub x1: i64,
    #[serde(rename = "topLeftY")]
    pub y1: i64,
    #[serde(rename = "bottomRightX")]
    pub x2: i64,
    #[serde(rename = "bottomRightY")]
    pub y2: i64,
}

impl Rect {
    pub fn new(x1: i64, y1: i64, x2: i64, y2: i64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Rectangle covering `width x height` pixels from `(x, y)`.
    pub fn from_origin_size(x: usize, y: usize, width: usize, height: usize) -> Self {
        let (x, y) = (x as i64, y as i64);
        Self::new(x, y, x + width as i64 - 1, y + height as i64 - 1)
    }

    /// Returns true when both corner pairs are ordered.
    pub fn is_ordered(&self) -> bool {
        self.x1 <= self.x2 && self.y1 <= self.y2
    }

    /// Rejects a rectangle whose corners cannot be normalized.
    ///
    /// `index` is the rectangle's position in the caller's list.
    pub fn check_ordered(&self, index: usize) -> VtResult<()> {
        if self.is_ordered() {
            Ok(())
        } else {
            Err(VtError::InvalidRegion {
                index,
                reason: "top-left corner lies after bottom-right corner",
            })
        }
    }

    pub fn width(&self) -> i64 {
        self.x2 - self.x1 + 1
    }

    pub fn height(&self) -> i64 {
        self.y2 - self.y1 + 1
    }

    /// Returns true when the two rectangles share at least one pixel.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x1 <= other.x2 && other.x1 <= self.x2 && self.y1 <= other.y2 && other.y1 <= self.y2
    }

    /// Clamps an ordered rectangle to a `width x height` grid.
    ///
    /// Returns `(x1, y1, x2, y2)` as indices, or `None` when nothing of the
    /// rectangle is inside the grid.
    pub fn clamp_to(&self, width: usize, height: usize) -> Option<(usize, usize, usize, usize)> {
        if width == 0 || height == 0 || !self.is_ordered() {
            return None;
        }
        let (max_x, max_y) = (width as i64 - 1, height as i64 - 1);
        if self.x2 < 0 || self.y2 < 0 || self.x1 > max_x || self.y1 > max_y {
            return None;
        }
        Some((
            self.x1.max(0) as usize,
            self.y1.max(0) as usize,
            self.x2.min(max_x) as usize,
            self.y2.min(max_y) as usize,
        ))
    }
}

/// Parses a JSON array of rectangles and checks their corner order.
///
/// A missing or blank document is an empty set.
pub fn parse_regions(json: Option<&str>) -> VtResult<Vec<Rect>> {
    let rects: Vec<Rect> = match json.map(str::trim) {
        None | Some("") => return Ok(Vec::new()),
        Some(text) => serde_json::from_str(text)
            .map_err(|err| VtError::InvalidParameter(format!("excluded regions JSON: {err}")))?,
    };
    for (index, rect) in rects.iter().enumerate() {
        rect.check_ordered(index)?;
    }
    Ok(rects)
}

/// Boolean grid of pixels to skip during comparison.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExclusionMask {
    width: usize,
    height: usize,
    cells: Vec<bool>,
    excluded: usize,
}

impl ExclusionMask {
    /// A mask that excludes nothing.
    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width * height],
            excluded: 0,
        }
    }

    /// Rasterizes the union of `rects` over a `width x height` grid.
    ///
    /// Work is proportional to the clamped area of the rectangles.
    pub fn build(width: usize, height: usize, rects: &[Rect]) -> VtResult<Self> {
        let mut mask = Self::empty(width, height);
        for (index, rect) in rects.iter().enumerate() {
            rect.check_ordered(index)?;
            let Some((x1, y1, x2, y2)) = rect.clamp_to(width, height) else {
                continue;
            };
            for y in y1..=y2 {
                let start = y * width;
                for cell in &mut mask.cells[start + x1..=start + x2] {
                    if !*cell {
                        *cell = true;
                        mask.excluded += 1;
                    }
                }
            }
        }
        Ok(mask)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of distinct excluded pixels.
    pub fn excluded_count(&self) -> usize {
        self.excluded
    }

    pub fn is_excluded(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.cells[y * self.width + x]
    }

    /// Returns the mask cells for row `y`.
    pub fn row(&self, y: usize) -> Option<&[bool]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.width;
        self.cells.get(start..start + self.width)
    }
}
