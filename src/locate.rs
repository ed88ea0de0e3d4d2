//! Relative location of two templates inside one container.

use crate::image::Rgba;
use crate::region::Rect;
use crate::search::{MatchResult, Matcher};
use crate::trace::trace_span;
use crate::util::VtResult;
use crate::ImageView;
use serde::{Deserialize, Serialize};

/// Pixel displacement from the main match to the relative match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offset {
    pub dx: i64,
    pub dy: i64,
}

/// Where the relative match sits with respect to the main match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelativePosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Left,
    Right,
    Above,
    Below,
    Overlapping,
}

impl RelativePosition {
    /// Classifies `relative` against `main` by box separation on each axis.
    pub fn classify(main: &Rect, relative: &Rect) -> Self {
        if main.intersects(relative) {
            return RelativePosition::Overlapping;
        }
        let left = relative.x2 < main.x1;
        let right = relative.x1 > main.x2;
        let above = relative.y2 < main.y1;
        let below = relative.y1 > main.y2;
        match (left, right, above, below) {
            (true, _, true, _) => RelativePosition::TopLeft,
            (_, true, true, _) => RelativePosition::TopRight,
            (true, _, _, true) => RelativePosition::BottomLeft,
            (_, true, _, true) => RelativePosition::BottomRight,
            (true, _, _, _) => RelativePosition::Left,
            (_, true, _, _) => RelativePosition::Right,
            (_, _, true, _) => RelativePosition::Above,
            _ => RelativePosition::Below,
        }
    }
}

/// Outcome of locating two templates in one container.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Location {
    pub main_match: MatchResult,
    pub relative_match: MatchResult,
    /// Present iff both templates were found.
    pub relative_offset: Option<Offset>,
    /// Present iff both templates were found.
    pub relative_position: Option<RelativePosition>,
}

/// Finds `main` and `relative` in `container` and relates the two matches.
///
/// A template that is not found is reported through its `MatchResult`; only
/// invalid inputs are errors.
pub fn locate(
    matcher: &Matcher,
    container: ImageView<'_, Rgba>,
    main: ImageView<'_, Rgba>,
    relative: ImageView<'_, Rgba>,
) -> VtResult<Location> {
    let _span = trace_span!("locate").entered();
    let main_match = matcher.find(container, main)?;
    let relative_match = matcher.find(container, relative)?;

    let (relative_offset, relative_position) =
        match (main_match.bounding_box, relative_match.bounding_box) {
            (Some(m), Some(r)) => (
                Some(Offset {
                    dx: r.x1 - m.x1,
                    dy: r.y1 - m.y1,
                }),
                Some(RelativePosition::classify(&m, &r)),
            ),
            _ => (None, None),
        };

    Ok(Location {
        main_match,
        relative_match,
        relative_offset,
        relative_position,
    })
}
