//! Best-peak tracking for template placements.

use std::cmp::Ordering;

/// Scored placement of a template's top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Peak {
    /// X coordinate (column) of the placement.
    pub x: usize,
    /// Y coordinate (row) of the placement.
    pub y: usize,
    /// Higher is better; the scale depends on the metric.
    pub score: f64,
}

/// Orders peaks best-first: higher score, then row-major scan order.
pub(crate) fn peak_cmp_desc(a: &Peak, b: &Peak) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.y.cmp(&b.y))
        .then_with(|| a.x.cmp(&b.x))
}

/// Returns the better of two peaks under `peak_cmp_desc`.
///
/// The ordering is total, so folding any partition of peaks with this
/// function selects the same winner.
pub(crate) fn better_peak(a: Peak, b: Peak) -> Peak {
    if peak_cmp_desc(&b, &a) == Ordering::Less {
        b
    } else {
        a
    }
}

/// Running best over a stream of peaks.
#[derive(Default)]
pub(crate) struct BestPeak {
    best: Option<Peak>,
}

impl BestPeak {
    pub(crate) fn push(&mut self, peak: Peak) {
        self.best = Some(match self.best {
            Some(current) => better_peak(current, peak),
            None => peak,
        });
    }

    pub(crate) fn into_inner(self) -> Option<Peak> {
        self.best
    }
}
