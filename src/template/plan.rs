//! Template plan precomputation for SSD and ZNCC metrics.

use crate::image::{luma, ImageView, Rgba};
use crate::util::{VtError, VtResult};

fn rows<'a>(tpl: ImageView<'a, Rgba>) -> impl Iterator<Item = VtResult<&'a [Rgba]>> + 'a {
    (0..tpl.height()).map(move |y| {
        tpl.row(y).ok_or(VtError::BufferTooSmall {
            needed: (y + 1).saturating_mul(tpl.stride()),
            got: tpl.as_slice().len(),
        })
    })
}

/// Interleaved RGBA bytes of a template, one contiguous row after another.
pub struct SsdTemplatePlan {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl SsdTemplatePlan {
    /// Builds a plan from a template view.
    pub fn from_view(tpl: ImageView<'_, Rgba>) -> VtResult<Self> {
        let (width, height) = tpl.dimensions();
        let mut data = Vec::with_capacity(width * height * 4);
        for row in rows(tpl) {
            data.extend_from_slice(row?.as_flattened());
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of channel samples compared per placement.
    pub fn sample_count(&self) -> usize {
        self.data.len()
    }

    /// Returns the channel bytes of row `y` (length `width * 4`).
    pub fn row(&self, y: usize) -> &[u8] {
        let len = self.width * 4;
        &self.data[y * len..(y + 1) * len]
    }
}

/// Precomputed zero-mean luma template for normalized cross-correlation.
pub struct ZnccTemplatePlan {
    width: usize,
    height: usize,
    mean: f64,
    var_t: f64,
    t_prime: Vec<f64>,
}

impl ZnccTemplatePlan {
    /// Builds a plan from a template view; flat templates are rejected.
    pub fn from_view(tpl: ImageView<'_, Rgba>) -> VtResult<Self> {
        let (width, height) = tpl.dimensions();
        let mut values = Vec::with_capacity(width * height);
        for row in rows(tpl) {
            values.extend(row?.iter().map(|&px| luma(px) as f64));
        }

        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let t_prime: Vec<f64> = values.iter().map(|v| v - mean).collect();
        let var_t: f64 = t_prime.iter().map(|v| v * v).sum();
        if var_t <= 1e-8 {
            return Err(VtError::InvalidParameter(
                "template has zero variance; the zncc metric cannot score it".to_string(),
            ));
        }

        Ok(Self {
            width,
            height,
            mean,
            var_t,
            t_prime,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Mean luma of the template.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sum of squared deviations from the mean.
    pub fn var_t(&self) -> f64 {
        self.var_t
    }

    /// Zero-mean luma values in row-major order.
    pub fn t_prime(&self) -> &[f64] {
        &self.t_prime
    }
}
