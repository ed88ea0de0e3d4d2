//! Image buffers and borrowed views.
//!
//! `ImageView` is a borrowed 2D view into a 1D buffer with an explicit stride.
//! The stride counts elements between the starts of consecutive rows, so a
//! stride larger than the width represents padded rows. ROI slices are zero-copy
//! views into the same backing slice and retain the original stride.
//!
//! Decoded screenshots are held as `OwnedImage`, a contiguous RGBA8 buffer.

use crate::util::{VtError, VtResult};

pub mod io;

/// One RGBA8 pixel.
pub type Rgba = [u8; 4];

/// Borrowed 2D image view with an explicit stride.
#[derive(Copy, Clone)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a, T> ImageView<'a, T> {
    /// Creates a contiguous view with `stride == width`.
    pub fn from_slice(data: &'a [T], width: usize, height: usize) -> VtResult<Self> {
        Self::new(data, width, height, width)
    }

    /// Creates a view with an explicit stride.
    pub fn new(data: &'a [T], width: usize, height: usize, stride: usize) -> VtResult<Self> {
        let needed = required_len(width, height, stride)?;
        if data.len() < needed {
            return Err(VtError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in elements between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns `(width, height)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Returns the backing slice including any row padding.
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Returns the element at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y.checked_mul(self.stride)?.checked_add(x)?;
        self.data.get(idx)
    }

    /// Returns a contiguous slice for row `y` with length `width`.
    pub fn row(&self, y: usize) -> Option<&'a [T]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        let end = start.checked_add(self.width)?;
        self.data.get(start..end)
    }

    /// Returns a zero-copy ROI view into the same backing buffer.
    pub fn roi(&self, x: usize, y: usize, width: usize, height: usize) -> VtResult<ImageView<'a, T>> {
        if width == 0 || height == 0 {
            return Err(VtError::InvalidDimensions { width, height });
        }

        let out_of_bounds = VtError::RoiOutOfBounds {
            x,
            y,
            width,
            height,
            img_width: self.width,
            img_height: self.height,
        };
        let end_x = x.checked_add(width).ok_or_else(|| out_of_bounds.clone())?;
        let end_y = y.checked_add(height).ok_or_else(|| out_of_bounds.clone())?;
        if end_x > self.width || end_y > self.height {
            return Err(out_of_bounds);
        }

        let start = y
            .checked_mul(self.stride)
            .and_then(|v| v.checked_add(x))
            .ok_or(VtError::InvalidDimensions {
                width: self.width,
                height: self.height,
            })?;
        let data = self.data.get(start..).ok_or(VtError::BufferTooSmall {
            needed: start.saturating_add(1),
            got: self.data.len(),
        })?;

        ImageView::new(data, width, height, self.stride)
    }
}

fn required_len(width: usize, height: usize, stride: usize) -> VtResult<usize> {
    if width == 0 || height == 0 {
        return Err(VtError::InvalidDimensions { width, height });
    }
    if stride < width {
        return Err(VtError::InvalidStride { width, stride });
    }
    let needed = (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(width))
        .ok_or(VtError::InvalidDimensions { width, height })?;
    Ok(needed)
}

/// Owned contiguous RGBA8 image.
///
/// Immutable after construction; every operation borrows it through `view`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedImage {
    data: Vec<Rgba>,
    width: usize,
    height: usize,
}

impl OwnedImage {
    /// Wraps a row-major pixel buffer of exactly `width * height` pixels.
    pub fn new(data: Vec<Rgba>, width: usize, height: usize) -> VtResult<Self> {
        if width == 0 || height == 0 {
            return Err(VtError::InvalidDimensions { width, height });
        }
        let needed = width
            .checked_mul(height)
            .ok_or(VtError::InvalidDimensions { width, height })?;
        if data.len() < needed {
            return Err(VtError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(VtError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Creates an image with every pixel set to `pixel`.
    pub fn filled(width: usize, height: usize, pixel: Rgba) -> VtResult<Self> {
        let count = width
            .checked_mul(height)
            .ok_or(VtError::InvalidDimensions { width, height })?;
        Self::new(vec![pixel; count], width, height)
    }

    /// Builds an image from interleaved RGBA bytes.
    pub fn from_raw_rgba(raw: &[u8], width: usize, height: usize) -> VtResult<Self> {
        let data = raw
            .chunks_exact(4)
            .map(|px| [px[0], px[1], px[2], px[3]])
            .collect();
        Self::new(data, width, height)
    }

    /// Copies a (possibly strided) view into a contiguous image.
    pub fn from_view(view: ImageView<'_, Rgba>) -> VtResult<Self> {
        let (width, height) = view.dimensions();
        let mut data = Vec::with_capacity(width.saturating_mul(height));
        for y in 0..height {
            let row = view.row(y).ok_or(VtError::BufferTooSmall {
                needed: (y + 1).saturating_mul(view.stride()),
                got: view.as_slice().len(),
            })?;
            data.extend_from_slice(row);
        }
        Self::new(data, width, height)
    }

    /// Builds an image by evaluating `f(x, y)` for every pixel.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> VtResult<Self>
    where
        F: FnMut(usize, usize) -> Rgba,
    {
        let mut data = Vec::with_capacity(width.saturating_mul(height));
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self::new(data, width, height)
    }

    /// Returns a borrowed view of the image.
    pub fn view(&self) -> ImageView<'_, Rgba> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the pixel buffer in row-major order.
    pub fn pixels(&self) -> &[Rgba] {
        &self.data
    }

    /// Returns the pixel at `(x, y)` if it is within bounds.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        self.view().get(x, y).copied()
    }

    /// Copies out the `width x height` block whose top-left corner is `(x, y)`.
    pub fn crop(&self, x: usize, y: usize, width: usize, height: usize) -> VtResult<Self> {
        Self::from_view(self.view().roi(x, y, width, height)?)
    }

    /// Returns the interleaved RGBA bytes.
    pub fn to_raw_rgba(&self) -> Vec<u8> {
        self.data.as_flattened().to_vec()
    }
}

/// Integer BT.601 luma of an RGBA pixel; alpha is ignored.
#[inline]
pub fn luma(px: Rgba) -> u8 {
    let weighted = 299 * px[0] as u32 + 587 * px[1] as u32 + 114 * px[2] as u32;
    ((weighted + 500) / 1000) as u8
}

/// Converts an RGBA view into a contiguous luma plane.
pub fn luma_plane(view: ImageView<'_, Rgba>) -> Vec<u8> {
    let (width, height) = view.dimensions();
    let mut out = Vec::with_capacity(width * height);
    for y in 0..height {
        if let Some(row) = view.row(y) {
            out.extend(row.iter().map(|&px| luma(px)));
        }
    }
    out
}
