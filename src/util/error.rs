//! Error types for the visual regression engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias for engine operations.
pub type VtResult<T> = std::result::Result<T, VtError>;

/// Errors that can occur while loading, comparing or matching images.
///
/// A template that cannot be found is not an error; it is reported as a
/// not-found match.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum VtError {
    /// The file could not be read.
    #[error("cannot read {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },
    /// The file was read but is not a decodable raster image.
    #[error("unsupported image format in {path:?}: {reason}")]
    UnsupportedFormat { path: String, reason: String },
    /// Baseline and candidate sizes differ.
    #[error(
        "dimension mismatch: baseline is {baseline_width}x{baseline_height}, \
         candidate is {candidate_width}x{candidate_height}"
    )]
    DimensionMismatch {
        baseline_width: usize,
        baseline_height: usize,
        candidate_width: usize,
        candidate_height: usize,
    },
    /// A scalar parameter or JSON argument is out of range or malformed.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// An excluded region could not be normalized.
    #[error("invalid excluded region #{index}: {reason}")]
    InvalidRegion { index: usize, reason: &'static str },
    /// Image dimensions are zero or overflow.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Stride is smaller than the row width.
    #[error("invalid stride: width {width}, stride {stride}")]
    InvalidStride { width: usize, stride: usize },
    /// A pixel buffer is shorter than its declared geometry.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// A region of interest falls outside its image.
    #[error(
        "roi out of bounds: x={x}, y={y}, width={width}, height={height}, \
         image={img_width}x{img_height}"
    )]
    RoiOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// Anything unexpected, including artifact write failures.
    #[error("internal failure: {0}")]
    InternalFailure(String),
}

/// Error category reported in result envelopes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidPath,
    UnsupportedFormat,
    DimensionMismatch,
    InvalidParameter,
    InvalidRegion,
    InternalFailure,
}

impl VtError {
    /// Returns the envelope category for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            VtError::InvalidPath { .. } => ErrorKind::InvalidPath,
            VtError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            VtError::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            VtError::InvalidParameter(_)
            | VtError::InvalidDimensions { .. }
            | VtError::InvalidStride { .. }
            | VtError::BufferTooSmall { .. }
            | VtError::RoiOutOfBounds { .. } => ErrorKind::InvalidParameter,
            VtError::InvalidRegion { .. } => ErrorKind::InvalidRegion,
            VtError::InternalFailure(_) => ErrorKind::InternalFailure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, VtError};

    #[test]
    fn geometry_errors_report_as_invalid_parameter() {
        let err = VtError::RoiOutOfBounds {
            x: 3,
            y: 3,
            width: 2,
            height: 2,
            img_width: 4,
            img_height: 4,
        };
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        assert_eq!(
            VtError::InvalidDimensions {
                width: 0,
                height: 1
            }
            .kind(),
            ErrorKind::InvalidParameter
        );
    }

    #[test]
    fn kind_serializes_as_variant_name() {
        let json = serde_json::to_string(&ErrorKind::DimensionMismatch).unwrap();
        assert_eq!(json, "\"DimensionMismatch\"");
    }
}
