//! Decoding and encoding images via the `image` crate.
//!
//! Reading and decoding are separate steps so that an unreadable path and an
//! undecodable file report different error kinds.

use crate::image::OwnedImage;
use crate::trace::trace_span;
use crate::util::{VtError, VtResult};
use image::{ExtendedColorType, ImageFormat};
use std::fs;
use std::path::Path;

/// Decodes an in-memory PNG or JPEG file into an RGBA8 image.
///
/// `origin` is only used in error messages.
pub fn decode_rgba_image(bytes: &[u8], origin: &str) -> VtResult<OwnedImage> {
    let unsupported = |reason: String| VtError::UnsupportedFormat {
        path: origin.to_string(),
        reason,
    };
    let decoded = image::load_from_memory(bytes).map_err(|err| unsupported(err.to_string()))?;
    let rgba = decoded.to_rgba8();
    OwnedImage::from_raw_rgba(rgba.as_raw(), rgba.width() as usize, rgba.height() as usize)
        .map_err(|err| unsupported(err.to_string()))
}

/// Loads an image from disk and converts it to RGBA8.
pub fn load_rgba_image<P: AsRef<Path>>(path: P) -> VtResult<OwnedImage> {
    let path = path.as_ref();
    let _span = trace_span!("load_image", path = %path.display()).entered();

    let origin = path.display().to_string();
    let bytes = fs::read(path).map_err(|err| VtError::InvalidPath {
        path: origin.clone(),
        reason: err.to_string(),
    })?;
    decode_rgba_image(&bytes, &origin)
}

/// Writes an image to `path` as PNG.
pub fn save_png<P: AsRef<Path>>(img: &OwnedImage, path: P) -> VtResult<()> {
    let path = path.as_ref();
    let width = u32::try_from(img.width()).map_err(|_| VtError::InvalidDimensions {
        width: img.width(),
        height: img.height(),
    })?;
    let height = u32::try_from(img.height()).map_err(|_| VtError::InvalidDimensions {
        width: img.width(),
        height: img.height(),
    })?;
    image::save_buffer_with_format(
        path,
        &img.to_raw_rgba(),
        width,
        height,
        ExtendedColorType::Rgba8,
        ImageFormat::Png,
    )
    .map_err(|err| VtError::InternalFailure(format!("writing {}: {err}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::{load_rgba_image, save_png};
    use crate::image::OwnedImage;
    use crate::util::ErrorKind;

    #[test]
    fn png_round_trip_is_lossless() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.png");
        let img = OwnedImage::from_fn(5, 3, |x, y| [x as u8 * 40, y as u8 * 80, 7, 255]).unwrap();
        save_png(&img, &path).unwrap();
        assert_eq!(load_rgba_image(&path).unwrap(), img);
    }

    #[test]
    fn missing_file_is_invalid_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_rgba_image(dir.path().join("absent.png")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPath);
    }

    #[test]
    fn garbage_bytes_are_unsupported_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.png");
        std::fs::write(&path, b"definitely not an image").unwrap();
        let err = load_rgba_image(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    }
}
