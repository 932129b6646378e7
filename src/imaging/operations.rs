//! High-level image operations.
//!
//! These functions combine calculations with backend execution.

use super::backend::{BackendError, ImageBackend, RawImage};
use super::calculations::{MAX_SCALED_PIXELS, scaled_width, within_pixel_limit};
use super::sniff::{DecodedFormat, sniff};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Scale `image` to `target_height`, deriving the width from its aspect ratio.
///
/// A zero target height is rejected, as is a result larger than
/// [`MAX_SCALED_PIXELS`] (an extreme panorama), before the backend allocates.
pub fn scale(
    backend: &impl ImageBackend,
    image: &RawImage,
    target_height: u32,
) -> Result<RawImage> {
    let width = scaled_width((image.width(), image.height()), target_height).ok_or_else(|| {
        BackendError::InvalidDimensions(format!(
            "cannot scale {}x{} to height {target_height}",
            image.width(),
            image.height()
        ))
    })?;
    if !within_pixel_limit(width, target_height) {
        return Err(BackendError::InvalidDimensions(format!(
            "scaling {}x{} to {width}x{target_height} exceeds {MAX_SCALED_PIXELS} pixels",
            image.width(),
            image.height()
        )));
    }
    if (width, target_height) == (image.width(), image.height()) {
        return Ok(image.clone());
    }
    tracing::debug!(
        from = %format!("{}x{}", image.width(), image.height()),
        to = %format!("{width}x{target_height}"),
        "scaling image"
    );
    backend.resize(image, width, target_height)
}

/// Sniff `bytes` and decode them by the detected format.
///
/// Returns the sniffed format alongside the result so callers can log it.
pub fn decode_sniffed(
    backend: &impl ImageBackend,
    bytes: &[u8],
) -> (DecodedFormat, Result<RawImage>) {
    let format = sniff(bytes);
    if !format.is_supported() {
        return (format, Err(BackendError::Unsupported(format)));
    }
    (format, backend.decode(bytes, format))
}
