//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three pixel operations the card
//! pipeline needs: decode a sniffed buffer, resize, and encode as JPEG.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Everything above this trait works on [`RawImage`] values and never
//! touches a codec directly.

use super::params::Quality;
use super::sniff::DecodedFormat;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("{format} decode failed: {message}")]
    Decode {
        format: DecodedFormat,
        message: String,
    },
    #[error("{0} images are not supported")]
    Unsupported(DecodedFormat),
    #[error("JPEG encode failed: {0}")]
    Encode(String),
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),
}

/// Decoded image: `width * height` RGBA pixels, row-major.
#[derive(Clone, PartialEq, Eq)]
pub struct RawImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RawImage {
    /// Wrap an RGBA buffer. Rejects zero dimensions and mismatched lengths.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::InvalidDimensions(format!(
                "{width}x{height} has no pixels"
            )));
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(BackendError::InvalidDimensions(format!(
                "{width}x{height} needs {expected} bytes, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A `width` x `height` image filled with one colour.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, BackendError> {
        let pixels = rgba.repeat(width as usize * height as usize);
        Self::new(width, height, pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// RGBA value at (`x`, `y`). Panics when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }
}

impl std::fmt::Debug for RawImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

impl From<image::RgbaImage> for RawImage {
    fn from(img: image::RgbaImage) -> Self {
        Self {
            width: img.width(),
            height: img.height(),
            pixels: img.into_raw(),
        }
    }
}

impl From<RawImage> for image::RgbaImage {
    fn from(raw: RawImage) -> Self {
        // RawImage::new guarantees the buffer length matches the dimensions.
        image::RgbaImage::from_raw(raw.width, raw.height, raw.pixels)
            .unwrap_or_else(|| image::RgbaImage::new(0, 0))
    }
}

/// Trait for image codec backends.
///
/// Every backend must implement decode, resize and JPEG encode so the
/// acquisition and compositing code stay backend-agnostic.
pub trait ImageBackend: Sync {
    /// Decode `bytes` as `format`. Never guesses another format on failure.
    fn decode(&self, bytes: &[u8], format: DecodedFormat) -> Result<RawImage, BackendError>;

    /// Resample to exactly `width` x `height`.
    fn resize(&self, image: &RawImage, width: u32, height: u32) -> Result<RawImage, BackendError>;

    /// Encode as baseline JPEG. Alpha is dropped.
    fn encode_jpeg(&self, image: &RawImage, quality: Quality) -> Result<Vec<u8>, BackendError>;
}
