//! Pure Rust codec backend on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode PNG / JPEG | `image::load_from_memory_with_format` |
//! | Resize | `image::imageops::resize` with the `Triangle` (bilinear) filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |

use super::backend::{BackendError, ImageBackend, RawImage};
use super::params::Quality;
use super::sniff::DecodedFormat;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, RgbaImage};

/// Backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Default, Clone, Copy)]
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

fn codec_format(format: DecodedFormat) -> Result<ImageFormat, BackendError> {
    match format {
        DecodedFormat::Png => Ok(ImageFormat::Png),
        DecodedFormat::Jpeg => Ok(ImageFormat::Jpeg),
        other => Err(BackendError::Unsupported(other)),
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8], format: DecodedFormat) -> Result<RawImage, BackendError> {
        let decoded = image::load_from_memory_with_format(bytes, codec_format(format)?).map_err(
            |e| BackendError::Decode {
                format,
                message: e.to_string(),
            },
        )?;
        let rgba = decoded.to_rgba8();
        if rgba.width() == 0 || rgba.height() == 0 {
            return Err(BackendError::InvalidDimensions(format!(
                "decoded {format} is {}x{}",
                rgba.width(),
                rgba.height()
            )));
        }
        Ok(rgba.into())
    }

    fn resize(&self, image: &RawImage, width: u32, height: u32) -> Result<RawImage, BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::InvalidDimensions(format!(
                "cannot resize to {width}x{height}"
            )));
        }
        let source: RgbaImage = image.clone().into();
        let resized = image::imageops::resize(&source, width, height, FilterType::Triangle);
        Ok(resized.into())
    }

    fn encode_jpeg(&self, image: &RawImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
        let rgba: RgbaImage = image.clone().into();
        // JPEG has no alpha channel.
        let rgb = DynamicImage::ImageRgba8(rgba).to_rgb8();
        let mut out = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut out, quality.value() as u8);
        DynamicImage::ImageRgb8(rgb)
            .write_with_encoder(encoder)
            .map_err(|e| BackendError::Encode(e.to_string()))?;
        Ok(out)
    }
}
