//! Content-based image format detection.
//!
//! Remote servers routinely send the wrong `Content-Type` (or none), and URL
//! extensions are meaningless for CDN links, so the format is decided from
//! the leading bytes alone.
//!
//! | Bytes | Format |
//! |---|---|
//! | `[0..2] = 89 50` (`\x89P`) | PNG |
//! | `[0..2] = FF D8` (SOI marker) | JPEG |
//! | `[8..10] = 57 45` (`WE` of `RIFF....WEBP`) | WEBP, recognised but unsupported |
//!
//! Buffers shorter than [`MIN_SNIFF_LEN`] bytes are always [`DecodedFormat::Unknown`].

use std::fmt;

/// Bytes needed to evaluate every rule.
pub const MIN_SNIFF_LEN: usize = 10;

/// Image format as determined by [`sniff`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodedFormat {
    Png,
    Jpeg,
    /// WEBP container. Not decoded; callers treat it as "no image".
    UnsupportedWebp,
    Unknown,
}

impl DecodedFormat {
    /// Whether the decoder handles this format.
    pub fn is_supported(self) -> bool {
        matches!(self, Self::Png | Self::Jpeg)
    }
}

impl fmt::Display for DecodedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
            Self::UnsupportedWebp => "WEBP",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Classify `bytes` by magic number.
pub fn sniff(bytes: &[u8]) -> DecodedFormat {
    if bytes.len() < MIN_SNIFF_LEN {
        return DecodedFormat::Unknown;
    }
    match bytes {
        [0x89, 0x50, ..] => DecodedFormat::Png,
        [0xFF, 0xD8, ..] => DecodedFormat::Jpeg,
        [_, _, _, _, _, _, _, _, 0x57, 0x45, ..] => DecodedFormat::UnsupportedWebp,
        _ => DecodedFormat::Unknown,
    }
}
