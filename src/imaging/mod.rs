//! Image processing in pure Rust on the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Sniff** | magic-byte rules in [`sniff`](sniff()) |
//! | **Decode** | `image::load_from_memory_with_format` (PNG, JPEG) |
//! | **Scale** | `imageops::resize`, `Triangle` filter |
//! | **Encode** | `JpegEncoder` |
//!
//! The module is split into:
//! - **Sniff**: content-based format detection
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: encoding quality
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;
mod sniff;

pub use backend::{BackendError, ImageBackend, RawImage};
pub use calculations::{MAX_SCALED_PIXELS, centered_offset, scaled_width, within_pixel_limit};
pub use operations::{decode_sniffed, scale};
pub use params::Quality;
pub use rust_backend::RustBackend;
pub use sniff::{DecodedFormat, MIN_SNIFF_LEN, sniff};
