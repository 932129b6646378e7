//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Largest image [`scale`](super::scale) will produce, in pixels
/// (64 MiB of RGBA).
pub const MAX_SCALED_PIXELS: u64 = 1 << 24;

/// Width that preserves the aspect ratio of `source` at `target_height`.
///
/// `round(target_height * width / height)`, never less than 1 so extreme
/// panoramas scaled down still yield a drawable column. Returns `None` when
/// either source dimension or the target height is zero.
///
/// # Examples
/// ```
/// # use news_card::imaging::scaled_width;
/// // 4:3 photo into the 650px photo slot → 867x650
/// assert_eq!(scaled_width((800, 600), 650), Some(867));
/// ```
pub fn scaled_width(source: (u32, u32), target_height: u32) -> Option<u32> {
    let (src_w, src_h) = source;
    if src_w == 0 || src_h == 0 || target_height == 0 {
        return None;
    }
    let w = (target_height as f64 * src_w as f64 / src_h as f64).round();
    Some((w as u32).max(1))
}

/// Whether a `width` x `height` result stays within [`MAX_SCALED_PIXELS`].
pub fn within_pixel_limit(width: u32, height: u32) -> bool {
    width as u64 * height as u64 <= MAX_SCALED_PIXELS
}

/// Offset that centres a span of `inner` inside a span of `outer`.
///
/// Negative when `inner` is larger, so oversized content overflows evenly
/// on both sides.
pub fn centered_offset(outer: f32, inner: f32) -> f32 {
    outer / 2.0 - inner / 2.0
}
