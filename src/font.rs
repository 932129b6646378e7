//! Glyph measurement and text rasterisation.
//!
//! [`TextRenderer`] is what the compositor and the title wrapper see: a width
//! in pixels for a string at a pixel size, and a way to draw that string onto
//! the canvas at a baseline. [`FontRenderer`] implements it with `rusttype`
//! over a TrueType file from the config; tests substitute a block renderer so
//! they never need a font on disk.

use image::{Rgba, RgbaImage};
use rusttype::{Font, Scale, point};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FontError {
    #[error("cannot read font {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{0} is not a usable TrueType/OpenType font")]
    Invalid(PathBuf),
}

pub trait TextRenderer: Sync {
    /// Advance width of `text` at `px` pixels per em.
    fn measure(&self, text: &str, px: f32) -> f32;

    /// Draw `text` with its baseline starting at (`x`, `baseline`). Pixels
    /// outside the canvas are clipped.
    fn draw(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        x: f32,
        baseline: f32,
        px: f32,
        color: Rgba<u8>,
    );
}

pub struct FontRenderer {
    font: Font<'static>,
}

impl FontRenderer {
    pub fn load(path: &Path) -> Result<Self, FontError> {
        let bytes = std::fs::read(path).map_err(|source| FontError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(bytes).ok_or_else(|| FontError::Invalid(path.to_path_buf()))
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Option<Self> {
        Font::try_from_vec(bytes).map(|font| Self { font })
    }
}

impl TextRenderer for FontRenderer {
    fn measure(&self, text: &str, px: f32) -> f32 {
        self.font
            .layout(text, Scale::uniform(px), point(0.0, 0.0))
            .last()
            .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
            .unwrap_or(0.0)
    }

    fn draw(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        x: f32,
        baseline: f32,
        px: f32,
        color: Rgba<u8>,
    ) {
        let (width, height) = canvas.dimensions();
        for glyph in self.font.layout(text, Scale::uniform(px), point(x, baseline)) {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, coverage| {
                let cx = gx as i32 + bb.min.x;
                let cy = gy as i32 + bb.min.y;
                if cx < 0 || cy < 0 || cx as u32 >= width || cy as u32 >= height {
                    return;
                }
                blend(canvas.get_pixel_mut(cx as u32, cy as u32), color, coverage);
            });
        }
    }
}

/// Source-over blend of `color` at `coverage` onto an opaque pixel.
fn blend(dst: &mut Rgba<u8>, color: Rgba<u8>, coverage: f32) {
    let a = coverage.clamp(0.0, 1.0) * (color.0[3] as f32 / 255.0);
    if a <= 0.0 {
        return;
    }
    for c in 0..3 {
        dst.0[c] = (color.0[c] as f32 * a + dst.0[c] as f32 * (1.0 - a)).round() as u8;
    }
    dst.0[3] = 255;
}
