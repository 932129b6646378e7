//! Card composition.
//!
//! A card is a fixed-size canvas: background fill, the article photo (or a
//! grey placeholder naming the source when there is none), the headline
//! wrapped to a fixed number of lines at the top, and a credit line pinned
//! to the bottom-left. The finished canvas is encoded as JPEG.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Title line 1                                 │  title_y
//! │ Title line 2                                 │  + title_spacing
//! │ Title line 3                                 │
//! │          ┌──────────────┐                    │  photo_y
//! │          │    photo     │                    │
//! │          │ (or source)  │  photo_height      │
//! │          └──────────────┘                    │
//! │ Source: MSNBC from newsapi.org, October ...  │  height - credit_bottom
//! └──────────────────────────────────────────────┘
//! ```
//!
//! A missing photo never fails the card. The only errors are an invalid
//! photo height (rejected by config validation) and a JPEG encode failure.

use crate::acquire::{AcquireError, ImageAcquirer};
use crate::config::{CardConfig, ConfigError, parse_hex_color};
use crate::font::TextRenderer;
use crate::imaging::{BackendError, ImageBackend, Quality, RawImage, centered_offset};
use crate::news::Article;
use crate::text::wrap_text;
use chrono::{DateTime, Datelike, Local, TimeZone};
use image::{Rgba, RgbaImage, imageops};
use std::fmt;
use thiserror::Error;

/// Shown in the placeholder when the article names no source.
const NO_IMAGE_MESSAGE: &str = "<No image>";

#[derive(Error, Debug)]
pub enum CardError {
    #[error("photo acquisition failed: {0}")]
    Acquire(#[from] AcquireError),
    #[error("card encoding failed: {0}")]
    Encode(#[from] BackendError),
}

/// Resolved geometry, colours and sizes for one card.
#[derive(Debug, Clone)]
pub struct CardLayout {
    pub width: u32,
    pub height: u32,
    pub background: Rgba<u8>,
    pub text: Rgba<u8>,
    pub placeholder: Rgba<u8>,
    pub title_x: f32,
    pub title_y: f32,
    pub title_spacing: f32,
    pub title_width: f32,
    pub title_max_lines: usize,
    pub photo_x: u32,
    pub photo_y: u32,
    pub photo_height: u32,
    pub placeholder_width: u32,
    pub credit_x: f32,
    pub credit_baseline: f32,
    pub title_size: f32,
    pub message_size: f32,
    pub credit_size: f32,
    pub quality: Quality,
}

impl CardLayout {
    pub fn from_config(config: &CardConfig) -> Result<Self, ConfigError> {
        let layout = &config.layout;
        let fonts = &config.fonts;
        Ok(Self {
            width: layout.width,
            height: layout.height,
            background: parse_hex_color(&layout.background)?,
            text: parse_hex_color(&layout.text)?,
            placeholder: parse_hex_color(&layout.placeholder)?,
            title_x: layout.title_x as f32,
            title_y: layout.title_y as f32,
            title_spacing: layout.title_spacing as f32,
            title_width: layout
                .width
                .saturating_sub(layout.title_x.saturating_add(layout.title_right_margin))
                as f32,
            title_max_lines: layout.title_max_lines,
            photo_x: layout.photo_x,
            photo_y: layout.photo_y,
            photo_height: layout.photo_height,
            placeholder_width: (layout.photo_height as f32 * layout.placeholder_aspect).round()
                as u32,
            credit_x: layout.credit_x as f32,
            credit_baseline: layout.height.saturating_sub(layout.credit_bottom) as f32,
            title_size: fonts.title_size,
            message_size: fonts.message_size,
            credit_size: fonts.credit_size,
            quality: Quality::new(config.images.card_quality),
        })
    }
}

/// An encoded card.
#[derive(Debug, Clone)]
pub struct RenderedCard {
    pub jpeg: Vec<u8>,
    /// False when the placeholder was drawn instead of a photo.
    pub has_photo: bool,
}

pub struct CardCompositor<B: ImageBackend> {
    acquirer: ImageAcquirer<B>,
    renderer: Box<dyn TextRenderer>,
    layout: CardLayout,
}

impl<B: ImageBackend> CardCompositor<B> {
    pub fn new(
        acquirer: ImageAcquirer<B>,
        renderer: Box<dyn TextRenderer>,
        layout: CardLayout,
    ) -> Self {
        Self {
            acquirer,
            renderer,
            layout,
        }
    }

    pub fn acquirer(&self) -> &ImageAcquirer<B> {
        &self.acquirer
    }

    /// Render `article` into a JPEG card.
    pub fn compose(&self, article: &Article) -> Result<RenderedCard, CardError> {
        let layout = &self.layout;
        tracing::debug!(title = %article.title, "composing card");
        let mut canvas = RgbaImage::from_pixel(layout.width, layout.height, layout.background);

        let photo = match article.picture_url.as_deref() {
            Some(url) => self.acquirer.acquire(url, layout.photo_height)?,
            None => None,
        };
        let has_photo = photo.is_some();
        match photo {
            Some(photo) => imageops::overlay(
                &mut canvas,
                &RgbaImage::from(photo),
                layout.photo_x.into(),
                layout.photo_y.into(),
            ),
            None => self.draw_placeholder(&mut canvas, article.source.as_deref()),
        }

        self.draw_title(&mut canvas, &article.title);

        let published = article.published().map(|p| p.with_timezone(&Local));
        let credit = credit_line(article.source.as_deref(), published.as_ref());
        self.renderer.draw(
            &mut canvas,
            &credit,
            layout.credit_x,
            layout.credit_baseline,
            layout.credit_size,
            layout.text,
        );

        let jpeg = self
            .acquirer
            .backend()
            .encode_jpeg(&RawImage::from(canvas), layout.quality)?;
        Ok(RenderedCard { jpeg, has_photo })
    }

    fn draw_placeholder(&self, canvas: &mut RgbaImage, source: Option<&str>) {
        let layout = &self.layout;
        let right = layout
            .photo_x
            .saturating_add(layout.placeholder_width)
            .min(canvas.width());
        let bottom = layout
            .photo_y
            .saturating_add(layout.photo_height)
            .min(canvas.height());
        for y in layout.photo_y..bottom {
            for x in layout.photo_x..right {
                canvas.put_pixel(x, y, layout.placeholder);
            }
        }

        let message = source.unwrap_or(NO_IMAGE_MESSAGE);
        let message_width = self.renderer.measure(message, layout.message_size);
        let x =
            layout.photo_x as f32 + centered_offset(layout.placeholder_width as f32, message_width);
        let baseline = layout.photo_y as f32 + layout.photo_height as f32 / 2.0;
        self.renderer
            .draw(canvas, message, x, baseline, layout.message_size, layout.text);
    }

    fn draw_title(&self, canvas: &mut RgbaImage, title: &str) {
        let layout = &self.layout;
        let lines = wrap_text(
            title,
            |s| self.renderer.measure(s, layout.title_size),
            layout.title_width,
            layout.title_max_lines,
        );
        for (i, line) in lines.iter().enumerate() {
            let baseline = layout.title_y + i as f32 * layout.title_spacing;
            self.renderer
                .draw(canvas, line, layout.title_x, baseline, layout.title_size, layout.text);
        }
    }
}

/// `Source: {source} from newsapi.org, {date}`. The date part is left out
/// when the article carries no usable publish time.
pub fn credit_line<Tz: TimeZone>(source: Option<&str>, published: Option<&DateTime<Tz>>) -> String
where
    Tz::Offset: fmt::Display,
{
    let mut line = match source {
        Some(source) => format!("Source: {source} from newsapi.org"),
        None => "Source: newsapi.org".to_string(),
    };
    if let Some(published) = published {
        line.push_str(", ");
        line.push_str(&format_publish_date(published));
    }
    line
}

/// Format like `October 19th, 2026, 3:05 PM`.
pub fn format_publish_date<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    format!(
        "{} {}{}, {}",
        date.format("%B"),
        date.day(),
        ordinal_suffix(date.day()),
        date.format("%Y, %-I:%M %p")
    )
}

fn ordinal_suffix(day: u32) -> &'static str {
    match day {
        11..=13 => "th",
        _ => match day % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::AcquireSettings;
    use crate::acquire::tests::{CountingCache, encoded};
    use crate::fetch::tests::FakeFetcher;
    use crate::font::tests::BlockRenderer;
    use crate::imaging::RustBackend;
    use chrono::Utc;
    use image::ImageFormat;
    use std::sync::Arc;

    const PHOTO_URL: &str = "https://img.example.com/photo.png";
    const DEAD_URL: &str = "https://unreachable.example.com/photo.jpg";

    struct Fixture {
        cache: Arc<CountingCache>,
        fetcher: Arc<FakeFetcher>,
        compositor: CardCompositor<RustBackend>,
    }

    fn fixture() -> Fixture {
        let fetcher =
            Arc::new(FakeFetcher::new().with_body(PHOTO_URL, encoded(400, 300, ImageFormat::Png)));
        let cache = Arc::new(CountingCache::default());
        let acquirer = ImageAcquirer::new(
            cache.clone(),
            fetcher.clone(),
            RustBackend::new(),
            AcquireSettings::default(),
        );
        let layout = CardLayout::from_config(&CardConfig::default()).unwrap();
        Fixture {
            cache,
            fetcher,
            compositor: CardCompositor::new(acquirer, Box::new(BlockRenderer), layout),
        }
    }

    fn article(picture_url: Option<&str>) -> Article {
        Article {
            title: "Short headline".into(),
            description: None,
            picture_url: picture_url.map(str::to_string),
            published_at: Some("2026-10-19T15:05:00Z".into()),
            source: Some("MSNBC".into()),
        }
    }

    fn decode(card: &RenderedCard) -> RgbaImage {
        image::load_from_memory(&card.jpeg).unwrap().to_rgba8()
    }

    /// JPEG is lossy; flat regions land within a few levels of the source.
    fn assert_close(actual: &Rgba<u8>, expected: Rgba<u8>) {
        for c in 0..3 {
            let diff = (actual.0[c] as i32 - expected.0[c] as i32).abs();
            assert!(diff <= 24, "{actual:?} is not close to {expected:?}");
        }
    }

    // =========================================================================
    // Layout
    // =========================================================================

    #[test]
    fn default_layout_matches_classic_card() {
        let layout = CardLayout::from_config(&CardConfig::default()).unwrap();
        assert_eq!(layout.title_width, 1760.0);
        assert_eq!(layout.placeholder_width, 845);
        assert_eq!(layout.credit_baseline, 1060.0);
        assert_eq!(layout.text, Rgba([50, 5, 250, 255]));
        assert_eq!(layout.quality.value(), 50);
    }

    #[test]
    fn placeholder_at_far_offset_is_clipped_not_overflowed() {
        let mut config = CardConfig::default();
        config.layout.photo_x = u32::MAX - 10;
        config.layout.photo_y = u32::MAX - 10;
        let layout = CardLayout::from_config(&config).unwrap();
        let acquirer = ImageAcquirer::new(
            Arc::new(CountingCache::default()),
            Arc::new(FakeFetcher::new()),
            RustBackend::new(),
            AcquireSettings::default(),
        );
        let compositor = CardCompositor::new(acquirer, Box::new(BlockRenderer), layout);
        let card = compositor.compose(&article(None)).unwrap();
        assert!(!card.has_photo);
        assert_eq!(decode(&card).dimensions(), (1920, 1080));
    }

    #[test]
    fn layout_rejects_bad_color() {
        let mut config = CardConfig::default();
        config.layout.background = "grey".into();
        assert!(CardLayout::from_config(&config).is_err());
    }

    // =========================================================================
    // Credit line
    // =========================================================================

    #[test]
    fn publish_date_format() {
        let date = Utc.with_ymd_and_hms(2026, 10, 19, 15, 5, 0).unwrap();
        assert_eq!(format_publish_date(&date), "October 19th, 2026, 3:05 PM");
    }

    #[test]
    fn publish_date_midnight_is_twelve_am() {
        let date = Utc.with_ymd_and_hms(2026, 1, 1, 0, 30, 0).unwrap();
        assert_eq!(format_publish_date(&date), "January 1st, 2026, 12:30 AM");
    }

    #[test]
    fn ordinal_suffixes() {
        let cases = [
            (1, "st"),
            (2, "nd"),
            (3, "rd"),
            (4, "th"),
            (11, "th"),
            (12, "th"),
            (13, "th"),
            (21, "st"),
            (22, "nd"),
            (23, "rd"),
            (30, "th"),
            (31, "st"),
        ];
        for (day, suffix) in cases {
            assert_eq!(ordinal_suffix(day), suffix, "day {day}");
        }
    }

    #[test]
    fn credit_line_with_source_and_date() {
        let date = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        assert_eq!(
            credit_line(Some("MSNBC"), Some(&date)),
            "Source: MSNBC from newsapi.org, March 2nd, 2026, 9:00 AM"
        );
    }

    #[test]
    fn credit_line_without_date() {
        assert_eq!(
            credit_line::<Utc>(Some("MSNBC"), None),
            "Source: MSNBC from newsapi.org"
        );
        assert_eq!(credit_line::<Utc>(None, None), "Source: newsapi.org");
    }

    // =========================================================================
    // Composition
    // =========================================================================

    #[test]
    fn card_is_full_size_jpeg() {
        let f = fixture();
        let card = f.compositor.compose(&article(Some(PHOTO_URL))).unwrap();
        assert_eq!(crate::imaging::sniff(&card.jpeg), crate::imaging::DecodedFormat::Jpeg);
        let img = decode(&card);
        assert_eq!(img.dimensions(), (1920, 1080));
        assert_close(img.get_pixel(10, 500), Rgba([0xF0, 0xF0, 0xF0, 255]));
    }

    #[test]
    fn photo_is_drawn_at_photo_region() {
        let f = fixture();
        let card = f.compositor.compose(&article(Some(PHOTO_URL))).unwrap();
        assert!(card.has_photo);
        let img = decode(&card);
        // 400x300 scaled to height 650 is 867 wide.
        assert_close(img.get_pixel(350 + 400, 350 + 300), Rgba([30, 140, 60, 255]));
        assert_close(img.get_pixel(350 + 880, 350 + 300), Rgba([0xF0, 0xF0, 0xF0, 255]));
        assert_eq!(f.cache.set_count(), 1);
    }

    #[test]
    fn unreachable_photo_draws_placeholder() {
        let f = fixture();
        let card = f.compositor.compose(&article(Some(DEAD_URL))).unwrap();
        assert!(!card.has_photo);
        assert_eq!(f.fetcher.request_count(), 1);
        assert_eq!(f.cache.set_count(), 0);

        let img = decode(&card);
        assert_close(img.get_pixel(355, 355), Rgba([0xD0, 0xD0, 0xD0, 255]));
        assert_close(img.get_pixel(350 + 800, 350 + 600), Rgba([0xD0, 0xD0, 0xD0, 255]));
        // "MSNBC" is 5 * 24px wide, centred in the 845px box, on a baseline at 675.
        let text_left = 350 + (845 - 5 * 24) / 2;
        assert_close(img.get_pixel(text_left + 8, 660), Rgba([50, 5, 250, 255]));
    }

    #[test]
    fn missing_picture_url_skips_fetch() {
        let f = fixture();
        let card = f.compositor.compose(&article(None)).unwrap();
        assert!(!card.has_photo);
        assert_eq!(f.fetcher.request_count(), 0);
    }

    #[test]
    fn title_is_drawn_from_title_origin() {
        let f = fixture();
        let card = f.compositor.compose(&article(None)).unwrap();
        let img = decode(&card);
        // First glyph box spans x 60..95, y 28..100.
        assert_close(img.get_pixel(75, 70), Rgba([50, 5, 250, 255]));
    }

    #[test]
    fn title_beyond_three_lines_is_dropped() {
        let f = fixture();
        let mut long = article(None);
        long.title = "headline words ".repeat(30).trim_end().to_string();
        let card = f.compositor.compose(&long).unwrap();
        let img = decode(&card);
        // Third baseline is at 260; a fourth line would sit on 340.
        assert_close(img.get_pixel(75, 240), Rgba([50, 5, 250, 255]));
        assert_close(img.get_pixel(75, 320), Rgba([0xF0, 0xF0, 0xF0, 255]));
    }
}
