//! Configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults
//! reproduce the classic 1920×1080 card; a user config only needs the keys
//! it wants to change.
//!
//! ## Config File Location
//!
//! `config.toml` is read from the directory given by `--config` (default:
//! the current directory). A missing file means stock defaults.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [news]
//! api_base = "https://newsapi.org/v2"
//! article_cache_minutes = 30
//! count = 10
//!
//! [images]
//! photo_quality = 50        # JPEG quality of cached photos
//! card_quality = 50         # JPEG quality of the rendered cards
//! cache_days = 3
//! fetch_timeout_secs = 10
//! user_agent = "news-card"
//!
//! [cache]
//! file = ".news-card-cache.json"
//!
//! [layout]
//! width = 1920
//! height = 1080
//! background = "#F0F0F0"
//! text = "#3205FA"
//! placeholder = "#D0D0D0"
//! title_x = 60
//! title_y = 100
//! title_spacing = 80
//! title_right_margin = 100
//! title_max_lines = 3
//! photo_x = 350
//! photo_y = 350
//! photo_height = 650
//! placeholder_aspect = 1.3
//! credit_x = 60
//! credit_bottom = 20
//!
//! [fonts]
//! path = "fonts/OpenSans-Bold.ttf"
//! title_size = 72.0
//! message_size = 48.0
//! credit_size = 32.0
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use image::Rgba;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CardConfig {
    /// Article source settings.
    pub news: NewsConfig,
    /// Photo fetching, caching and encoding.
    pub images: ImagesConfig,
    /// Persistent cache location.
    pub cache: CacheConfig,
    /// Canvas geometry and colours.
    pub layout: LayoutConfig,
    /// Font file and sizes.
    pub fonts: FontsConfig,
}

impl CardConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, quality) in [
            ("images.photo_quality", self.images.photo_quality),
            ("images.card_quality", self.images.card_quality),
        ] {
            if !(1..=100).contains(&quality) {
                return Err(ConfigError::Validation(format!("{name} must be 1-100")));
            }
        }
        if reqwest::Url::parse(&self.news.api_base).is_err() {
            return Err(ConfigError::Validation(format!(
                "news.api_base is not a valid URL: {:?}",
                self.news.api_base
            )));
        }
        if !(1..=20).contains(&self.news.count) {
            return Err(ConfigError::Validation("news.count must be 1-20".into()));
        }
        if self.images.fetch_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "images.fetch_timeout_secs must be positive".into(),
            ));
        }
        let layout = &self.layout;
        if layout.width == 0 || layout.height == 0 {
            return Err(ConfigError::Validation(
                "layout.width and layout.height must be non-zero".into(),
            ));
        }
        if layout.photo_height == 0 {
            return Err(ConfigError::Validation(
                "layout.photo_height must be non-zero".into(),
            ));
        }
        if !(1..=10).contains(&layout.title_max_lines) {
            return Err(ConfigError::Validation(
                "layout.title_max_lines must be 1-10".into(),
            ));
        }
        if layout.title_x.saturating_add(layout.title_right_margin) >= layout.width {
            return Err(ConfigError::Validation(
                "layout.title_x + layout.title_right_margin must be less than layout.width".into(),
            ));
        }
        if layout.photo_x >= layout.width
            || layout.photo_y.saturating_add(layout.photo_height) > layout.height
        {
            return Err(ConfigError::Validation(
                "layout photo region must start inside the canvas and end above its bottom edge"
                    .into(),
            ));
        }
        if !(layout.placeholder_aspect.is_finite() && layout.placeholder_aspect > 0.0) {
            return Err(ConfigError::Validation(
                "layout.placeholder_aspect must be positive".into(),
            ));
        }
        for (name, value) in [
            ("layout.background", &layout.background),
            ("layout.text", &layout.text),
            ("layout.placeholder", &layout.placeholder),
        ] {
            parse_hex_color(value)
                .map_err(|_| ConfigError::Validation(format!("{name}: invalid color {value:?}")))?;
        }
        if self.fonts.path.as_os_str().is_empty() {
            return Err(ConfigError::Validation("fonts.path must not be empty".into()));
        }
        for (name, size) in [
            ("fonts.title_size", self.fonts.title_size),
            ("fonts.message_size", self.fonts.message_size),
            ("fonts.credit_size", self.fonts.credit_size),
        ] {
            if size.is_nan() || size <= 0.0 {
                return Err(ConfigError::Validation(format!("{name} must be positive")));
            }
        }
        Ok(())
    }
}

/// Article source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NewsConfig {
    /// Base URL of the newsapi.org v2 API.
    pub api_base: String,
    /// How long a fetched article list is reused.
    pub article_cache_minutes: u64,
    /// Default number of cards per run (1-20).
    pub count: u32,
}

impl NewsConfig {
    pub fn article_ttl(&self) -> Duration {
        Duration::from_secs(self.article_cache_minutes.saturating_mul(60))
    }
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            api_base: "https://newsapi.org/v2".to_string(),
            article_cache_minutes: 30,
            count: 10,
        }
    }
}

/// Photo fetching, caching and encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// JPEG quality of the scaled photos kept in the cache (1-100).
    pub photo_quality: u32,
    /// JPEG quality of the rendered card (1-100).
    pub card_quality: u32,
    /// Lifetime of a cached photo.
    pub cache_days: u64,
    /// Timeout for a single HTTP request.
    pub fetch_timeout_secs: u64,
    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl ImagesConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_days.saturating_mul(24 * 60 * 60))
    }
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            photo_quality: 50,
            card_quality: 50,
            cache_days: 3,
            fetch_timeout_secs: 10,
            user_agent: concat!("news-card/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Persistent cache location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Cache file, relative to the output directory unless absolute.
    pub file: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from(".news-card-cache.json"),
        }
    }
}

/// Canvas geometry and colours. All offsets are in pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    pub width: u32,
    pub height: u32,
    pub background: String,
    pub text: String,
    pub placeholder: String,
    /// Left edge and first baseline of the title.
    pub title_x: u32,
    pub title_y: u32,
    /// Distance between title baselines.
    pub title_spacing: u32,
    /// Space kept free right of the title.
    pub title_right_margin: u32,
    pub title_max_lines: usize,
    pub photo_x: u32,
    pub photo_y: u32,
    pub photo_height: u32,
    /// Placeholder width as a multiple of `photo_height`.
    pub placeholder_aspect: f32,
    pub credit_x: u32,
    /// Credit baseline distance from the bottom edge.
    pub credit_bottom: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            background: "#F0F0F0".to_string(),
            text: "#3205FA".to_string(),
            placeholder: "#D0D0D0".to_string(),
            title_x: 60,
            title_y: 100,
            title_spacing: 80,
            title_right_margin: 100,
            title_max_lines: 3,
            photo_x: 350,
            photo_y: 350,
            photo_height: 650,
            placeholder_aspect: 1.3,
            credit_x: 60,
            credit_bottom: 20,
        }
    }
}

/// Font file and pixel sizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FontsConfig {
    /// TrueType/OpenType file, relative to the config directory unless absolute.
    pub path: PathBuf,
    pub title_size: f32,
    /// Placeholder text size.
    pub message_size: f32,
    pub credit_size: f32,
}

impl Default for FontsConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("fonts/OpenSans-Bold.ttf"),
            title_size: 72.0,
            message_size: 48.0,
            credit_size: 32.0,
        }
    }
}

/// Parse `#RRGGBB` (case-insensitive) into an opaque colour.
pub fn parse_hex_color(s: &str) -> Result<Rgba<u8>, ConfigError> {
    let invalid = || ConfigError::Validation(format!("invalid color: {s}"));
    let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    Ok(Rgba([channel(0)?, channel(2)?, channel(4)?, 255]))
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(CardConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<CardConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: CardConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// A relative `fonts.path` is resolved against `dir`.
pub fn load_config(dir: &Path) -> Result<CardConfig, ConfigError> {
    let mut config = resolve_config(stock_defaults_value()?, load_raw_config(dir)?)?;
    if config.fonts.path.is_relative() {
        config.fonts.path = dir.join(&config.fonts.path);
    }
    Ok(config)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# news-card Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Articles
# ---------------------------------------------------------------------------
[news]
# newsapi.org v2 endpoint. Top headlines are read from {api_base}/top-headlines.
api_base = "https://newsapi.org/v2"

# Minutes a fetched article list is reused before asking the API again.
article_cache_minutes = 30

# Cards rendered per run when --count is not given (1-20).
count = 10

# ---------------------------------------------------------------------------
# Photos
# ---------------------------------------------------------------------------
[images]
# JPEG quality (1-100) of the scaled photos kept in the cache.
photo_quality = 50

# JPEG quality (1-100) of the rendered cards.
card_quality = 50

# Days a cached photo is reused. Photos are never revalidated.
cache_days = 3

# Seconds before a photo or article request is abandoned.
fetch_timeout_secs = 10

# User-Agent header for all requests.
# user_agent = "news-card/<version>"

# ---------------------------------------------------------------------------
# Cache
# ---------------------------------------------------------------------------
[cache]
# Cache file, relative to the output directory unless absolute.
file = ".news-card-cache.json"

# ---------------------------------------------------------------------------
# Layout (pixels, colors as #RRGGBB)
# ---------------------------------------------------------------------------
[layout]
width = 1920
height = 1080
background = "#F0F0F0"
text = "#3205FA"
placeholder = "#D0D0D0"    # Box drawn when an article has no usable photo

# Title: first baseline at (title_x, title_y), further lines title_spacing apart.
title_x = 60
title_y = 100
title_spacing = 80
title_right_margin = 100
title_max_lines = 3        # Words that do not fit are dropped (1-10)

# Photo: scaled to photo_height, aspect ratio preserved.
photo_x = 350
photo_y = 350
photo_height = 650
placeholder_aspect = 1.3   # Placeholder width = photo_height * placeholder_aspect

# Credit line baseline: credit_x from the left, credit_bottom from the bottom.
credit_x = 60
credit_bottom = 20

# ---------------------------------------------------------------------------
# Fonts
# ---------------------------------------------------------------------------
[fonts]
# TrueType/OpenType file, relative to the config directory unless absolute.
path = "fonts/OpenSans-Bold.ttf"
title_size = 72.0
message_size = 48.0
credit_size = 32.0
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_matches_classic_card() {
        let config = CardConfig::default();
        assert_eq!((config.layout.width, config.layout.height), (1920, 1080));
        assert_eq!(config.layout.photo_height, 650);
        assert_eq!(config.layout.title_max_lines, 3);
        assert_eq!(config.images.photo_quality, 50);
        assert_eq!(config.images.cache_days, 3);
        assert_eq!(config.images.fetch_timeout_secs, 10);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r##"
[layout]
background = "#FAFAFA"
"##;
        let config: CardConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.layout.background, "#FAFAFA");
        assert_eq!(config.layout.text, "#3205FA");
        assert_eq!(config.news.count, 10);
    }

    // =========================================================================
    // parse_hex_color tests
    // =========================================================================

    #[test]
    fn parse_hex_color_valid() {
        assert_eq!(parse_hex_color("#3205FA").unwrap(), Rgba([50, 5, 250, 255]));
        assert_eq!(parse_hex_color("#f0f0f0").unwrap(), Rgba([240, 240, 240, 255]));
    }

    #[test]
    fn parse_hex_color_invalid() {
        for s in ["3205FA", "#3205F", "#3205FAA", "#GG0000", "#ééé", ""] {
            assert!(parse_hex_color(s).is_err(), "{s}");
        }
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.layout.background, "#F0F0F0");
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r##"
[news]
count = 5

[images]
cache_days = 7
"##,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.news.count, 5);
        assert_eq!(config.images.cache_days, 7);
        assert_eq!(config.images.photo_quality, 50);
    }

    #[test]
    fn load_config_resolves_font_against_config_dir() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.fonts.path, tmp.path().join("fonts/OpenSans-Bold.ttf"));
    }

    #[test]
    fn load_config_keeps_absolute_font_path() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            "[fonts]\npath = \"/usr/share/fonts/x.ttf\"\n",
        )
        .unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.fonts.path, PathBuf::from("/usr/share/fonts/x.ttf"));
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "this is not valid toml [[[").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "[images]\nqualty = 90\n").unwrap();
        assert!(load_config(tmp.path()).is_err());
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(CardConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_quality_range() {
        let mut config = CardConfig::default();
        config.images.card_quality = 0;
        assert!(config.validate().unwrap_err().to_string().contains("card_quality"));

        config.images.card_quality = 100;
        config.images.photo_quality = 101;
        assert!(config.validate().unwrap_err().to_string().contains("photo_quality"));
    }

    #[test]
    fn validate_count_range() {
        let mut config = CardConfig::default();
        config.news.count = 21;
        assert!(config.validate().is_err());
        config.news.count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_api_base_is_url() {
        let mut config = CardConfig::default();
        config.news.api_base = "newsapi.org/v2".into();
        assert!(config.validate().unwrap_err().to_string().contains("api_base"));
    }

    #[test]
    fn validate_photo_height_zero() {
        let mut config = CardConfig::default();
        config.layout.photo_height = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_title_max_lines() {
        let mut config = CardConfig::default();
        config.layout.title_max_lines = 11;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_title_area_must_exist() {
        let mut config = CardConfig::default();
        config.layout.title_x = 1900;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_title_area_does_not_overflow() {
        let mut config = CardConfig::default();
        config.layout.title_x = u32::MAX;
        config.layout.title_right_margin = u32::MAX;
        assert!(config.validate().unwrap_err().to_string().contains("title_right_margin"));
    }

    #[test]
    fn validate_photo_region_inside_canvas() {
        let mut config = CardConfig::default();
        config.layout.photo_y = u32::MAX;
        assert!(config.validate().unwrap_err().to_string().contains("photo region"));

        let mut config = CardConfig::default();
        config.layout.photo_height = 731;
        assert!(config.validate().is_err());
        config.layout.photo_height = 730;
        assert!(config.validate().is_ok());

        let mut config = CardConfig::default();
        config.layout.photo_x = 1920;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_placeholder_aspect() {
        let mut config = CardConfig::default();
        for aspect in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            config.layout.placeholder_aspect = aspect;
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("placeholder_aspect"), "{aspect}");
        }
    }

    #[test]
    fn ttls_saturate_instead_of_overflowing() {
        let mut config = CardConfig::default();
        assert_eq!(config.images.cache_ttl(), Duration::from_secs(3 * 24 * 60 * 60));
        assert_eq!(config.news.article_ttl(), Duration::from_secs(30 * 60));

        config.images.cache_days = u64::MAX;
        config.news.article_cache_minutes = u64::MAX;
        assert_eq!(config.images.cache_ttl(), Duration::from_secs(u64::MAX));
        assert_eq!(config.news.article_ttl(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn validate_bad_color() {
        let mut config = CardConfig::default();
        config.layout.text = "rgb(50, 5, 250)".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("layout.text"));
    }

    #[test]
    fn validate_font_size() {
        let mut config = CardConfig::default();
        config.fonts.credit_size = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "[images]\ncard_quality = 200\n").unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    // =========================================================================
    // merge / stock config tests
    // =========================================================================

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 3\nz = 4\n").unwrap();
        let merged = merge_toml(base, overlay);
        let a = merged.get("a").unwrap();
        assert_eq!(a.get("x").unwrap().as_integer(), Some(1));
        assert_eq!(a.get("y").unwrap().as_integer(), Some(3));
        assert_eq!(a.get("z").unwrap().as_integer(), Some(4));
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: CardConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = CardConfig::default();
        assert_eq!(config.layout.photo_x, defaults.layout.photo_x);
        assert_eq!(config.layout.text, defaults.layout.text);
        assert_eq!(config.images.photo_quality, defaults.images.photo_quality);
        assert_eq!(config.news.api_base, defaults.news.api_base);
        assert_eq!(config.fonts.path, defaults.fonts.path);
        assert_eq!(config.cache.file, defaults.cache.file);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value().unwrap();
        for section in ["news", "images", "cache", "layout", "fonts"] {
            assert!(val.get(section).is_some(), "{section}");
        }
    }
}
