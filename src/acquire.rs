//! Photo acquisition: cache → fetch → sniff → decode → scale → cache.
//!
//! [`ImageAcquirer::acquire`] is the only entry point. It turns an arbitrary
//! article image URL into a [`RawImage`] of the requested height, or `None`
//! when no usable image exists. Every failure along the way (network,
//! unsupported format, corrupt bytes) is logged and absorbed here so one bad
//! URL never aborts the batch; the single hard error is a zero target height,
//! which only a programming mistake can produce.
//!
//! ## Cached form
//!
//! The cache holds the *scaled* photo re-encoded as JPEG and stored as base64
//! text under the image URL. Re-encoding bounds both the cache file size and
//! the cost of a hit (one small JPEG decode instead of fetch + full-size
//! decode + resize), whatever the original format was. The cache is a
//! content cache, not a freshness cache: entries live for a fixed TTL
//! (three days by default) and are never revalidated.
//!
//! A true miss performs exactly one cache write, and only after the whole
//! pipeline has succeeded. A hit performs no network request.

use crate::cache::{ExpiringCache, expires_in};
use crate::fetch::{FetchError, Fetcher};
use crate::imaging::{
    BackendError, DecodedFormat, ImageBackend, Quality, RawImage, decode_sniffed, scale,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

/// Default lifetime of a cached photo.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3 * 24 * 60 * 60);

#[derive(Error, Debug)]
pub enum AcquireError {
    #[error("target height must be positive, got {0}")]
    InvalidTargetHeight(u32),
}

/// Why a URL produced no image. Logged, never returned.
#[derive(Error, Debug)]
enum Unavailable {
    #[error("fetch failed: {0}")]
    Network(#[from] FetchError),
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(DecodedFormat),
    #[error("{0}")]
    Decode(BackendError),
}

/// Tuning for the cached form of acquired photos.
#[derive(Debug, Clone, Copy)]
pub struct AcquireSettings {
    pub cache_quality: Quality,
    pub cache_ttl: Duration,
}

impl Default for AcquireSettings {
    fn default() -> Self {
        Self {
            cache_quality: Quality::default(),
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }
}

/// Outcome counts for a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AcquireStats {
    pub hits: u32,
    pub fetched: u32,
    pub unavailable: u32,
}

impl AcquireStats {
    pub fn total(&self) -> u32 {
        self.hits + self.fetched + self.unavailable
    }
}

impl fmt::Display for AcquireStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unavailable > 0 {
            write!(
                f,
                "{} cached, {} fetched, {} unavailable ({} total)",
                self.hits,
                self.fetched,
                self.unavailable,
                self.total()
            )
        } else {
            write!(
                f,
                "{} cached, {} fetched ({} total)",
                self.hits,
                self.fetched,
                self.total()
            )
        }
    }
}

pub struct ImageAcquirer<B: ImageBackend> {
    cache: Arc<dyn ExpiringCache>,
    fetcher: Arc<dyn Fetcher>,
    backend: B,
    settings: AcquireSettings,
    stats: Mutex<AcquireStats>,
}

impl<B: ImageBackend> ImageAcquirer<B> {
    pub fn new(
        cache: Arc<dyn ExpiringCache>,
        fetcher: Arc<dyn Fetcher>,
        backend: B,
        settings: AcquireSettings,
    ) -> Self {
        Self {
            cache,
            fetcher,
            backend,
            settings,
            stats: Mutex::new(AcquireStats::default()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn stats(&self) -> AcquireStats {
        *self.stats_mut()
    }

    /// Load the photo at `url` scaled to `target_height`.
    ///
    /// `Ok(None)` means "no image for this article": unreachable URL, WEBP or
    /// unknown bytes, or a decode failure.
    pub fn acquire(
        &self,
        url: &str,
        target_height: u32,
    ) -> Result<Option<RawImage>, AcquireError> {
        if target_height == 0 {
            tracing::error!(url, "acquire called with zero target height");
            return Err(AcquireError::InvalidTargetHeight(target_height));
        }

        if let Some(image) = self.from_cache(url, target_height) {
            tracing::debug!(url, "using cached image");
            self.stats_mut().hits += 1;
            return Ok(Some(image));
        }

        tracing::debug!(url, "fetching image");
        match self.fetch_and_scale(url, target_height) {
            Ok(image) => {
                self.store(url, &image);
                self.stats_mut().fetched += 1;
                Ok(Some(image))
            }
            Err(reason) => {
                tracing::warn!(url, %reason, "no image available");
                self.stats_mut().unavailable += 1;
                Ok(None)
            }
        }
    }

    fn from_cache(&self, url: &str, target_height: u32) -> Option<RawImage> {
        let Value::String(encoded) = self.cache.get(url)? else {
            tracing::debug!(url, "ignoring non-text cache entry");
            return None;
        };
        let decoded = BASE64
            .decode(encoded.as_bytes())
            .map_err(|e| e.to_string())
            .and_then(|jpeg| {
                self.backend
                    .decode(&jpeg, DecodedFormat::Jpeg)
                    .map_err(|e| e.to_string())
            });
        let image = match decoded {
            Ok(image) => image,
            Err(e) => {
                tracing::debug!(url, error = %e, "ignoring corrupt cache entry");
                return None;
            }
        };
        // Entries written under a different photo height are still usable.
        if image.height() == target_height {
            return Some(image);
        }
        scale(&self.backend, &image, target_height).ok()
    }

    fn fetch_and_scale(&self, url: &str, target_height: u32) -> Result<RawImage, Unavailable> {
        let response = self.fetcher.get(url)?;
        let (format, decoded) = decode_sniffed(&self.backend, &response.body);
        tracing::debug!(
            url,
            content_type = response.content_type.as_deref().unwrap_or("-"),
            sniffed = %format,
            "image response"
        );
        let image = decoded.map_err(|e| match e {
            BackendError::Unsupported(format) => Unavailable::UnsupportedFormat(format),
            other => Unavailable::Decode(other),
        })?;
        scale(&self.backend, &image, target_height).map_err(Unavailable::Decode)
    }

    fn store(&self, url: &str, image: &RawImage) {
        match self.backend.encode_jpeg(image, self.settings.cache_quality) {
            Ok(jpeg) => {
                let expires_at = expires_in(self.settings.cache_ttl);
                self.cache
                    .set(url, Value::String(BASE64.encode(jpeg)), expires_at);
                tracing::debug!(url, "cached scaled image");
            }
            Err(e) => tracing::warn!(url, error = %e, "not caching image"),
        }
    }

    fn stats_mut(&self) -> std::sync::MutexGuard<'_, AcquireStats> {
        self.stats
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
