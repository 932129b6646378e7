//! Top-headline retrieval from newsapi.org.
//!
//! [`NewsClient::articles`] returns the typed [`Article`] list for a source.
//! The raw payload is validated once here: strings are cleaned of the HTML
//! entities and `<b>` tags the API leaks through, articles without a title
//! are dropped, and the source name falls back to the requested source id.
//! Everything downstream only sees fully-typed values.
//!
//! The API key `test` never touches the network; it serves a bundled sample
//! payload so a full run can be exercised offline. Article lists are cached
//! under the source id (`{source}-test` for the sample) for a configurable
//! number of minutes.

use crate::cache::{ExpiringCache, expires_in};
use crate::fetch::{FetchError, Fetcher};
use chrono::{DateTime, FixedOffset};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// API key that selects the bundled sample payload.
pub const TEST_KEY: &str = "test";

/// Default lifetime of a cached article list.
pub const DEFAULT_ARTICLE_TTL: Duration = Duration::from_secs(30 * 60);

const SAMPLE_HEADLINES: &str = include_str!("../fixtures/sample-headlines.json");

#[derive(Error, Debug)]
pub enum NewsError {
    #[error("fetching headlines failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("headline payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("newsapi.org returned an error: {0}")]
    Api(String),
    #[error("invalid API URL {0}")]
    InvalidUrl(String),
}

/// One headline, ready for rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub description: Option<String>,
    pub picture_url: Option<String>,
    /// RFC 3339 timestamp as sent by the API.
    pub published_at: Option<String>,
    /// Display name of the publisher.
    pub source: Option<String>,
}

impl Article {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Publish time, if present and well-formed.
    pub fn published(&self) -> Option<DateTime<FixedOffset>> {
        let raw = self.published_at.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .inspect_err(|e| tracing::debug!(raw, error = %e, "unparseable publish date"))
            .ok()
    }
}

/// Remove the markup newsapi.org leaves in titles and descriptions.
pub fn fix_string(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("<b>", "")
        .replace("</b>", "")
        .replace("&#39;", "'")
}

#[derive(Deserialize)]
struct HeadlinesResponse {
    status: Option<String>,
    message: Option<String>,
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    source: Option<RawSource>,
    title: Option<String>,
    description: Option<String>,
    url_to_image: Option<String>,
    published_at: Option<String>,
}

#[derive(Deserialize)]
struct RawSource {
    id: Option<String>,
    name: Option<String>,
}

impl HeadlinesResponse {
    fn into_articles(self, source: &str) -> Result<Vec<Article>, NewsError> {
        if self.status.as_deref() == Some("error") {
            return Err(NewsError::Api(
                self.message.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        let total = self.articles.len();
        let articles: Vec<Article> = self
            .articles
            .into_iter()
            .filter_map(|raw| {
                let title = fix_string(raw.title.as_deref()?.trim());
                if title.is_empty() {
                    return None;
                }
                let name = raw
                    .source
                    .and_then(|s| s.name.or(s.id))
                    .unwrap_or_else(|| source.to_string());
                Some(Article {
                    title,
                    description: raw.description.as_deref().map(fix_string),
                    picture_url: raw.url_to_image.filter(|u| !u.trim().is_empty()),
                    published_at: raw.published_at,
                    source: Some(name),
                })
            })
            .collect();

        if articles.len() < total {
            tracing::debug!(
                skipped = total - articles.len(),
                "dropped articles without a title"
            );
        }
        Ok(articles)
    }
}

pub struct NewsClient {
    fetcher: Arc<dyn Fetcher>,
    cache: Arc<dyn ExpiringCache>,
    api_base: String,
    cache_ttl: Duration,
}

impl NewsClient {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        cache: Arc<dyn ExpiringCache>,
        api_base: impl Into<String>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            fetcher,
            cache,
            api_base: api_base.into(),
            cache_ttl,
        }
    }

    /// `{api_base}/top-headlines` with `source` and `key` as encoded query
    /// parameters.
    pub fn headlines_url(&self, source: &str, key: &str) -> Result<Url, NewsError> {
        let endpoint = format!("{}/top-headlines", self.api_base.trim_end_matches('/'));
        Url::parse_with_params(&endpoint, [("sources", source), ("apiKey", key)])
            .map_err(|e| NewsError::InvalidUrl(format!("{endpoint}: {e}")))
    }

    /// Current top headlines for `source`, newest first as the API orders them.
    pub fn articles(&self, source: &str, key: &str) -> Result<Vec<Article>, NewsError> {
        let cache_key = if key == TEST_KEY {
            format!("{source}-test")
        } else {
            source.to_string()
        };

        if let Some(articles) = self.from_cache(&cache_key) {
            tracing::debug!(source, count = articles.len(), "using cached articles");
            return Ok(articles);
        }

        let payload: HeadlinesResponse = if key == TEST_KEY {
            tracing::info!(source, "using bundled sample headlines");
            serde_json::from_str(SAMPLE_HEADLINES)?
        } else {
            // The URL carries the API key, so only the source is logged.
            tracing::info!(source, "requesting top headlines");
            let url = self.headlines_url(source, key)?;
            let response = self.fetcher.get(url.as_str())?;
            serde_json::from_slice(&response.body)?
        };
        let articles = payload.into_articles(source)?;

        match serde_json::to_value(&articles) {
            Ok(value) => self
                .cache
                .set(&cache_key, value, expires_in(self.cache_ttl)),
            Err(e) => tracing::warn!(source, error = %e, "not caching articles"),
        }
        Ok(articles)
    }

    fn from_cache(&self, cache_key: &str) -> Option<Vec<Article>> {
        let value = self.cache.get(cache_key)?;
        serde_json::from_value(value)
            .inspect_err(|e| {
                tracing::debug!(cache_key, error = %e, "ignoring corrupt article cache")
            })
            .ok()
    }
}
