//! Binary HTTP GET with a bounded timeout.
//!
//! [`Fetcher`] is the seam between the acquisition pipeline and the network:
//! production uses [`HttpFetcher`] (blocking `reqwest`), tests substitute a
//! recording fake. Timeouts, DNS failures, connection errors and non-2xx
//! statuses all surface as [`FetchError`]; callers decide whether that is
//! fatal.

use std::time::Duration;
use thiserror::Error;

/// Default timeout for a single image GET.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },
}

/// A successful response: 2xx status, full body read.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    /// Advisory only. Logged, never used to pick a decoder.
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Fetches a URL's body as bytes.
pub trait Fetcher: Send + Sync {
    fn get(&self, url: &str) -> Result<FetchResponse, FetchError>;
}

/// `reqwest::blocking` client with a request timeout.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn get(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let started = std::time::Instant::now();
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes()?.to_vec();
        tracing::debug!(
            url,
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "GET complete"
        );
        Ok(FetchResponse {
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}
