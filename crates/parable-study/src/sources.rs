//! HTTP-backed parable and verse sources.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::aggregate::ParableSource;
use crate::types::{ParableCatalog, SourceError, SourceResult, VerseError};
use crate::verse::VerseSource;

/// Parable reference endpoint.
pub const DEFAULT_PARABLES_URL: &str = "https://iq-bible.p.rapidapi.com/GetParables?language=english";

/// Header carrying the parable API key.
pub const API_KEY_HEADER: &str = "X-RapidAPI-Key";

/// Bible translation used for verse text (World English Bible).
pub const DEFAULT_BIBLE_VERSION: &str = "en-web";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Base URL of the per-verse JSON files for a translation.
pub fn default_verses_base(version: &str) -> String {
    format!("https://cdn.jsdelivr.net/gh/wldeh/bible-api/bibles/{version}/books")
}

/// Build the shared HTTP client.
pub fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("parable-study/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_default()
}

/// Fetches the parable catalog from the reference API.
#[derive(Clone)]
pub struct HttpParableSource {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpParableSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            url: url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl ParableSource for HttpParableSource {
    async fn fetch_catalog(&self) -> SourceResult<ParableCatalog> {
        let mut request = self.client.get(&self.url);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SourceError::Unavailable(e.to_string()))?;

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Unavailable(e.to_string()))?;

        if body.trim().is_empty() {
            return Ok(ParableCatalog::default());
        }

        serde_json::from_str(&body)
            .map_err(|e| SourceError::Unavailable(format!("Invalid catalog payload: {e}")))
    }
}

#[derive(Deserialize)]
struct VersePayload {
    text: String,
}

/// Fetches single verses as `{base}/{book}/chapters/{chapter}/verses/{verse}.json`.
#[derive(Clone)]
pub struct HttpVerseSource {
    client: reqwest::Client,
    base: String,
}

impl HttpVerseSource {
    pub fn new(client: reqwest::Client, base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            client,
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// URL of one verse.
    pub fn verse_url(&self, book: &str, chapter: u32, verse: u32) -> Result<url::Url, VerseError> {
        let raw = format!("{}/{book}/chapters/{chapter}/verses/{verse}.json", self.base);
        url::Url::parse(&raw).map_err(|e| VerseError::Endpoint(format!("{raw}: {e}")))
    }
}

#[async_trait]
impl VerseSource for HttpVerseSource {
    async fn fetch_verse(&self, book: &str, chapter: u32, verse: u32) -> Result<String, VerseError> {
        let url = self.verse_url(book, chapter, verse)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| VerseError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VerseError::Status(status.as_u16()));
        }

        let payload: VersePayload = response
            .json()
            .await
            .map_err(|e| VerseError::Malformed(e.to_string()))?;

        Ok(payload.text)
    }
}
