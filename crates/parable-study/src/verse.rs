//! Verse retrieval: one request per verse, assembled in ascending order.

use std::sync::Arc;

use async_trait::async_trait;

use crate::types::{Reference, VerseError};

/// A source of verse text keyed by book, chapter, and verse.
#[async_trait]
pub trait VerseSource: Send + Sync {
    /// Fetch the text of one verse. `book` is already lowercased.
    async fn fetch_verse(&self, book: &str, chapter: u32, verse: u32) -> Result<String, VerseError>;
}

/// Longest verse range fetched for one reference (Psalm 119 has 176 verses).
pub const MAX_VERSES_PER_REFERENCE: u32 = 176;

/// Placeholder text for a verse that could not be fetched.
pub fn verse_placeholder(verse: u32) -> String {
    format!("Error fetching verse {verse}")
}

/// Fetches verse ranges, degrading per verse instead of failing.
#[derive(Clone)]
pub struct VerseFetcher {
    source: Arc<dyn VerseSource>,
    max_retries: u32,
}

impl VerseFetcher {
    pub fn new(source: Arc<dyn VerseSource>) -> Self {
        Self {
            source,
            max_retries: 0,
        }
    }

    /// Retry each failed verse up to `max_retries` extra times.
    pub fn with_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Reject references spanning more than [`MAX_VERSES_PER_REFERENCE`] verses.
    pub fn check_range(reference: &Reference) -> Result<(), VerseError> {
        match reference.verse_count() {
            count if count > MAX_VERSES_PER_REFERENCE => Err(VerseError::RangeTooLong(count)),
            _ => Ok(()),
        }
    }

    /// Fetch a single verse, retrying non-fatal failures.
    pub async fn fetch_verse(&self, book: &str, chapter: u32, verse: u32) -> Result<String, VerseError> {
        let book = book.to_lowercase();
        let mut attempt = 0u32;

        loop {
            match self.source.fetch_verse(&book, chapter, verse).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_fatal() || attempt >= self.max_retries => return Err(e),
                Err(e) => {
                    attempt += 1;
                    tracing::debug!("Retrying {book} {chapter}:{verse} (attempt {attempt}): {e}");
                }
            }
        }
    }

    /// Fetch every verse from `verse_start` to `verse_end` inclusive and join
    /// them with single spaces.
    ///
    /// Verses are requested one at a time in ascending order. A verse that
    /// fails is replaced by [`verse_placeholder`] and the range continues.
    /// Only a fatal source error (the endpoint itself is unusable) is
    /// returned as `Err`.
    pub async fn fetch_range(
        &self,
        book: &str,
        chapter: u32,
        verse_start: u32,
        verse_end: u32,
    ) -> Result<String, VerseError> {
        let mut texts = Vec::new();

        for verse in verse_start..=verse_end {
            match self.fetch_verse(book, chapter, verse).await {
                Ok(text) => texts.push(text),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!("Error fetching verse {verse} of {book} {chapter}: {e}");
                    texts.push(verse_placeholder(verse));
                }
            }
        }

        Ok(texts.join(" "))
    }

    /// Fetch the full text of a parsed reference.
    pub async fn fetch_reference(&self, reference: &Reference) -> Result<String, VerseError> {
        Self::check_range(reference)?;
        self.fetch_range(
            &reference.book,
            reference.chapter,
            reference.verse_start,
            reference.verse_end,
        )
        .await
    }
}
