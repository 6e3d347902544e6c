//! Per-verse fetch for a parable's detail view.

use std::time::Duration;

use crate::reference::parse;
use crate::types::{Reference, VerseError, VerseResult};
use crate::verse::VerseFetcher;

pub const INVALID_REFERENCE: &str = "Invalid reference format.";
pub const VERSE_UNAVAILABLE: &str = "Error fetching verse.";

/// Fetch every verse of every reference, one result per verse.
///
/// Successful verses are labelled `Book Chapter:Verse`. Unparseable
/// references and failed verses are labelled with the reference string
/// as listed. A reference spanning too many verses yields one error
/// result. With `unit_timeout` set, a reference that runs past it keeps
/// the verses fetched so far and ends with a timeout error.
pub async fn fetch_group_verses(
    fetcher: &VerseFetcher,
    references: &[String],
    unit_timeout: Option<Duration>,
) -> Vec<VerseResult> {
    let mut results = Vec::new();

    for reference in references {
        let Some(parsed) = parse(reference) else {
            results.push(VerseResult::Error {
                reference: reference.clone(),
                error: INVALID_REFERENCE.to_string(),
            });
            continue;
        };

        if let Err(e) = VerseFetcher::check_range(&parsed) {
            tracing::warn!("Skipping {reference}: {e}");
            results.push(VerseResult::Error {
                reference: reference.clone(),
                error: e.to_string(),
            });
            continue;
        }

        let fetch = fetch_each_verse(fetcher, reference, &parsed, &mut results);
        match unit_timeout {
            Some(limit) => {
                if tokio::time::timeout(limit, fetch).await.is_err() {
                    tracing::warn!("Timed out fetching {reference} after {limit:?}");
                    results.push(VerseResult::Error {
                        reference: reference.clone(),
                        error: VerseError::TimedOut(limit).to_string(),
                    });
                }
            }
            None => fetch.await,
        }
    }

    results
}

async fn fetch_each_verse(
    fetcher: &VerseFetcher,
    reference: &str,
    parsed: &Reference,
    results: &mut Vec<VerseResult>,
) {
    for verse in parsed.verses() {
        match fetcher.fetch_verse(&parsed.book, parsed.chapter, verse).await {
            Ok(text) => results.push(VerseResult::Text {
                reference: format!("{} {}:{verse}", parsed.book, parsed.chapter),
                text,
            }),
            Err(e) => {
                tracing::warn!("Error fetching {reference}: {e}");
                results.push(VerseResult::Error {
                    reference: reference.to_string(),
                    error: VERSE_UNAVAILABLE.to_string(),
                });
            }
        }
    }
}
