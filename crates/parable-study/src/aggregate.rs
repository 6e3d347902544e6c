//! Parable aggregation: fetch the reference catalog, then every reference's
//! verse text, concurrently.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;

use crate::reference::parse;
use crate::types::{ParableCatalog, ParableEntry, SourceError, SourceResult, VerseError};
use crate::verse::VerseFetcher;

/// Default delay per list position between reference requests.
pub const DEFAULT_PACING: Duration = Duration::from_millis(800);

/// Default upper bound on the time spent fetching one reference.
pub const DEFAULT_UNIT_TIMEOUT: Duration = Duration::from_secs(120);

/// A source of parable names and their reference strings.
#[async_trait]
pub trait ParableSource: Send + Sync {
    async fn fetch_catalog(&self) -> SourceResult<ParableCatalog>;
}

/// Timing knobs for [`ParableAggregator`].
#[derive(Debug, Clone, Copy)]
pub struct AggregatorOptions {
    /// A reference at position `i` in its parable's list waits `i * pacing`
    /// before its first request.
    pub pacing: Duration,
    /// Per-reference deadline. `None` waits indefinitely.
    pub unit_timeout: Option<Duration>,
}

impl Default for AggregatorOptions {
    fn default() -> Self {
        Self {
            pacing: DEFAULT_PACING,
            unit_timeout: Some(DEFAULT_UNIT_TIMEOUT),
        }
    }
}

/// Builds the flat list of parable entries with verse text.
#[derive(Clone)]
pub struct ParableAggregator {
    source: Arc<dyn ParableSource>,
    fetcher: VerseFetcher,
    options: AggregatorOptions,
}

impl ParableAggregator {
    pub fn new(source: Arc<dyn ParableSource>, fetcher: VerseFetcher) -> Self {
        Self {
            source,
            fetcher,
            options: AggregatorOptions::default(),
        }
    }

    pub fn with_options(mut self, options: AggregatorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn fetcher(&self) -> &VerseFetcher {
        &self.fetcher
    }

    pub fn options(&self) -> AggregatorOptions {
        self.options
    }

    /// Fetch the catalog, failing with [`SourceError::Empty`] if it has no
    /// parables.
    pub async fn catalog(&self) -> SourceResult<ParableCatalog> {
        let catalog = self.source.fetch_catalog().await.map_err(|e| {
            tracing::error!("Failed to fetch parable catalog: {e}");
            e
        })?;

        if catalog.is_empty() {
            tracing::warn!("Parable catalog is empty");
            return Err(SourceError::Empty);
        }

        Ok(catalog)
    }

    /// Fetch every parable's references and their verse text.
    ///
    /// All references are processed concurrently and collected once every
    /// unit has finished. Unparseable references produce no entry. A unit
    /// that fails produces an entry carrying `error` instead of `verseText`,
    /// without affecting the others. Entries come back in listing order.
    pub async fn aggregate(&self) -> SourceResult<Vec<ParableEntry>> {
        let catalog = self.catalog().await?;

        let units: Vec<_> = catalog
            .iter()
            .flat_map(|(parable, references)| {
                references
                    .iter()
                    .enumerate()
                    .map(move |(index, reference)| self.run_unit(parable, reference, index))
            })
            .collect();

        let scheduled = units.len();
        let entries: Vec<ParableEntry> = join_all(units).await.into_iter().flatten().collect();
        let failed = entries.iter().filter(|e| e.error().is_some()).count();

        tracing::info!(
            "Aggregated {} parables: {} entries ({} failed, {} skipped)",
            catalog.len(),
            entries.len(),
            failed,
            scheduled - entries.len()
        );

        Ok(entries)
    }

    async fn run_unit(&self, parable: &str, reference: &str, index: usize) -> Option<ParableEntry> {
        let Some(parsed) = parse(reference) else {
            tracing::debug!("Skipping unparseable reference '{reference}' of '{parable}'");
            return None;
        };

        let delay = self
            .options
            .pacing
            .saturating_mul(u32::try_from(index).unwrap_or(u32::MAX));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let fetch = self.fetcher.fetch_reference(&parsed);
        let outcome = match self.options.unit_timeout {
            Some(limit) => tokio::time::timeout(limit, fetch)
                .await
                .unwrap_or(Err(VerseError::TimedOut(limit))),
            None => fetch.await,
        };

        Some(match outcome {
            Ok(text) => ParableEntry::text(parable, reference, text),
            Err(e) => {
                tracing::warn!("Failed to fetch '{reference}' for '{parable}': {e}");
                ParableEntry::failed(parable, reference, e.to_string())
            }
        })
    }
}
