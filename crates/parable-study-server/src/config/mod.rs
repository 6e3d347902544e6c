//! Configuration loading and resolution.
//!
//! Every setting resolves as: command-line flag, then environment variable,
//! then built-in default.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;

use parable_study::aggregate::{AggregatorOptions, DEFAULT_PACING, DEFAULT_UNIT_TIMEOUT};
use parable_study::sources::{
    build_client, default_verses_base, DEFAULT_BIBLE_VERSION, DEFAULT_PARABLES_URL,
    DEFAULT_REQUEST_TIMEOUT,
};
use parable_study::topics::DEFAULT_TOPICS_FILE;
use parable_study::{FileTopicSource, HttpParableSource, HttpVerseSource, ParableAggregator, VerseFetcher};

use crate::transport::AppState;
use crate::types::{ServerError, ServerResult};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;

/// Settings that may be given on the command line.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Listen host. Also reads HOST.
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Listen port. Also reads PORT.
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// API key for the parable reference API. Also reads RAPIDAPI_KEY.
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Path to the topics JSON file. Also reads PARABLE_TOPICS_FILE.
    #[arg(long, global = true)]
    pub topics_file: Option<PathBuf>,

    /// Parable reference endpoint. Also reads PARABLES_URL.
    #[arg(long, global = true)]
    pub parables_url: Option<String>,

    /// Base URL of per-verse JSON files. Also reads VERSES_BASE_URL.
    #[arg(long, global = true)]
    pub verses_base_url: Option<String>,

    /// Bible translation for the default verse source. Also reads BIBLE_VERSION.
    #[arg(long, global = true)]
    pub bible_version: Option<String>,

    /// Allowed CORS origin (any origin when unset). Also reads CORS_ORIGIN.
    #[arg(long, global = true)]
    pub cors_origin: Option<String>,

    /// Delay per list position between reference requests, in milliseconds.
    #[arg(long, global = true)]
    pub pacing_ms: Option<u64>,

    /// Deadline for one reference's verses, in seconds (0 disables).
    #[arg(long, global = true)]
    pub unit_timeout_secs: Option<u64>,

    /// Timeout for each HTTP request, in seconds.
    #[arg(long, global = true)]
    pub request_timeout_secs: Option<u64>,

    /// Extra attempts for a failed verse request.
    #[arg(long, global = true)]
    pub verse_retries: Option<u32>,
}

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api_key: Option<String>,
    pub topics_file: PathBuf,
    pub parables_url: String,
    pub verses_base_url: String,
    pub cors_origin: Option<String>,
    pub pacing: Duration,
    pub unit_timeout: Option<Duration>,
    pub request_timeout: Duration,
    pub verse_retries: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            api_key: None,
            topics_file: PathBuf::from(DEFAULT_TOPICS_FILE),
            parables_url: DEFAULT_PARABLES_URL.to_string(),
            verses_base_url: default_verses_base(DEFAULT_BIBLE_VERSION),
            cors_origin: None,
            pacing: DEFAULT_PACING,
            unit_timeout: Some(DEFAULT_UNIT_TIMEOUT),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            verse_retries: 0,
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl ServerConfig {
    /// Resolve against the process environment.
    pub fn resolve(overrides: ConfigOverrides) -> ServerResult<Self> {
        Self::resolve_with(overrides, env_var)
    }

    /// Resolve against an arbitrary variable lookup.
    pub fn resolve_with<F>(overrides: ConfigOverrides, lookup: F) -> ServerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match overrides.port {
            Some(port) => port,
            None => match lookup("PORT") {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| ServerError::Config(format!("PORT is not a valid port: {raw}")))?,
                None => defaults.port,
            },
        };

        let verses_base_url = overrides
            .verses_base_url
            .or_else(|| lookup("VERSES_BASE_URL"))
            .unwrap_or_else(|| {
                let version = overrides
                    .bible_version
                    .or_else(|| lookup("BIBLE_VERSION"))
                    .unwrap_or_else(|| DEFAULT_BIBLE_VERSION.to_string());
                default_verses_base(&version)
            });

        let unit_timeout = match overrides.unit_timeout_secs {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.unit_timeout,
        };

        Ok(Self {
            host: overrides
                .host
                .or_else(|| lookup("HOST"))
                .unwrap_or(defaults.host),
            port,
            api_key: overrides.api_key.or_else(|| lookup("RAPIDAPI_KEY")),
            topics_file: overrides
                .topics_file
                .or_else(|| lookup("PARABLE_TOPICS_FILE").map(PathBuf::from))
                .unwrap_or(defaults.topics_file),
            parables_url: overrides
                .parables_url
                .or_else(|| lookup("PARABLES_URL"))
                .unwrap_or(defaults.parables_url),
            verses_base_url,
            cors_origin: overrides.cors_origin.or_else(|| lookup("CORS_ORIGIN")),
            pacing: overrides
                .pacing_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.pacing),
            unit_timeout,
            request_timeout: overrides
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            verse_retries: overrides.verse_retries.unwrap_or(defaults.verse_retries),
        })
    }

    /// Listen address as `host:port`.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Wire the HTTP sources, aggregator, and topic file into server state.
    pub fn build_state(&self) -> AppState {
        let client = build_client(self.request_timeout);

        let parables = HttpParableSource::new(
            client.clone(),
            self.parables_url.clone(),
            self.api_key.clone(),
        );
        let verses = HttpVerseSource::new(client, self.verses_base_url.clone());
        let fetcher = VerseFetcher::new(Arc::new(verses)).with_retries(self.verse_retries);

        let aggregator = ParableAggregator::new(Arc::new(parables), fetcher).with_options(AggregatorOptions {
            pacing: self.pacing,
            unit_timeout: self.unit_timeout,
        });

        AppState::new(aggregator, Arc::new(FileTopicSource::new(self.topics_file.clone())))
    }
}
