//! HTTP transport: JSON endpoints for parables, verses, topics, and /health.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, Method};
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use parable_study::{
    fetch_group_verses, merge, GroupedParable, ParableAggregator, ParableEntry, TopicRecord,
    TopicSource, VerseResult,
};

use crate::types::{ServerError, ServerResult};

/// Routes served by [`router`], for `info` output.
pub const ROUTES: &[&str] = &[
    "GET /health",
    "GET /api/parable-verses",
    "GET /api/topics",
    "GET /api/parables",
    "GET /api/parables/:name/verses",
];

/// Shared state passed to all handlers via axum State.
pub struct AppState {
    pub aggregator: ParableAggregator,
    pub topics: Arc<dyn TopicSource>,
}

impl AppState {
    pub fn new(aggregator: ParableAggregator, topics: Arc<dyn TopicSource>) -> Self {
        Self { aggregator, topics }
    }
}

/// Detail view for one parable: every verse of every reference.
#[derive(Debug, Serialize)]
pub struct ParableDetail {
    pub name: String,
    pub verses: Vec<VerseResult>,
}

/// Build the axum Router with all endpoints.
///
/// With `cors_origin` set, only that origin may call the API (with
/// credentials); otherwise any origin may.
pub fn router(state: Arc<AppState>, cors_origin: Option<&str>) -> ServerResult<Router> {
    let cors = match cors_origin {
        Some(origin) => {
            let origin = HeaderValue::from_str(origin)
                .map_err(|e| ServerError::Config(format!("Invalid CORS origin '{origin}': {e}")))?;
            CorsLayer::new()
                .allow_origin(AllowOrigin::exact(origin))
                .allow_methods([Method::GET, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                .allow_credentials(true)
        }
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers(Any),
    };

    Ok(Router::new()
        .route("/health", get(handle_health))
        .route("/api/parable-verses", get(handle_parable_verses))
        .route("/api/topics", get(handle_topics))
        .route("/api/parables", get(handle_parables))
        .route("/api/parables/:name/verses", get(handle_parable_detail))
        .layer(cors)
        .with_state(state))
}

/// HTTP server for the parable API.
pub struct HttpTransport {
    state: Arc<AppState>,
    cors_origin: Option<String>,
}

impl HttpTransport {
    pub fn new(state: AppState, cors_origin: Option<String>) -> Self {
        Self {
            state: Arc::new(state),
            cors_origin,
        }
    }

    /// Run the HTTP server on the given address until Ctrl-C.
    pub async fn run(&self, addr: &str) -> ServerResult<()> {
        let app = router(self.state.clone(), self.cors_origin.as_deref())?;

        let listener = tokio::net::TcpListener::bind(addr).await?;

        tracing::info!("Server running on http://{addr}");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Transport(e.to_string()))?;

        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

// ── Handlers ────────────────────────────────────────────────────

async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn handle_parable_verses(
    State(state): State<Arc<AppState>>,
) -> ServerResult<Json<Vec<ParableEntry>>> {
    let entries = state.aggregator.aggregate().await?;
    Ok(Json(entries))
}

async fn handle_topics(State(state): State<Arc<AppState>>) -> ServerResult<Json<Vec<TopicRecord>>> {
    let topics = state.topics.load_topics().await?;
    Ok(Json(topics))
}

/// Card view: parables grouped with their references and topic descriptions.
async fn handle_parables(
    State(state): State<Arc<AppState>>,
) -> ServerResult<Json<Vec<GroupedParable>>> {
    let (entries, topics) = tokio::join!(state.aggregator.aggregate(), state.topics.load_topics());
    let groups = merge(&entries?, &topics?);
    Ok(Json(groups.into_vec()))
}

/// Detail view: re-fetch every verse of the named parable's references,
/// each reference bounded by the aggregator's unit timeout.
async fn handle_parable_detail(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ServerResult<Json<ParableDetail>> {
    let catalog = state.aggregator.catalog().await?;
    let references = catalog
        .references(&name)
        .ok_or_else(|| ServerError::ParableNotFound(name.clone()))?;

    let unit_timeout = state.aggregator.options().unit_timeout;
    let verses = fetch_group_verses(state.aggregator.fetcher(), references, unit_timeout).await;
    Ok(Json(ParableDetail { name, verses }))
}
