//! Endpoint integration tests: the router wired to mock upstream APIs.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{header as header_eq, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use parable_study_server::config::{ConfigOverrides, ServerConfig};
use parable_study_server::router;

// ─────────────────────── helpers ───────────────────────

fn config(server: &MockServer, topics_file: PathBuf) -> ServerConfig {
    let overrides = ConfigOverrides {
        api_key: Some("test-key".into()),
        topics_file: Some(topics_file),
        parables_url: Some(format!("{}/GetParables?language=english", server.uri())),
        verses_base_url: Some(format!("{}/books", server.uri())),
        pacing_ms: Some(0),
        unit_timeout_secs: Some(5),
        request_timeout_secs: Some(5),
        ..Default::default()
    };
    ServerConfig::resolve_with(overrides, |_| None).unwrap()
}

fn app(server: &MockServer, topics_file: PathBuf) -> Router {
    let state = Arc::new(config(server, topics_file).build_state());
    router(state, None).unwrap()
}

fn topics_file(body: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

/// Mounts the catalog as raw text so the key order survives.
async fn mount_catalog(server: &MockServer, catalog: &str) {
    Mock::given(method("GET"))
        .and(path("/GetParables"))
        .and(header_eq("X-RapidAPI-Key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_string(catalog))
        .mount(server)
        .await;
}

async fn mount_verse(server: &MockServer, book: &str, chapter: u32, verse: u32, text: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/books/{book}/chapters/{chapter}/verses/{verse}.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "text": text })))
        .mount(server)
        .await;
}

/// Two parables, one with an unparseable reference, and their verses.
async fn seeded_server() -> MockServer {
    let server = MockServer::start().await;
    mount_catalog(
        &server,
        r#"{
            "The Lost Sheep": ["Luke 15:4-5", "Gospel of Thomas"],
            "The Hidden Treasure": ["Matthew 13:44"]
        }"#,
    )
    .await;
    mount_verse(&server, "luke", 15, 4, "What man of you").await;
    mount_verse(&server, "luke", 15, 5, "When he has found it").await;
    mount_verse(&server, "matthew", 13, 44, "The kingdom of heaven is like a treasure").await;
    server
}

// ─────────────────────── tests ───────────────────────

#[tokio::test]
async fn test_health_reports_ok() {
    let server = MockServer::start().await;
    let (status, body) = get(app(&server, PathBuf::from("unused.json")), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_parable_verses_lists_parseable_entries() {
    let server = seeded_server().await;
    let (status, body) = get(app(&server, PathBuf::from("unused.json")), "/api/parable-verses").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {
                "parable": "The Lost Sheep",
                "reference": "Luke 15:4-5",
                "verseText": "What man of you When he has found it"
            },
            {
                "parable": "The Hidden Treasure",
                "reference": "Matthew 13:44",
                "verseText": "The kingdom of heaven is like a treasure"
            }
        ])
    );
}

#[tokio::test]
async fn test_parable_verses_upstream_failure_is_500() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/GetParables"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let (status, body) = get(app(&server, PathBuf::from("unused.json")), "/api/parable-verses").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Failed to fetch data" }));
}

#[tokio::test]
async fn test_parable_verses_empty_upstream_is_404() {
    let server = MockServer::start().await;
    mount_catalog(&server, "{}").await;

    let (status, body) = get(app(&server, PathBuf::from("unused.json")), "/api/parable-verses").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "No data found" }));
}

#[tokio::test]
async fn test_topics_returns_raw_array() {
    let server = MockServer::start().await;
    let file = topics_file(r#"[{"topic": "The Lost Sheep", "description": "God seeks the lost"}]"#);

    let (status, body) = get(app(&server, file.path().to_path_buf()), "/api/topics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{ "topic": "The Lost Sheep", "description": "God seeks the lost" }])
    );
}

#[tokio::test]
async fn test_topics_missing_file_is_500() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    let (status, body) = get(app(&server, dir.path().join("nope.json")), "/api/topics").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Internal Server Error" }));
}

#[tokio::test]
async fn test_parables_groups_and_attaches_topics() {
    let server = seeded_server().await;
    let file = topics_file(
        r#"[
            {"topic": "the lost sheep!", "description": "God seeks the lost"},
            {"topic": "Unrelated", "description": "dropped"}
        ]"#,
    );

    let (status, body) = get(app(&server, file.path().to_path_buf()), "/api/parables").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {
                "name": "The Lost Sheep",
                "references": ["Luke 15:4-5"],
                "topics": ["God seeks the lost"]
            },
            {
                "name": "The Hidden Treasure",
                "references": ["Matthew 13:44"],
                "topics": []
            }
        ])
    );
}

#[tokio::test]
async fn test_parable_detail_lists_each_verse() {
    let server = seeded_server().await;
    let (status, body) = get(
        app(&server, PathBuf::from("unused.json")),
        "/api/parables/The%20Lost%20Sheep/verses",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "The Lost Sheep");
    assert_eq!(
        body["verses"],
        json!([
            { "reference": "Luke 15:4", "text": "What man of you" },
            { "reference": "Luke 15:5", "text": "When he has found it" },
            { "reference": "Gospel of Thomas", "error": "Invalid reference format." }
        ])
    );
}

#[tokio::test]
async fn test_parable_detail_unknown_name_is_404() {
    let server = seeded_server().await;
    let (status, body) = get(
        app(&server, PathBuf::from("unused.json")),
        "/api/parables/The%20Ten%20Virgins/verses",
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Parable not found: The Ten Virgins");
}

#[tokio::test]
async fn test_parable_detail_oversized_range_is_one_error() {
    let server = MockServer::start().await;
    mount_catalog(&server, r#"{"The Sower": ["Luke 1:1-4000000000"]}"#).await;

    let (status, body) = get(
        app(&server, PathBuf::from("unused.json")),
        "/api/parables/The%20Sower/verses",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["verses"],
        json!([
            { "reference": "Luke 1:1-4000000000", "error": "Verse range too long: 4000000000 verses" }
        ])
    );
    let verse_requests = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path().starts_with("/books"))
        .count();
    assert_eq!(verse_requests, 0);
}

#[tokio::test]
async fn test_cors_origin_is_echoed_when_configured() {
    let server = MockServer::start().await;
    let state = Arc::new(config(&server, PathBuf::from("unused.json")).build_state());
    let app = router(state, Some("https://parables.example")).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "https://parables.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "https://parables.example"
    );
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
}

#[tokio::test]
async fn test_invalid_cors_origin_is_rejected() {
    let server = MockServer::start().await;
    let state = Arc::new(config(&server, PathBuf::from("unused.json")).build_state());
    assert!(router(state, Some("bad\norigin")).is_err());
}
