//! Router tests driven in-process

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use doc_store::StoreConfig;
use ledger_api::{app, router, AppState};
use ledger_core::{
    config::StorageConfig, storage::JsonFileStore, Config, Ledger, LedgerOptions, SeedSource,
};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn test_app(dir: &std::path::Path, seed: SeedSource) -> (Router, Ledger) {
    let store = Box::new(JsonFileStore::new(dir.join("ledger.json")));
    let ledger = Ledger::open_with(store, LedgerOptions::default().with_seed(seed))
        .await
        .unwrap();
    (router(AppState::new(ledger.clone())), ledger)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn offer() -> Value {
    json!({
        "type": "offer_made",
        "actorId": "user_001",
        "actorName": "Sarah",
        "details": { "amount": 2500000 }
    })
}

#[tokio::test]
async fn test_health() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (app, _ledger) = test_app(temp_dir.path(), SeedSource::Embedded).await;

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_list_returns_seed_newest_first() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (app, _ledger) = test_app(temp_dir.path(), SeedSource::Embedded).await;

    let (status, body) = send(&app, get("/api/ledger")).await;
    assert_eq!(status, StatusCode::OK);

    let ids: Vec<_> = body["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["tx_001", "tx_002", "tx_003"]);
}

#[tokio::test]
async fn test_append_on_empty_seed() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (app, _ledger) = test_app(temp_dir.path(), SeedSource::Inline(Vec::new())).await;

    let (status, body) = send(&app, post_json("/api/ledger/append", offer())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);

    let data = &body["data"];
    assert_eq!(data["blockNumber"], 1000);
    assert_eq!(data["transactionIndex"], 0);
    assert_eq!(data["actorId"], "user_001");
    let hash = data["hash"].as_str().unwrap();
    assert!(hash.starts_with("0x"));
    assert_eq!(hash.len(), 66);

    // Visible first in the list
    let (_, list) = send(&app, get("/api/ledger")).await;
    assert_eq!(list["events"][0], *data);
}

#[tokio::test]
async fn test_legacy_post_path_appends() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (app, ledger) = test_app(temp_dir.path(), SeedSource::Embedded).await;

    let (status, body) = send(&app, post_json("/api/ledger", offer())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["blockNumber"], 1003);
    assert_eq!(ledger.len(), 4);
}

#[tokio::test]
async fn test_append_validation_lists_every_field() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (app, ledger) = test_app(temp_dir.path(), SeedSource::Embedded).await;

    let (status, body) = send(
        &app,
        post_json("/api/ledger/append", json!({ "type": "offer_made", "details": {} })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
    assert_eq!(
        body["details"],
        json!([
            "actorId is required",
            "actorName is required",
            "details must not be empty"
        ])
    );
    assert_eq!(ledger.len(), 3);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (app, ledger) = test_app(temp_dir.path(), SeedSource::Embedded).await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/ledger/append")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"type\": "))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(ledger.len(), 3);
}

#[tokio::test]
async fn test_reset() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (app, _ledger) = test_app(temp_dir.path(), SeedSource::Embedded).await;
    send(&app, post_json("/api/ledger/append", offer())).await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/ledger/reset")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["message"].is_string());
    assert_eq!(body["data"]["count"], 3);
    assert_eq!(body["data"]["events"][0]["id"], "tx_001");
}

#[tokio::test]
async fn test_reset_without_seed_is_not_found() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (app, _ledger) = test_app(temp_dir.path(), SeedSource::Disabled).await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/ledger/reset")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_point_lookups() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (app, _ledger) = test_app(temp_dir.path(), SeedSource::Embedded).await;

    let (status, body) = send(&app, get("/api/ledger/events/tx_002")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["blockNumber"], 1001);

    let (status, body) = send(&app, get("/api/ledger/blocks/1000")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], "tx_003");

    let (status, _) = send(&app, get("/api/ledger/events/tx_404")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, get("/api/ledger/blocks/1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_numeric_block_is_json_bad_request() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (app, _ledger) = test_app(temp_dir.path(), SeedSource::Embedded).await;

    let (status, body) = send(&app, get("/api/ledger/blocks/latest")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid path parameter"));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (app, _ledger) = test_app(temp_dir.path(), SeedSource::Embedded).await;
    send(&app, post_json("/api/ledger/append", offer())).await;
    send(&app, post_json("/api/ledger/append", json!({}))).await;

    let (status, body) = send(&app, get("/metrics")).await;
    assert_eq!(status, StatusCode::OK);

    let text = body.as_str().unwrap();
    assert!(text.contains("ledger_events_appended_total 1"));
    assert!(text.contains("ledger_validation_failures_total 1"));
    assert!(text.contains("ledger_events 4"));
}

#[tokio::test]
async fn test_cors_preflight_for_dev_origin() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (_, ledger) = test_app(temp_dir.path(), SeedSource::Embedded).await;
    let app = app(
        AppState::new(ledger),
        &Config::default().server.cors_allowed_origins,
    );

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/ledger/append")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:5173")
    );
}

#[tokio::test]
async fn test_document_store_backend() {
    let mut config = Config::default();
    config.storage = StorageConfig::DocumentStore {
        store: StoreConfig::Memory,
    };
    let ledger = Ledger::open(&config).await.unwrap();
    let app = router(AppState::new(ledger));

    let (status, _) = send(&app, post_json("/api/ledger/append", offer())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(&app, get("/api/ledger")).await;
    assert_eq!(body["events"].as_array().unwrap().len(), 4);
}
