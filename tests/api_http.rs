// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - GET /api/news   (live / cache / fallback envelope modes)
// - POST /api/ingest (run report envelope)

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::Value as Json;
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt as _; // for `oneshot`

use gidi_ingest::api::{self, AppState};
use gidi_ingest::ingest::config::IngestConfig;
use gidi_ingest::ingest::sources::{SourceKind, SourceRegistry, SourceSpec};
use gidi_ingest::ingest::types::{Category, PageFetcher};
use gidi_ingest::store::{article_id, Article, ArticleStore};
use gidi_ingest::MemoryStore;

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

struct FixtureFetcher {
    pages: HashMap<String, String>,
}

#[async_trait]
impl PageFetcher for FixtureFetcher {
    async fn get_text(&self, url: &str) -> Result<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("no fixture for {url}"))
    }
}

/// Fetcher standing in for a network outage: every request fails.
struct DeadFetcher;

#[async_trait]
impl PageFetcher for DeadFetcher {
    async fn get_text(&self, url: &str) -> Result<String> {
        Err(anyhow!("connection refused: {url}"))
    }
}

fn test_registry() -> SourceRegistry {
    SourceRegistry {
        sources: vec![SourceSpec {
            name: "Fixture Source".into(),
            base_url: "https://a.test-paper.ng".into(),
            category: Category::Entertainment,
            kind: SourceKind::Html,
            enabled: true,
        }],
    }
}

fn test_router(fetcher: Arc<dyn PageFetcher>, store: Arc<MemoryStore>) -> Router {
    let mut cfg = IngestConfig::default();
    cfg.source_delay_ms = 0;
    api::router(AppState {
        store,
        fetcher,
        registry: Arc::new(test_registry()),
        cfg: Arc::new(cfg),
    })
}

fn live_fixture() -> FixtureFetcher {
    let date = (Utc::now() - Duration::days(2)).to_rfc3339();
    let listing = "<html><body><article><h2>\
        <a href=\"/p/palmwine-music-night-at-the-shrine\">Palmwine music night returns to the Shrine</a>\
        </h2></article></body></html>"
        .to_string();
    let article = format!(
        "<html><head>\
         <meta property=\"og:image\" content=\"https://cdn.a.ng/shrine.jpg\">\
         <meta property=\"article:published_time\" content=\"{date}\">\
         <meta property=\"og:description\" content=\"Palmwine and highlife until late.\">\
         </head><body><article><p>Body.</p></article></body></html>"
    );
    FixtureFetcher {
        pages: HashMap::from([
            ("https://a.test-paper.ng".to_string(), listing),
            (
                "https://a.test-paper.ng/p/palmwine-music-night-at-the-shrine".to_string(),
                article,
            ),
        ]),
    }
}

async fn get_json(app: Router, method: &str, uri: &str) -> (StatusCode, Json) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    let v: Json = serde_json::from_slice(&bytes).expect("parse json");
    (status, v)
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let app = test_router(Arc::new(DeadFetcher), Arc::new(MemoryStore::new()));

    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");

    let resp = app.oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK, "health should be 200");

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    let body = String::from_utf8(bytes).expect("utf8");
    assert_eq!(body.trim(), "OK", "health body should be 'OK'");
}

#[tokio::test]
async fn news_envelope_reports_live_source_on_success() {
    let app = test_router(Arc::new(live_fixture()), Arc::new(MemoryStore::new()));
    let (status, v) = get_json(app, "GET", "/api/news?category=entertainment&limit=5").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["success"], true);
    assert_eq!(v["source"], "live");
    assert!(v.get("timestamp").is_some(), "missing 'timestamp'");

    let data = v["data"].as_array().expect("data must be an array");
    assert_eq!(data.len(), 1);
    assert_eq!(
        data[0]["external_url"],
        "https://a.test-paper.ng/p/palmwine-music-night-at-the-shrine"
    );
    assert_eq!(data[0]["featured_image_url"], "https://cdn.a.ng/shrine.jpg");
    assert_eq!(data[0]["is_active"], true);
}

#[tokio::test]
async fn news_envelope_degrades_to_cache_when_sources_are_down() {
    // Pre-populated store + dead network: stale beats empty.
    let store = Arc::new(MemoryStore::new());
    let now = Utc::now();
    store
        .upsert(Article {
            id: article_id("https://a.test-paper.ng/p/older-story"),
            title: "An older but perfectly good story".into(),
            summary: None,
            category: "entertainment".into(),
            external_url: "https://a.test-paper.ng/p/older-story".into(),
            featured_image_url: "https://cdn.a.ng/old.jpg".into(),
            publish_date: now - Duration::days(10),
            source: "Fixture Source".into(),
            is_active: true,
            synced_at: now,
        })
        .await
        .unwrap();

    let app = test_router(Arc::new(DeadFetcher), store);
    let (status, v) = get_json(app, "GET", "/api/news").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["success"], true);
    assert_eq!(v["source"], "cache");
    assert_eq!(v["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn news_envelope_falls_back_to_curated_content_when_everything_is_empty() {
    let app = test_router(Arc::new(DeadFetcher), Arc::new(MemoryStore::new()));
    let (status, v) = get_json(app, "GET", "/api/news").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["success"], true, "degraded mode still succeeds");
    assert_eq!(v["source"], "fallback");
    let data = v["data"].as_array().unwrap();
    assert!(!data.is_empty(), "fallback payload must never be empty");
    assert!(data.iter().all(|a| a["source"] == "fallback"));
}

#[tokio::test]
async fn ingest_endpoint_returns_the_run_report() {
    let app = test_router(Arc::new(live_fixture()), Arc::new(MemoryStore::new()));
    let (status, v) = get_json(app, "POST", "/api/ingest").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["success"], true);
    assert_eq!(v["source"], "live");
    assert_eq!(v["data"]["inserted"], 1);
    assert_eq!(v["data"]["sources_ok"], 1);
    let results = v["data"]["results"].as_array().unwrap();
    assert_eq!(results[0]["status"], "inserted");
}
