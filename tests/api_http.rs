// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use content_hub::api::{self, AppState};
use content_hub::source::{SourceAdapter, StoreAdapter};
use content_hub::store::MemoryStore;
use content_hub::{Aggregator, ContentHub, Identity, OwnershipResolver, SourceKey, StaticIdentity};
use serde_json::{json, Value as Json};
use tower::ServiceExt as _; // for `oneshot`

const BODY_LIMIT: usize = 1024 * 1024;

async fn test_router(identity: StaticIdentity) -> Router {
    let jobs = MemoryStore::from_json(vec![
        json!({"id": 1, "title": "Cook", "company": "Dockside", "userId": "u1", "createdAt": "2024-01-02T00:00:00Z"}),
    ]);
    let news = MemoryStore::new(vec![]).failing("backend offline");
    let sources: Vec<Arc<dyn SourceAdapter>> = vec![
        Arc::new(StoreAdapter::new(SourceKey::Jobs, Arc::new(jobs))),
        Arc::new(StoreAdapter::new(SourceKey::News, Arc::new(news))),
    ];
    let hub = ContentHub::new(
        Arc::new(identity),
        Aggregator::new(sources, OwnershipResolver::default()),
    );
    let _ = hub.reload().await;
    api::router(AppState::new(Arc::new(hub)))
}

fn signed_in() -> StaticIdentity {
    StaticIdentity::signed_in(Identity::new("u1", None::<String>))
}

async fn call(app: Router, method: &str, uri: &str) -> (StatusCode, Json) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let v = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
    (status, v)
}

#[tokio::test]
async fn health_returns_ok() {
    let app = test_router(signed_in()).await;
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn content_lists_records_and_degraded_sources() {
    let app = test_router(signed_in()).await;
    let (status, v) = call(app, "GET", "/content").await;
    assert_eq!(status, StatusCode::OK);

    let records = v["records"].as_array().expect("records array");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["source_key"], "jobs");
    assert_eq!(records[0]["secondary_fields"]["company"], "Dockside");
    assert_eq!(v["degraded"], true);
    assert_eq!(v["degraded_sources"][0]["key"], "news");
    assert_eq!(v["empty_state"], "has_content");
}

#[tokio::test]
async fn delete_maps_outcomes_to_status_codes() {
    let app = test_router(signed_in()).await;

    let (status, v) = call(app.clone(), "DELETE", "/content/jobs/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["outcome"], "deleted");
    assert_eq!(v["removed_from_view"], true);

    let (status, v) = call(app.clone(), "DELETE", "/content/jobs/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["outcome"], "not_found");

    let (_, v) = call(app, "GET", "/content").await;
    assert_eq!(v["records"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn unknown_source_is_bad_request() {
    let app = test_router(signed_in()).await;
    let req = Request::builder()
        .method("DELETE")
        .uri("/content/blog/1")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn signed_out_reload_and_delete_are_refused() {
    let app = test_router(StaticIdentity::signed_out()).await;

    let (status, v) = call(app.clone(), "POST", "/content/reload").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(v["status"], "unauthenticated");

    let (status, v) = call(app, "DELETE", "/content/jobs/1").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(v["outcome"], "forbidden");
}
