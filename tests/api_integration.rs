//! API integration tests
//!
//! These tests drive the JSON API and the redirect route through the full
//! router with authentication disabled.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use shortenme::app::create_app;
use shortenme::config::Config;
use shortenme::storage::{SqliteStorage, Storage};
use std::sync::Arc;
use tower::ServiceExt;

const DEPLOY_URL: &str = "http://sho.rt/";

/// Helper to create test storage
async fn create_test_storage() -> Arc<dyn Storage> {
    let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
    storage.init().await.unwrap();
    Arc::new(storage)
}

fn create_test_config() -> Config {
    Config::from_lookup(|key| match key {
        "AUTH_MODE" => Some("none".to_string()),
        "DEPLOY_URL" => Some(DEPLOY_URL.to_string()),
        _ => None,
    })
    .unwrap()
}

async fn create_test_app() -> Router {
    create_app(create_test_storage().await, &create_test_config())
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    read_json(app, request).await
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    read_json(app, request).await
}

async fn read_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn create_short7(app: &Router) -> (StatusCode, Value) {
    send_json(
        app,
        "POST",
        "/api/create",
        json!({"url": "google.com", "shorturl": "short7", "expiry": "2022-02-14T23:35:00"}),
    )
    .await
}

#[tokio::test]
async fn test_create_random_short_url() {
    let app = create_test_app().await;

    let (status, body) = send_json(&app, "POST", "/api/create", json!({"url": "google.com"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "success");
    let short_url = body["short_url"].as_str().unwrap();
    assert_eq!(short_url.len(), 8, "six random bytes encode to eight characters");
    assert_eq!(body["url"], format!("{DEPLOY_URL}{short_url}"));
}

#[tokio::test]
async fn test_create_custom_short_url_with_expiry() {
    let app = create_test_app().await;

    let (status, body) = create_short7(&app).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "success");
    assert_eq!(body["short_url"], "short7");
    assert_eq!(body["url"], "http://sho.rt/short7");
}

#[tokio::test]
async fn test_reject_duplicate_short_url() {
    let app = create_test_app().await;

    create_short7(&app).await;
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/create",
        json!({"url": "bing.com", "shorturl": "short7"}),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    // The first mapping is untouched
    let (_, analytics) = get_json(&app, "/api/analytics/short7").await;
    assert_eq!(analytics["source_url"], "http://google.com");
}

#[tokio::test]
async fn test_create_bad_payload() {
    let app = create_test_app().await;

    let (status, body) = send_json(&app, "POST", "/api/create", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let request = Request::builder()
        .method("POST")
        .uri("/api/create")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = read_json(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_create_malformed_expiry() {
    let app = create_test_app().await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/create",
        json!({"url": "google.com", "shorturl": "baddate", "expiry": "tomorrow-ish"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "date input malformed, please use ISO 8601");

    let (status, _) = get_json(&app, "/api/analytics/baddate").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_invalid_custom_code() {
    let app = create_test_app().await;

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/create",
        json!({"url": "google.com", "shorturl": "no spaces allowed"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/create",
        json!({"url": "google.com", "shorturl": "api"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_short_url() {
    let app = create_test_app().await;
    create_short7(&app).await;

    let (status, body) = send_json(&app, "DELETE", "/api/delete", json!({"shorturl": "short7"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], "success");

    // A deleted code no longer redirects
    let (status, body) = get_json(&app, "/short7").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_delete_missing_short_url() {
    let app = create_test_app().await;

    let (status, body) = send_json(&app, "DELETE", "/api/delete", json!({"shorturl": "short7"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, _) = send_json(&app, "DELETE", "/api/delete", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_analytics_for_short_url() {
    let app = create_test_app().await;
    create_short7(&app).await;

    let (status, body) = get_json(&app, "/api/analytics/short7").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source_url"], "http://google.com");
    assert_eq!(body["views"], 0);
    assert_eq!(body["expiry"], "2022-02-14 23:35:00");
    assert!(body["created_utc"].is_string());
}

#[tokio::test]
async fn test_analytics_missing_short_url() {
    let app = create_test_app().await;

    let (status, body) = get_json(&app, "/api/analytics/nothing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_redirect_counts_views() {
    let app = create_test_app().await;
    send_json(
        &app,
        "POST",
        "/api/create",
        json!({"url": "example.com/landing?ref=x", "shorturl": "live"}),
    )
    .await;

    let request = Request::builder().uri("/live").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "http://example.com/landing?ref=x"
    );

    let (_, body) = get_json(&app, "/api/analytics/live").await;
    assert_eq!(body["views"], 1);
}

#[tokio::test]
async fn test_redirect_expired_short_url() {
    let app = create_test_app().await;
    create_short7(&app).await;

    let (status, body) = get_json(&app, "/short7").await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["error"], "sorry, that URL has expired");

    let (_, analytics) = get_json(&app, "/api/analytics/short7").await;
    assert_eq!(analytics["views"], 0, "expired redirects are not counted");
}

#[tokio::test]
async fn test_redirect_unknown_short_url() {
    let app = create_test_app().await;

    let (status, body) = get_json(&app, "/unknown").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_overview() {
    let app = create_test_app().await;
    send_json(&app, "POST", "/api/create", json!({"url": "a.com", "shorturl": "a"})).await;
    send_json(&app, "POST", "/api/create", json!({"url": "b.com", "shorturl": "b"})).await;
    get_json(&app, "/a").await;
    get_json(&app, "/a").await;

    let (status, body) = get_json(&app, "/api/analytics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url_count"], 2);
    assert_eq!(body["total_views"], 2);
    assert!(body.get("urls").is_none());

    let (_, body) = get_json(&app, "/api/analytics?include_urls=true&limit=1").await;
    let urls = body["urls"].as_array().unwrap();
    assert_eq!(urls.len(), 1);
}

#[tokio::test]
async fn test_malformed_query_and_path_return_json_errors() {
    let app = create_test_app().await;

    for uri in [
        "/api/analytics?include_urls=true&limit=abc",
        "/%FF",
        "/api/analytics/%FF",
    ] {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json",
            "{uri}"
        );

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].is_string(), "{uri}");
    }
}

#[tokio::test]
async fn test_create_rejects_control_characters() {
    let app = create_test_app().await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/create",
        json!({"url": "example.com/a\nb", "shorturl": "ctrl"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = get_json(&app, "/api/analytics/ctrl").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app().await;

    let (status, body) = get_json(&app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
}
