#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use pinboard_api::config::ServerConfig;
use pinboard_api::router::build_app_router;
use pinboard_api::state::AppState;
use pinboard_api::store::{InMemoryShareStore, ShareStore};

/// A small PNG data URI. The gateway only checks the media type.
pub const PNG_DATA_URI: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8BQDwAEhQGAhKmMIQAAAABJRU5ErkJggg==";

/// Origin sent on cross-origin test requests.
pub const TEST_ORIGIN: &str = "http://viewer.example.com";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        share_ttl_hours: 168,
        share_sweep_interval_secs: 3600,
        max_body_bytes: 1024 * 1024,
        public_base_url: "http://localhost:3000".to_string(),
    }
}

/// Build the full application router over a fresh in-memory store.
///
/// Uses the same [`build_app_router`] as the binary, so tests exercise the
/// production middleware stack (CORS, request ID, timeout, tracing, panic
/// recovery, body limit).
pub fn build_test_app() -> Router {
    build_test_app_with_store(Arc::new(InMemoryShareStore::new()))
}

/// Same as [`build_test_app`], over a store the test keeps a handle to.
pub fn build_test_app_with_store(store: Arc<dyn ShareStore>) -> Router {
    let config = test_config();
    let state = AppState {
        store,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

/// Send a GET request with an `Origin` header.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header("origin", TEST_ORIGIN)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST a JSON body with an `Origin` header.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    post_raw(app, uri, "application/json", body.to_string()).await
}

/// POST an arbitrary body with the given content type.
pub async fn post_raw(
    app: Router,
    uri: &str,
    content_type: &str,
    body: impl Into<Body>,
) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("origin", TEST_ORIGIN)
        .header("content-type", content_type)
        .body(body.into())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Create a share and return its id.
pub async fn create_share(app: Router, body: serde_json::Value) -> String {
    let response = post_json(app, "/api/share", body).await;
    assert_eq!(response.status(), 200, "share creation failed");
    let json = body_json(response).await;
    json["id"].as_str().expect("id must be a string").to_string()
}
