mod common;

use common::TestApp;
use status_service::services::init_metrics;
use std::sync::Once;

// Initialize metrics once for all tests
static INIT_METRICS: Once = Once::new();

fn ensure_metrics_initialized() {
    INIT_METRICS.call_once(|| {
        init_metrics().expect("Failed to install metrics recorder");
    });
}

#[tokio::test]
async fn test_endpoint_reports_environment() {
    let app = TestApp::spawn().await;

    let response = app
        .client()
        .get(app.url("/api/test"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["message"], "Backend is working!");
    assert_eq!(body["environment"], "test");
}

#[tokio::test]
async fn unknown_routes_return_json_404() {
    let app = TestApp::spawn().await;

    let response = app
        .client()
        .get(app.url("/api/does-not-exist"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 404);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Route not found");
    assert_eq!(body["path"], "/api/does-not-exist");
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let app = TestApp::spawn().await;

    let response = app
        .client()
        .get(app.url("/api/test"))
        .send()
        .await
        .expect("Failed to execute request");

    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
    assert!(headers["strict-transport-security"]
        .to_str()
        .unwrap()
        .contains("preload"));
    assert!(headers.contains_key("content-security-policy"));
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn cors_allows_the_frontend_origin() {
    let app = TestApp::spawn().await;

    let response = app
        .client()
        .get(app.url("/api/test"))
        .header("Origin", "http://localhost:3000")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "http://localhost:3000"
    );
    assert_eq!(response.headers()["access-control-allow-credentials"], "true");
}

#[tokio::test]
async fn frontend_index_is_served() {
    let app = TestApp::spawn().await;

    let response = app
        .client()
        .get(app.url("/"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let body = response.text().await.expect("Failed to read body");
    assert!(body.contains("/static/app.js"));

    let script = app
        .client()
        .get(app.url("/static/app.js"))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(script.status(), 200);
    assert!(script.text().await.unwrap().contains("/api/test"));
}

#[tokio::test]
async fn metrics_endpoint_returns_prometheus_format() {
    ensure_metrics_initialized();
    let app = TestApp::spawn().await;
    app.wait_until_connected().await;

    // Generate at least one recorded request.
    app.client()
        .get(app.url("/api/health"))
        .send()
        .await
        .expect("Failed to execute request");

    let response = app
        .client()
        .get(app.url("/metrics"))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());

    let content_type = response
        .headers()
        .get("content-type")
        .expect("Missing content-type header")
        .to_str()
        .expect("Invalid content-type");
    assert!(content_type.starts_with("text/plain"));

    let body = response.text().await.expect("Failed to get response body");
    assert!(
        body.contains("http_requests_total"),
        "Unexpected metrics output: {}",
        body
    );
}

#[tokio::test]
async fn empty_connection_uri_fails_fast() {
    let config = common::test_config(&[("MONGODB_URI", "")]);
    let result = status_service::startup::Application::build_with(
        config,
        std::sync::Arc::new(status_service::services::connection::MockConnector::succeeding()),
        std::sync::Arc::new(common::FixedProbe),
    )
    .await;

    assert!(matches!(
        result,
        Err(service_core::error::AppError::ConfigError(_))
    ));
}
