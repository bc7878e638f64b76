mod common;

use common::{BrokenProbe, TestApp};
use status_service::services::connection::MockConnector;
use std::sync::Arc;

#[tokio::test]
async fn health_reports_connected_database() {
    let app = TestApp::spawn().await;
    app.wait_until_connected().await;

    let response = app
        .client()
        .get(app.url("/api/health"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "UP");
    assert_eq!(body["database"], "Connected");
    assert_eq!(body["environment"], "test");
    assert!(body["uptime"].as_f64().expect("uptime is a number") >= 0.0);

    let timestamp = body["timestamp"].as_str().expect("timestamp is a string");
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
    assert!(timestamp.ends_with('Z'));
}

#[tokio::test]
async fn health_stays_up_while_database_is_unreachable() {
    let app = TestApp::spawn_with(
        MockConnector::failing("connection refused"),
        Arc::new(common::FixedProbe),
    )
    .await;

    let response = app
        .client()
        .get(app.url("/api/health"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "UP");
    assert_eq!(body["database"], "Disconnected");
}

#[tokio::test]
async fn health_recovers_after_failed_attempts() {
    let app = TestApp::spawn_with(
        MockConnector::failing_then_succeeding(3),
        Arc::new(common::FixedProbe),
    )
    .await;
    app.wait_until_connected().await;

    let body: serde_json::Value = app
        .client()
        .get(app.url("/api/health"))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse JSON");

    assert_eq!(body["database"], "Connected");
    assert_eq!(app.connector.attempts(), 4);
}

#[tokio::test]
async fn status_reports_memory_in_megabytes() {
    let app = TestApp::spawn().await;
    app.wait_until_connected().await;

    let response = app
        .client()
        .get(app.url("/api/status"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "Connected");
    assert_eq!(body["memory"]["heapUsed"], "64 MB");
    assert_eq!(body["memory"]["heapTotal"], "256 MB");
    assert!(body["uptime"].is_number());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn status_degrades_when_memory_sampling_fails() {
    let app = TestApp::spawn_with(MockConnector::succeeding(), Arc::new(BrokenProbe)).await;

    let response = app
        .client()
        .get(app.url("/api/status"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 503);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "unhealthy");
    let error = body["error"].as_str().expect("error is a string");
    assert!(!error.is_empty());
    assert!(error.contains("platform memory counters unavailable"));
}

#[tokio::test]
async fn health_does_not_depend_on_memory_sampling() {
    let app = TestApp::spawn_with(MockConnector::succeeding(), Arc::new(BrokenProbe)).await;

    let response = app
        .client()
        .get(app.url("/api/health"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
}
