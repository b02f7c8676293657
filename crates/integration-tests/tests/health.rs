//! Liveness, readiness and common response headers.

use axum::http::{HeaderValue, StatusCode};
use gubre_integration_tests::{TestApp, body_text, get};

#[tokio::test]
async fn test_health_is_ok_without_database() {
    let app = TestApp::new();

    let response = app.send(get("/health")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_reports_unreachable_database() {
    let app = TestApp::new();

    let response = app.send(get("/health/ready")).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let app = TestApp::new();

    let response = app.send(get("/health")).await;
    let headers = response.headers();

    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert!(headers.contains_key("content-security-policy"));
}

#[tokio::test]
async fn test_request_id_generated_when_missing() {
    let app = TestApp::new();

    let response = app.send(get("/health")).await;

    let id = response.headers()["x-request-id"]
        .to_str()
        .expect("ascii request id");
    assert_eq!(id.len(), 36);
}

#[tokio::test]
async fn test_upstream_request_id_echoed() {
    let app = TestApp::new();
    let mut request = get("/health");
    request
        .headers_mut()
        .insert("x-request-id", HeaderValue::from_static("cf-ray.8a1b2c3d"));

    let response = app.send(request).await;

    assert_eq!(response.headers()["x-request-id"], "cf-ray.8a1b2c3d");
}
