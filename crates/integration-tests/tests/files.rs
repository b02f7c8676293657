//! Uploaded files served under `/files`.

use axum::http::StatusCode;
use gubre_integration_tests::{TestApp, body_text, get};

#[tokio::test]
async fn test_stored_file_is_served() {
    let app = TestApp::new();
    let dir = app.media_dir.path().join("media");
    std::fs::create_dir_all(&dir).expect("create media dir");
    std::fs::write(dir.join("note.txt"), "salam").expect("write file");

    let response = app.send(get("/files/media/note.txt")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "salam");
}

#[tokio::test]
async fn test_missing_file_is_not_found() {
    let app = TestApp::new();

    let response = app.send(get("/files/media/absent.png")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
