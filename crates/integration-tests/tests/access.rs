//! Anonymous access: the admin guard and the authenticated API surface.

use axum::http::{StatusCode, header::LOCATION};
use gubre_integration_tests::{TestApp, body_json, get, post_json};
use serde_json::json;

#[tokio::test]
async fn test_anonymous_admin_dashboard_redirects_home() {
    let app = TestApp::new();

    let response = app.send(get("/admin")).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/");
}

#[tokio::test]
async fn test_anonymous_admin_api_redirects_home() {
    let app = TestApp::new();

    for path in ["/admin/products", "/admin/users", "/admin/comments"] {
        let response = app.send(get(path)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(response.headers()[LOCATION], "/", "{path}");
    }
}

#[tokio::test]
async fn test_anonymous_cart_is_unauthorized_json() {
    let app = TestApp::new();

    let response = app.send(get("/api/cart")).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Zəhmət olmasa daxil olun");
}

#[tokio::test]
async fn test_anonymous_cart_count_is_zero() {
    let app = TestApp::new();

    let response = app.send(get("/api/cart/count")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "count": 0 }));
}

#[tokio::test]
async fn test_anonymous_add_to_cart_is_unauthorized() {
    let app = TestApp::new();

    let response = app
        .send(post_json(
            "/api/cart/items",
            &json!({ "product_id": 1, "quantity": 2 }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_anonymous_profile_routes_are_unauthorized() {
    let app = TestApp::new();

    for path in ["/api/profile", "/api/orders", "/api/auth/me", "/api/cart/events"] {
        let response = app.send(get(path)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{path}");
    }
}

#[tokio::test]
async fn test_anonymous_checkout_is_unauthorized() {
    let app = TestApp::new();

    let response = app
        .send(post_json(
            "/api/checkout",
            &json!({
                "email": "fermer@gubre.az",
                "phone": "+994501234567",
                "shipping_address": "Bakı, Nizami küç. 10"
            }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
