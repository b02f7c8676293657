//! Logged-in API flows against a migrated database.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::pin::pin;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures::StreamExt;
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgPool;

use gubre_core::{Price, ProductId, UserId};
use gubre_integration_tests::{TestApp, body_json, get, post_json, with_cookie};
use gubre_storefront::db::products::ProductRepository;
use gubre_storefront::models::NewProduct;
use gubre_storefront::services::realtime::BasketEvent;

async fn product(pool: &PgPool, name: &str) -> ProductId {
    ProductRepository::new(pool)
        .create(&NewProduct {
            name: name.to_string(),
            description: "Kompleks NPK gübrəsi".to_string(),
            category: "Kompleks".to_string(),
            image: "/images/npk.jpg".to_string(),
            price: Price::new(Decimal::new(4200, 2)).unwrap(),
        })
        .await
        .unwrap()
        .id
}

fn user_id(me: &serde_json::Value) -> UserId {
    serde_json::from_value(me["id"].clone()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .header("x-forwarded-for", "203.0.113.10")
        .body(Body::empty())
        .unwrap()
}

#[sqlx::test(migrations = "../storefront/migrations")]
async fn test_checkout_with_empty_basket_is_bad_request(pool: PgPool) {
    let app = TestApp::with_pool(pool).await;
    let (cookie, _) = app.register("fermer@gubre.az").await;

    let response = app
        .send(with_cookie(
            post_json(
                "/api/checkout",
                &json!({
                    "email": "fermer@gubre.az",
                    "phone": "+994501234567",
                    "shipping_address": "Şəki, M. F. Axundov küç. 12",
                }),
            ),
            &cookie,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Səbət boşdur");
}

#[sqlx::test(migrations = "../storefront/migrations")]
async fn test_add_to_cart_grows_badge_by_quantity(pool: PgPool) {
    let npk = product(&pool, "NPK 15-15-15").await;
    let app = TestApp::with_pool(pool).await;
    let (cookie, _) = app.register("fermer@gubre.az").await;

    let add = |quantity: i32| {
        with_cookie(
            post_json(
                "/api/cart/items",
                &json!({ "product_id": npk, "quantity": quantity }),
            ),
            &cookie,
        )
    };

    let response = app.send(add(3)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["item_count"], 3);

    let response = app.send(add(4)).await;
    let basket = body_json(response).await;
    assert_eq!(basket["item_count"], 7);
    assert_eq!(basket["items"].as_array().unwrap().len(), 1);

    let response = app.send(with_cookie(get("/api/cart/count"), &cookie)).await;
    assert_eq!(body_json(response).await["count"], 7);
}

#[sqlx::test(migrations = "../storefront/migrations")]
async fn test_add_past_quantity_limit_is_bad_request(pool: PgPool) {
    let npk = product(&pool, "NPK 15-15-15").await;
    let app = TestApp::with_pool(pool).await;
    let (cookie, _) = app.register("fermer@gubre.az").await;

    let add = |quantity: i32| {
        with_cookie(
            post_json(
                "/api/cart/items",
                &json!({ "product_id": npk, "quantity": quantity }),
            ),
            &cookie,
        )
    };

    assert_eq!(app.send(add(990)).await.status(), StatusCode::OK);

    let response = app.send(add(10)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.send(with_cookie(get("/api/cart/count"), &cookie)).await;
    assert_eq!(body_json(response).await["count"], 990);
}

#[sqlx::test(migrations = "../storefront/migrations")]
async fn test_reply_to_reply_is_rejected(pool: PgPool) {
    let npk = product(&pool, "NPK 15-15-15").await;
    let app = TestApp::with_pool(pool).await;
    let (cookie, _) = app.register("fermer@gubre.az").await;
    let uri = format!("/api/products/{npk}/comments");

    let post = |body: serde_json::Value| with_cookie(post_json(&uri, &body), &cookie);

    let response = app.send(post(json!({ "content": "Pambıq üçün yaxşıdır?" }))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let root = body_json(response).await["id"].clone();

    let response = app
        .send(post(json!({ "content": "Bəli, yazda verin.", "parent_id": root })))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let reply = body_json(response).await["id"].clone();

    let response = app
        .send(post(json!({ "content": "Təşəkkürlər!", "parent_id": reply })))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "Yalnız əsas rəyə cavab yazmaq olar"
    );

    // Every stored comment is visible in the thread listing.
    let threads = body_json(app.send(get(&uri)).await).await;
    let threads = threads.as_array().unwrap();
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0]["replies"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../storefront/migrations")]
async fn test_admin_product_delete_clears_baskets_and_notifies(pool: PgPool) {
    let npk = product(&pool, "NPK 15-15-15").await;
    let app = TestApp::with_pool(pool.clone()).await;

    let (admin_cookie, admin) = app.register("admin@gubre.az").await;
    sqlx::query("UPDATE storefront.profile SET role = 'admin' WHERE id = $1")
        .bind(user_id(&admin))
        .execute(&pool)
        .await
        .unwrap();

    let (shopper_cookie, shopper) = app.register("fermer@gubre.az").await;
    let response = app
        .send(with_cookie(
            post_json(
                "/api/cart/items",
                &json!({ "product_id": npk, "quantity": 2 }),
            ),
            &shopper_cookie,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let mut events = pin!(app.state.hub().subscribe_user(user_id(&shopper)));

    let response = app
        .send(with_cookie(
            delete(&format!("/admin/products/{npk}")),
            &admin_cookie,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let deletion = body_json(response).await;
    assert_eq!(deletion["removed_basket_lines"], 1);
    assert_eq!(deletion["notified_users"], 1);

    let event = tokio::time::timeout(Duration::from_secs(1), events.next())
        .await
        .unwrap();
    assert_eq!(event, Some(BasketEvent::Changed));

    let response = app
        .send(with_cookie(get("/api/cart/count"), &shopper_cookie))
        .await;
    assert_eq!(body_json(response).await["count"], 0);
}

#[sqlx::test(migrations = "../storefront/migrations")]
async fn test_admin_dashboard_counts_and_filters(pool: PgPool) {
    product(&pool, "NPK 15-15-15").await;
    product(&pool, "Superfosfat").await;
    let app = TestApp::with_pool(pool.clone()).await;

    let (cookie, admin) = app.register("admin@gubre.az").await;
    sqlx::query("UPDATE storefront.profile SET role = 'admin' WHERE id = $1")
        .bind(user_id(&admin))
        .execute(&pool)
        .await
        .unwrap();

    let response = app.send(with_cookie(get("/admin?q=npk"), &cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let dashboard = body_json(response).await;
    assert_eq!(dashboard["product_count"], 2);
    assert_eq!(dashboard["user_count"], 1);
    assert_eq!(dashboard["comment_count"], 0);
    assert_eq!(dashboard["order_count"], 0);
    let products = dashboard["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["name"], "NPK 15-15-15");
}
