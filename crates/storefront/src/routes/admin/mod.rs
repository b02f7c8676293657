//! Admin API.
//!
//! Everything here sits behind [`crate::middleware::require_admin`], which
//! reads the role from `profile` on every request and puts the admin into
//! the request extensions, so handlers take [`crate::middleware::RequireAuth`]
//! to learn who is acting.

pub mod comments;
pub mod dashboard;
pub mod products;
pub mod users;

use axum::{
    Router,
    routing::{get, patch},
};

use crate::state::AppState;

/// Create the admin routes router (mounted at `/admin`).
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .route("/products", get(products::index).post(products::create))
        .route(
            "/products/{id}",
            patch(products::update).delete(products::delete),
        )
        .route("/users", get(users::index))
        .route("/users/{id}", patch(users::update).delete(users::delete))
        .route("/comments", get(comments::index))
        .route(
            "/comments/{id}",
            patch(comments::update).delete(comments::delete),
        )
}
