//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness
//! GET  /health/ready                - Database ping
//! GET  /files/*                     - Stored avatars and gallery files
//!
//! # Auth (register/login rate limited)
//! POST /api/auth/register           - Create account and log in
//! POST /api/auth/login              - Log in
//! POST /api/auth/logout             - Log out
//! GET  /api/auth/me                 - Current user
//!
//! # Catalog
//! GET  /api/products?q=             - Product listing
//! GET  /api/products/{id}           - Product detail
//! GET  /api/products/{id}/comments  - Threaded comments
//! POST /api/products/{id}/comments  - Post comment or reply
//! POST /api/comments/{id}/like      - Toggle comment like
//!
//! # Cart (requires auth, except the badge count)
//! GET    /api/cart                  - Basket with totals
//! POST   /api/cart/items            - Add product
//! PATCH  /api/cart/items/{id}       - Set quantity (<= 0 removes)
//! DELETE /api/cart/items/{id}       - Remove line
//! GET    /api/cart/count            - Badge count
//! GET    /api/cart/events           - Basket change stream (SSE)
//!
//! # Checkout
//! POST /api/checkout                - Place order from basket
//! GET  /api/orders                  - Order history
//!
//! # Profile (requires auth)
//! GET    /api/profile               - Profile
//! PUT    /api/profile               - Update names and feedback
//! DELETE /api/profile               - Delete account
//! POST   /api/profile/avatar        - Upload avatar (multipart)
//!
//! # Media
//! GET    /api/media                 - Gallery
//! POST   /api/media                 - Upload (multipart)
//! DELETE /api/media/{id}            - Delete (owner or admin)
//! POST   /api/media/{id}/like       - Toggle like
//!
//! # Admin (admin role, see `admin` module)
//! GET  /admin?q=                    - Dashboard
//! ...  /admin/products, /admin/users, /admin/comments
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod comments;
pub mod media;
pub mod products;
pub mod profile;
pub mod upload;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Room for multipart boundaries and text fields on top of the file limit.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    let credentials = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(auth_rate_limiter());

    Router::new()
        .merge(credentials)
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
        .route(
            "/{id}/comments",
            get(comments::index).post(comments::create),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/items", post(cart::add))
        .route("/items/{id}", patch(cart::update).delete(cart::remove))
        .route("/count", get(cart::count))
        .route("/events", get(cart::events))
}

/// Create the profile routes router.
pub fn profile_routes(upload_limit: usize) -> Router<AppState> {
    let avatar = Router::new()
        .route("/avatar", post(profile::upload_avatar))
        .layer(DefaultBodyLimit::max(upload_limit));

    Router::new()
        .route(
            "/",
            get(profile::show)
                .put(profile::update)
                .delete(profile::delete_account),
        )
        .merge(avatar)
}

/// Create the media routes router.
pub fn media_routes(upload_limit: usize) -> Router<AppState> {
    let upload = Router::new()
        .route("/", get(media::index).post(media::upload))
        .layer(DefaultBodyLimit::max(upload_limit));

    Router::new()
        .merge(upload)
        .route("/{id}", axum::routing::delete(media::delete))
        .route("/{id}/like", post(media::toggle_like))
}

/// Create all `/api` routes.
///
/// `max_upload_bytes` caps a single uploaded file; the request body limit
/// of the upload routes is derived from it.
pub fn api_routes(max_upload_bytes: usize) -> Router<AppState> {
    let upload_limit = max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .nest("/auth", auth_routes())
        .nest("/products", product_routes())
        .route("/comments/{id}/like", post(comments::toggle_like))
        .nest("/cart", cart_routes())
        .route("/checkout", post(checkout::checkout))
        .route("/orders", get(checkout::orders))
        .nest("/profile", profile_routes(upload_limit))
        .nest("/media", media_routes(upload_limit))
}
