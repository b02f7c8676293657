//! Cart route handlers.
//!
//! Every mutation answers with the refetched basket so the client can
//! redraw the lines and the badge from one response. Other open tabs learn
//! about the change through `GET /api/cart/events`.

use std::convert::Infallible;

use axum::{
    Json,
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{error, instrument};

use gubre_core::{BasketItemId, ProductId, Quantity};

use super::products::PRODUCT_NOT_FOUND;
use crate::db::RepositoryError;
use crate::error::{AppError, OrNotFound, Result, add_breadcrumb};
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::Basket;
use crate::services::cart::CartService;
use crate::state::AppState;

const ADD_FAILED: &str = "Səbətə əlavə edilmədi";
const LINE_NOT_FOUND: &str = "Səbət sətri tapılmadı";

/// Add-to-cart payload.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: i32,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

const fn default_quantity() -> i32 {
    1
}

/// Quantity change payload; zero or less removes the line.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i32,
}

/// Badge count.
#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

/// The user's basket.
///
/// GET /api/cart
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Basket>> {
    let basket = CartService::new(state.pool(), state.hub()).get(user.id).await?;
    Ok(Json(basket))
}

/// Add units of a product.
///
/// POST /api/cart/items
#[instrument(skip(state, user, body), fields(user_id = %user.id, product_id = body.product_id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<AddItemRequest>,
) -> Result<Json<Basket>> {
    let quantity = Quantity::new(body.quantity).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let product_id = ProductId::new(body.product_id);

    let basket = CartService::new(state.pool(), state.hub())
        .add(user.id, product_id, quantity)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(PRODUCT_NOT_FOUND.to_string()),
            RepositoryError::Conflict(_) => AppError::BadRequest(format!(
                "Səbətdə bir məhsuldan ən çox {} ədəd ola bilər",
                Quantity::MAX
            )),
            other => {
                error!(error = %other, "Add to cart failed");
                AppError::Unavailable(ADD_FAILED.to_string())
            }
        })?;

    add_breadcrumb(
        "cart",
        "Added to basket",
        Some(&[("product_id", &product_id.to_string())]),
    );

    Ok(Json(basket))
}

/// Change a line's quantity.
///
/// PATCH /api/cart/items/{id}
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
    Json(body): Json<UpdateItemRequest>,
) -> Result<Json<Basket>> {
    let quantity = if body.quantity <= 0 {
        None
    } else {
        Some(Quantity::new(body.quantity).map_err(|e| AppError::BadRequest(e.to_string()))?)
    };

    let basket = CartService::new(state.pool(), state.hub())
        .update_quantity(user.id, BasketItemId::new(id), quantity)
        .await
        .or_not_found(LINE_NOT_FOUND)?;
    Ok(Json(basket))
}

/// Remove a line.
///
/// DELETE /api/cart/items/{id}
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<Json<Basket>> {
    let basket = CartService::new(state.pool(), state.hub())
        .remove(user.id, BasketItemId::new(id))
        .await
        .or_not_found(LINE_NOT_FOUND)?;
    Ok(Json(basket))
}

/// Badge count; zero for anonymous visitors.
///
/// GET /api/cart/count
pub async fn count(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<CountResponse>> {
    let count = match user {
        Some(user) => {
            CartService::new(state.pool(), state.hub())
                .count(user.id)
                .await?
        }
        None => 0,
    };
    Ok(Json(CountResponse { count }))
}

/// Server-sent basket change notifications for the current user.
///
/// GET /api/cart/events
pub async fn events(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let stream = state
        .hub()
        .subscribe_user(user.id)
        .map(|event| Ok(Event::default().event(event.name()).data("{}")));

    Sse::new(stream).keep_alive(KeepAlive::default())
}
