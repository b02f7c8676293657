//! Checkout and order history.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use crate::db::orders::OrderRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::{Order, ShippingDetails};
use crate::state::AppState;

/// Checkout form.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub email: String,
    pub phone: String,
    pub shipping_address: String,
}

/// Turn the basket into a pending order.
///
/// POST /api/checkout
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let details = ShippingDetails::parse(&body.email, &body.phone, &body.shipping_address)
        .map_err(|m| AppError::BadRequest(m.to_string()))?;

    let order = OrderRepository::new(state.pool())
        .place_from_basket(user.id, &details)
        .await?
        .ok_or_else(|| AppError::BadRequest("Səbət boşdur".to_string()))?;

    state.hub().publish(user.id);
    add_breadcrumb(
        "checkout",
        "Order placed",
        Some(&[("order_id", &order.id.to_string())]),
    );

    Ok((StatusCode::CREATED, Json(order)))
}

/// The user's orders, newest first.
///
/// GET /api/orders
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(orders))
}
