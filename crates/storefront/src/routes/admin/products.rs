//! Admin product management.
//!
//! Every mutation drops the cached catalog. Deletion cascades to basket
//! lines and comments; owners of the removed lines get a basket event.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use tracing::{info, instrument};

use gubre_core::ProductId;

use crate::db::products::ProductRepository;
use crate::error::{AppError, OrNotFound, Result};
use crate::models::{NewProduct, Product, ProductUpdate};
use crate::routes::products::PRODUCT_NOT_FOUND;
use crate::state::AppState;

/// Result of a product deletion.
#[derive(Debug, Serialize)]
pub struct DeleteProductResponse {
    pub product_id: ProductId,
    pub removed_basket_lines: i64,
    pub notified_users: usize,
}

/// All products.
///
/// GET /admin/products
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool()).list(None).await?;
    Ok(Json(products))
}

/// Create a product.
///
/// POST /admin/products
#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = body
        .normalized()
        .map_err(|m| AppError::BadRequest(m.to_string()))?;

    let product = ProductRepository::new(state.pool()).create(&product).await?;
    state.catalog().invalidate_all().await;

    info!(product_id = %product.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// Partially update a product.
///
/// PATCH /admin/products/{id}
#[instrument(skip(state, body))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<ProductUpdate>,
) -> Result<Json<Product>> {
    let update = body
        .normalized()
        .map_err(|m| AppError::BadRequest(m.to_string()))?;
    if update.is_empty() {
        return Err(AppError::BadRequest("Dəyişiklik yoxdur".to_string()));
    }

    let product = ProductRepository::new(state.pool())
        .update(ProductId::new(id), &update)
        .await
        .or_not_found(PRODUCT_NOT_FOUND)?;
    state.catalog().invalidate_all().await;

    Ok(Json(product))
}

/// Delete a product.
///
/// DELETE /admin/products/{id}
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DeleteProductResponse>> {
    let deletion = ProductRepository::new(state.pool())
        .delete(ProductId::new(id))
        .await
        .or_not_found(PRODUCT_NOT_FOUND)?;
    state.catalog().invalidate_all().await;

    let notified_users = deletion.affected_users.len();
    state.hub().publish_all(deletion.affected_users);

    info!(
        product_id = %deletion.product_id,
        removed_basket_lines = deletion.removed_basket_lines,
        notified_users,
        "Product deleted"
    );

    Ok(Json(DeleteProductResponse {
        product_id: deletion.product_id,
        removed_basket_lines: deletion.removed_basket_lines,
        notified_users,
    }))
}
