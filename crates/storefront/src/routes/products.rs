//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use gubre_core::ProductId;

use crate::error::{AppError, Result};
use crate::models::Product;
use crate::state::AppState;

/// Message for a missing product.
pub const PRODUCT_NOT_FOUND: &str = "Məhsul tapılmadı";

/// Query parameters for the product listing.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Case-insensitive name filter.
    pub q: Option<String>,
}

/// All products ordered by id, optionally filtered by name.
///
/// GET /api/products?q=
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Product>>> {
    let products = state
        .catalog()
        .list(state.pool(), query.q.as_deref())
        .await?;
    Ok(Json(products))
}

/// One product.
///
/// GET /api/products/{id}
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Product>> {
    find(&state, ProductId::new(id)).await.map(Json)
}

/// Load a product or fail with a 404.
pub(crate) async fn find(state: &AppState, id: ProductId) -> Result<Product> {
    state
        .catalog()
        .get(state.pool(), id)
        .await?
        .ok_or_else(|| AppError::NotFound(PRODUCT_NOT_FOUND.to_string()))
}
