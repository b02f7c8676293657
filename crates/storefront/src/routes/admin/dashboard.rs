//! Admin dashboard.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Serialize;
use tracing::instrument;

use crate::db::comments::CommentRepository;
use crate::db::orders::OrderRepository;
use crate::db::products::ProductRepository;
use crate::db::users::UserRepository;
use crate::error::Result;
use crate::models::Product;
use crate::routes::products::ListQuery;
use crate::state::AppState;

/// Counters and the (optionally filtered) product table.
#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub product_count: i64,
    pub products: Vec<Product>,
    pub user_count: i64,
    pub comment_count: i64,
    pub order_count: i64,
}

/// Dashboard overview.
///
/// GET /admin?q=
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Dashboard>> {
    let pool = state.pool();
    let catalog = ProductRepository::new(pool);
    let users = UserRepository::new(pool);
    let comments = CommentRepository::new(pool);
    let orders = OrderRepository::new(pool);
    let filter = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());

    let (product_count, products, user_count, comment_count, order_count) = tokio::try_join!(
        catalog.count(),
        catalog.list(filter),
        users.count(),
        comments.count(),
        orders.count(),
    )?;

    Ok(Json(Dashboard {
        product_count,
        products,
        user_count,
        comment_count,
        order_count,
    }))
}
