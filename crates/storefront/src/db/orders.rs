//! Order repository.
//!
//! Checkout turns the basket into an order atomically: the basket rows are
//! locked, snapshotted into `order_item`, summed, and deleted in one
//! transaction. Prices come from the catalog at checkout time, never from the
//! client.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{info, instrument};

use gubre_core::{Email, OrderId, OrderStatus, Price, ProductId, Quantity, UserId};

use super::RepositoryError;
use crate::models::order::{Order, OrderItem, ShippingDetails};

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    email: String,
    phone: String,
    shipping_address: String,
    status: String,
    total_amount: Decimal,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email on order {}: {e}", self.id))
        })?;
        let status: OrderStatus = self
            .status
            .parse()
            .map_err(RepositoryError::DataCorruption)?;
        let total_amount = Price::new(self.total_amount)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid total: {e}")))?;

        Ok(Order {
            id: OrderId::new(self.id),
            email,
            phone: self.phone,
            shipping_address: self.shipping_address,
            status,
            total_amount,
            created_at: self.created_at,
            items,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    order_id: i32,
    product_id: Option<i32>,
    product_name: String,
    unit_price: Decimal,
    quantity: i32,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        order_item(row.product_id, row.product_name, row.unit_price, row.quantity)
    }
}

fn order_item(
    product_id: Option<i32>,
    product_name: String,
    unit_price: Decimal,
    quantity: i32,
) -> Result<OrderItem, RepositoryError> {
    let unit_price = Price::new(unit_price)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid unit price: {e}")))?;
    let quantity = Quantity::new(quantity)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid quantity: {e}")))?;

    Ok(OrderItem {
        product_id: product_id.map(ProductId::new),
        product_name,
        unit_price,
        quantity,
        line_total: unit_price.times(quantity),
    })
}

/// Basket line as read inside the checkout transaction.
#[derive(Debug, sqlx::FromRow)]
struct CheckoutLineRow {
    product_id: i32,
    name: String,
    price: Decimal,
    quantity: i32,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order from the user's current basket.
    ///
    /// Returns `Ok(None)` when the basket is empty; nothing is written then.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; the
    /// transaction is rolled back and the basket is left untouched.
    #[instrument(skip(self, details), fields(user_id = %user_id))]
    pub async fn place_from_basket(
        &self,
        user_id: UserId,
        details: &ShippingDetails,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let lines = sqlx::query_as::<_, CheckoutLineRow>(
            r"
            SELECT b.product_id, p.name, p.price, b.quantity
            FROM storefront.basket b
            JOIN storefront.product p ON p.id = b.product_id
            WHERE b.user_id = $1
            ORDER BY b.created_at ASC, b.id ASC
            FOR UPDATE OF b
            ",
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        if lines.is_empty() {
            return Ok(None);
        }

        let items = lines
            .into_iter()
            .map(|line| order_item(Some(line.product_id), line.name, line.price, line.quantity))
            .collect::<Result<Vec<_>, _>>()?;

        let total: Price = items.iter().map(|i| i.line_total).sum();

        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            INSERT INTO storefront."order" (user_id, email, phone, shipping_address, status, total_amount)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, email, phone, shipping_address, status, total_amount, created_at
            "#,
        )
        .bind(user_id)
        .bind(&details.email)
        .bind(&details.phone)
        .bind(&details.shipping_address)
        .bind(OrderStatus::Pending.as_str())
        .bind(total)
        .fetch_one(&mut *tx)
        .await?;

        for item in &items {
            sqlx::query(
                r"
                INSERT INTO storefront.order_item (order_id, product_id, product_name, unit_price, quantity)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(row.id)
            .bind(item.product_id)
            .bind(&item.product_name)
            .bind(item.unit_price)
            .bind(item.quantity.get())
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM storefront.basket WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(order_id = row.id, total = %total, lines = items.len(), "Order placed");

        row.into_order(items).map(Some)
    }

    /// The user's orders with their items, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, email, phone, shipping_address, status, total_amount, created_at
            FROM storefront."order"
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let ids: Vec<i32> = orders.iter().map(|o| o.id).collect();
        let item_rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT order_id, product_id, product_name, unit_price, quantity
            FROM storefront.order_item
            WHERE order_id = ANY($1)
            ORDER BY id ASC
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut items_by_order: HashMap<i32, Vec<OrderItem>> = HashMap::new();
        for row in item_rows {
            let order_id = row.order_id;
            items_by_order
                .entry(order_id)
                .or_default()
                .push(row.try_into()?);
        }

        orders
            .into_iter()
            .map(|o| {
                let items = items_by_order.remove(&o.id).unwrap_or_default();
                o.into_order(items)
            })
            .collect()
    }

    /// Count all orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM storefront."order""#)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
