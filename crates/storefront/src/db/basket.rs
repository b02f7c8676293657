//! Basket repository.
//!
//! Every query is scoped by `user_id`, so a user can never read or modify
//! another user's lines even with a guessed item id.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use gubre_core::{BasketItemId, Price, ProductId, Quantity, UserId};

use super::{RepositoryError, not_found_on_fk};
use crate::models::basket::BasketLine;

#[derive(Debug, sqlx::FromRow)]
struct BasketLineRow {
    id: i32,
    product_id: i32,
    name: String,
    category: String,
    image: String,
    price: Decimal,
    quantity: i32,
}

impl TryFrom<BasketLineRow> for BasketLine {
    type Error = RepositoryError;

    fn try_from(row: BasketLineRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid price: {e}")))?;
        let quantity = Quantity::new(row.quantity)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid quantity: {e}")))?;

        Ok(Self::new(
            BasketItemId::new(row.id),
            ProductId::new(row.product_id),
            row.name,
            row.category,
            row.image,
            price,
            quantity,
        ))
    }
}

/// Repository for basket database operations.
pub struct BasketRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BasketRepository<'a> {
    /// Create a new basket repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All lines of a user's basket, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<BasketLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, BasketLineRow>(
            r"
            SELECT b.id, b.product_id, p.name, p.category, p.image, p.price, b.quantity
            FROM storefront.basket b
            JOIN storefront.product p ON p.id = b.product_id
            WHERE b.user_id = $1
            ORDER BY b.created_at DESC, b.id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Add `quantity` units of a product, creating the line or incrementing
    /// the existing one in a single statement.
    ///
    /// A merge that would take the line past [`Quantity::MAX`] leaves the
    /// line untouched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist and
    /// `RepositoryError::Conflict` if the merged quantity would exceed the
    /// limit.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<BasketItemId, RepositoryError> {
        let id: Option<i32> = sqlx::query_scalar(
            r"
            INSERT INTO storefront.basket (user_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = storefront.basket.quantity + EXCLUDED.quantity
            WHERE storefront.basket.quantity + EXCLUDED.quantity <= $4
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity.get())
        .bind(Quantity::MAX)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| not_found_on_fk(e, "basket_product_id_fkey"))?;

        id.map(BasketItemId::new).ok_or_else(|| {
            RepositoryError::Conflict(format!("basket quantity would exceed {}", Quantity::MAX))
        })
    }

    /// Set the quantity of one of the user's lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line is not the user's.
    #[instrument(skip(self), fields(user_id = %user_id, item_id = %item_id))]
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        item_id: BasketItemId,
        quantity: Quantity,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE storefront.basket
            SET quantity = $3
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(item_id)
        .bind(user_id)
        .bind(quantity.get())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remove one of the user's lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line is not the user's.
    #[instrument(skip(self), fields(user_id = %user_id, item_id = %item_id))]
    pub async fn remove(
        &self,
        user_id: UserId,
        item_id: BasketItemId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.basket WHERE id = $1 AND user_id = $2")
            .bind(item_id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Sum of quantities in the user's basket.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM storefront.basket WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }
}
