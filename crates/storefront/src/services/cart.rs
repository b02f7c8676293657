//! Cart service.
//!
//! Wraps [`BasketRepository`] so every successful mutation returns the
//! refetched basket and notifies the user's other sessions.

use sqlx::PgPool;
use tracing::instrument;

use gubre_core::{BasketItemId, ProductId, Quantity, UserId};

use super::realtime::BasketHub;
use crate::db::RepositoryError;
use crate::db::basket::BasketRepository;
use crate::models::Basket;

/// Basket operations for one request.
pub struct CartService<'a> {
    basket: BasketRepository<'a>,
    hub: &'a BasketHub,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, hub: &'a BasketHub) -> Self {
        Self {
            basket: BasketRepository::new(pool),
            hub,
        }
    }

    /// The user's basket.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, user_id: UserId) -> Result<Basket, RepositoryError> {
        let lines = self.basket.list(user_id).await?;
        Ok(Basket::from_lines(lines))
    }

    /// Badge count: sum of quantities.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        self.basket.count(user_id).await
    }

    /// Add units of a product, merging with an existing line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id, quantity = %quantity))]
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<Basket, RepositoryError> {
        self.basket.add(user_id, product_id, quantity).await?;
        self.changed(user_id).await
    }

    /// Set a line's quantity; `None` removes the line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line is not the user's.
    #[instrument(skip(self), fields(user_id = %user_id, item_id = %item_id))]
    pub async fn update_quantity(
        &self,
        user_id: UserId,
        item_id: BasketItemId,
        quantity: Option<Quantity>,
    ) -> Result<Basket, RepositoryError> {
        match quantity {
            Some(quantity) => self.basket.set_quantity(user_id, item_id, quantity).await?,
            None => self.basket.remove(user_id, item_id).await?,
        }
        self.changed(user_id).await
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line is not the user's.
    #[instrument(skip(self), fields(user_id = %user_id, item_id = %item_id))]
    pub async fn remove(
        &self,
        user_id: UserId,
        item_id: BasketItemId,
    ) -> Result<Basket, RepositoryError> {
        self.basket.remove(user_id, item_id).await?;
        self.changed(user_id).await
    }

    async fn changed(&self, user_id: UserId) -> Result<Basket, RepositoryError> {
        self.hub.publish(user_id);
        self.get(user_id).await
    }
}
