//! Product catalog repository.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use gubre_core::{Price, ProductId, UserId};

use super::RepositoryError;
use crate::models::product::{NewProduct, Product, ProductUpdate};

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: String,
    category: String,
    image: String,
    price: Decimal,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for product {}: {e}", row.id))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            category: row.category,
            image: row.image,
            price,
        })
    }
}

/// Outcome of deleting a product.
#[derive(Debug, Clone)]
pub struct ProductDeletion {
    pub product_id: ProductId,
    /// Basket rows removed by the cascade.
    pub removed_basket_lines: i64,
    /// Users whose basket changed and should be notified.
    pub affected_users: Vec<UserId>,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products ordered by id, optionally filtered by a case-insensitive
    /// substring of the name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, name_filter: Option<&str>) -> Result<Vec<Product>, RepositoryError> {
        let pattern = name_filter.map(|q| format!("%{}%", escape_like(q)));

        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, description, category, image, price
            FROM storefront.product
            WHERE $1::TEXT IS NULL OR name ILIKE $1
            ORDER BY id ASC
            ",
        )
        .bind(pattern)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, description, category, image, price
            FROM storefront.product
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO storefront.product (name, description, category, image, price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, description, category, image, price
            ",
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(&product.image)
        .bind(product.price)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    #[instrument(skip(self, update), fields(product_id = %id))]
    pub async fn update(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            UPDATE storefront.product
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                image = COALESCE($5, image),
                price = COALESCE($6, price)
            WHERE id = $1
            RETURNING id, name, description, category, image, price
            ",
        )
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.description.as_deref())
        .bind(update.category.as_deref())
        .bind(update.image.as_deref())
        .bind(update.price)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Delete a product; basket lines and comments referencing it cascade.
    ///
    /// The affected basket rows are collected in the same transaction so the
    /// caller can notify their owners.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: ProductId) -> Result<ProductDeletion, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Locking the product blocks concurrent basket inserts that reference it.
        let locked: Option<i32> =
            sqlx::query_scalar("SELECT id FROM storefront.product WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let owners: Vec<Uuid> =
            sqlx::query_scalar("SELECT user_id FROM storefront.basket WHERE product_id = $1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        sqlx::query("DELETE FROM storefront.product WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let removed_basket_lines = i64::try_from(owners.len()).unwrap_or(i64::MAX);
        info!(removed_basket_lines, "Product deleted");

        Ok(ProductDeletion {
            product_id: id,
            removed_basket_lines,
            affected_users: owners.into_iter().map(UserId::new).collect(),
        })
    }

    /// Count catalog products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM storefront.product")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

/// Escape `ILIKE` wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("NPK 15%"), "NPK 15\\%");
        assert_eq!(escape_like("a_b\\c"), "a\\_b\\\\c");
        assert_eq!(escape_like("karbamid"), "karbamid");
    }
}
