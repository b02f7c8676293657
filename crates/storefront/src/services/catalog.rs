//! Cached product catalog.
//!
//! The full listing and single products are cached with `moka` for the
//! configured TTL. Name filters run over the cached listing. Every admin
//! product mutation calls [`CatalogCache::invalidate_all`].
//!
//! Invalidation bumps a generation counter. A load only fills the cache if
//! no invalidation happened while it was reading the database.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::debug;

use gubre_core::ProductId;

use crate::db::RepositoryError;
use crate::db::products::ProductRepository;
use crate::models::Product;

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Listing,
    Product(ProductId),
}

#[derive(Debug, Clone)]
enum CacheValue {
    Listing(Arc<Vec<Product>>),
    Product(Box<Product>),
}

/// Read-through cache in front of [`ProductRepository`].
#[derive(Clone)]
pub struct CatalogCache {
    cache: Cache<CacheKey, CacheValue>,
    generation: Arc<AtomicU64>,
}

impl CatalogCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(ttl)
            .build();
        Self {
            cache,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Products ordered by id, optionally filtered by a case-insensitive
    /// name substring. A blank filter lists everything.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the listing has to be loaded and fails.
    pub async fn list(
        &self,
        pool: &PgPool,
        query: Option<&str>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let listing = self.listing(pool).await?;
        let query = query.map(str::trim).filter(|q| !q.is_empty());

        Ok(match query {
            Some(q) => listing.iter().filter(|p| p.name_matches(q)).cloned().collect(),
            None => listing.as_ref().clone(),
        })
    }

    /// A single product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup fails.
    pub async fn get(
        &self,
        pool: &PgPool,
        id: ProductId,
    ) -> Result<Option<Product>, RepositoryError> {
        let key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.cache.get(&key).await {
            debug!(product_id = %id, "Cache hit for product");
            return Ok(Some(*product));
        }

        let generation = self.generation();
        let product = ProductRepository::new(pool).get(id).await?;
        if let Some(product) = &product {
            self.store(generation, key, CacheValue::Product(Box::new(product.clone())))
                .await;
        }
        Ok(product)
    }

    /// Drop everything; the next read goes to the database.
    pub async fn invalidate_all(&self) {
        // Bump first so loads already in flight do not repopulate the cache.
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Cache a value loaded under `generation` unless an invalidation has
    /// happened since.
    async fn store(&self, generation: u64, key: CacheKey, value: CacheValue) {
        if self.generation() != generation {
            debug!(?key, "Discarding catalog load that raced an invalidation");
            return;
        }
        self.cache.insert(key.clone(), value).await;
        // An invalidation between the check and the insert may have missed it.
        if self.generation() != generation {
            self.cache.invalidate(&key).await;
        }
    }

    async fn listing(&self, pool: &PgPool) -> Result<Arc<Vec<Product>>, RepositoryError> {
        if let Some(CacheValue::Listing(products)) = self.cache.get(&CacheKey::Listing).await {
            debug!("Cache hit for product listing");
            return Ok(products);
        }

        let generation = self.generation();
        let products = Arc::new(ProductRepository::new(pool).list(None).await?);
        self.store(
            generation,
            CacheKey::Listing,
            CacheValue::Listing(Arc::clone(&products)),
        )
        .await;
        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_listing() -> CacheValue {
        CacheValue::Listing(Arc::new(Vec::new()))
    }

    #[tokio::test]
    async fn test_store_caches_current_generation() {
        let catalog = CatalogCache::new(Duration::from_secs(60));

        let generation = catalog.generation();
        catalog
            .store(generation, CacheKey::Listing, empty_listing())
            .await;

        assert!(catalog.cache.get(&CacheKey::Listing).await.is_some());
    }

    #[tokio::test]
    async fn test_load_started_before_invalidation_is_not_cached() {
        let catalog = CatalogCache::new(Duration::from_secs(60));

        // A listing load reads the generation, then an admin edit lands
        // before the database answer comes back.
        let generation = catalog.generation();
        catalog.invalidate_all().await;
        catalog
            .store(generation, CacheKey::Listing, empty_listing())
            .await;

        assert!(catalog.cache.get(&CacheKey::Listing).await.is_none());

        // The next load after the edit is cached again.
        let generation = catalog.generation();
        catalog
            .store(generation, CacheKey::Listing, empty_listing())
            .await;
        assert!(catalog.cache.get(&CacheKey::Listing).await.is_some());
    }

    #[tokio::test]
    async fn test_invalidate_all_shared_across_clones() {
        let catalog = CatalogCache::new(Duration::from_secs(60));
        let handle = catalog.clone();

        let generation = catalog.generation();
        handle.invalidate_all().await;
        catalog
            .store(generation, CacheKey::Product(ProductId::new(1)), empty_listing())
            .await;

        assert!(catalog.cache.get(&CacheKey::Product(ProductId::new(1))).await.is_none());
    }
}
