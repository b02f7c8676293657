//! Seed the product catalog from a YAML file.
//!
//! Products whose name already exists (case-insensitive) are skipped, so
//! the command can be re-run after editing the file.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use gubre_storefront::db::products::ProductRepository;
use gubre_storefront::models::NewProduct;

/// Top-level shape of the seed file.
#[derive(Debug, Deserialize)]
pub struct CatalogSeed {
    pub products: Vec<NewProduct>,
}

/// Insert the products listed in `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, a product is
/// invalid, or database operations fail.
pub async fn products(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading products from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let seed: CatalogSeed = serde_yaml::from_str(&content)?;

    let mut products = Vec::with_capacity(seed.products.len());
    let mut errors = Vec::new();
    for (index, product) in seed.products.into_iter().enumerate() {
        match product.normalized() {
            Ok(product) => products.push(product),
            Err(message) => errors.push(format!("product #{}: {message}", index + 1)),
        }
    }
    if !errors.is_empty() {
        error!("Seed file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    info!(products = products.len(), "Parsed seed file");

    let pool = super::connect().await?;
    let repo = ProductRepository::new(&pool);

    let mut existing: HashSet<String> = repo
        .list(None)
        .await?
        .into_iter()
        .map(|p| p.name.to_lowercase())
        .collect();

    let mut inserted = 0_usize;
    let mut skipped = 0_usize;
    for product in &products {
        if !existing.insert(product.name.to_lowercase()) {
            skipped += 1;
            continue;
        }
        repo.create(product).await?;
        inserted += 1;
    }

    info!("Seeding complete!");
    info!("  Products inserted: {inserted}");
    info!("  Products skipped (already exist): {skipped}");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_seed_file_parses() {
        let content = include_str!("../../seed/products.yaml");
        let seed: CatalogSeed = serde_yaml::from_str(content).unwrap();

        assert!(!seed.products.is_empty());
        for product in seed.products {
            assert!(product.normalized().is_ok());
        }
    }

    #[test]
    fn test_price_accepts_decimal_strings() {
        let seed: CatalogSeed = serde_yaml::from_str(
            "products:\n  - name: Karbamid\n    price: \"24.50\"\n",
        )
        .unwrap();

        assert_eq!(seed.products[0].price.to_string(), "24.50 AZN");
    }
}
