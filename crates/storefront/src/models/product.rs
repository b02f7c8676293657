//! Catalog product types.

use serde::{Deserialize, Serialize};

use gubre_core::{Price, ProductId};

/// A fertilizer product.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub category: String,
    pub image: String,
    pub price: Price,
}

impl Product {
    /// Case-insensitive substring match on the product name.
    #[must_use]
    pub fn name_matches(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(&query.to_lowercase())
    }
}

/// Payload for creating a product from the admin panel.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image: String,
    pub price: Price,
}

impl NewProduct {
    /// Trim text fields and require a name.
    ///
    /// # Errors
    ///
    /// Returns a user-facing message if the name is blank.
    pub fn normalized(self) -> Result<Self, &'static str> {
        let name = self.name.trim().to_owned();
        if name.is_empty() {
            return Err("Məhsulun adı boş ola bilməz");
        }
        Ok(Self {
            name,
            description: self.description.trim().to_owned(),
            category: self.category.trim().to_owned(),
            image: self.image.trim().to_owned(),
            price: self.price,
        })
    }
}

/// Partial product update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub price: Option<Price>,
}

impl ProductUpdate {
    /// Trim provided text fields and reject a blank name.
    ///
    /// # Errors
    ///
    /// Returns a user-facing message if a provided name is blank.
    pub fn normalized(self) -> Result<Self, &'static str> {
        let name = self.name.map(|n| n.trim().to_owned());
        if name.as_deref().is_some_and(str::is_empty) {
            return Err("Məhsulun adı boş ola bilməz");
        }
        Ok(Self {
            name,
            description: self.description.map(|s| s.trim().to_owned()),
            category: self.category.map(|s| s.trim().to_owned()),
            image: self.image.map(|s| s.trim().to_owned()),
            price: self.price,
        })
    }

    /// Whether the update changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.image.is_none()
            && self.price.is_none()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(name: &str) -> Product {
        Product {
            id: ProductId::new(1),
            name: name.to_string(),
            description: String::new(),
            category: "Azot".to_string(),
            image: String::new(),
            price: Price::parse("10").unwrap(),
        }
    }

    #[test]
    fn test_name_matches_is_case_insensitive() {
        let p = product("Karbamid (Urea) 46%");
        assert!(p.name_matches("urea"));
        assert!(p.name_matches("KARBAMID"));
        assert!(!p.name_matches("kalium"));
    }

    #[test]
    fn test_new_product_requires_name() {
        let json = r#"{"name": "   ", "price": "5.00"}"#;
        let payload: NewProduct = serde_json::from_str(json).unwrap();
        assert!(payload.normalized().is_err());
    }

    #[test]
    fn test_new_product_rejects_negative_price() {
        let json = r#"{"name": "Ammofos", "price": "-1"}"#;
        assert!(serde_json::from_str::<NewProduct>(json).is_err());
    }

    #[test]
    fn test_update_partial_fields() {
        let update: ProductUpdate = serde_json::from_str(r#"{"price": "7.25"}"#).unwrap();
        assert!(!update.is_empty());
        let update = update.normalized().unwrap();
        assert_eq!(update.name, None);
        assert_eq!(update.price, Some(Price::parse("7.25").unwrap()));

        let blank: ProductUpdate = serde_json::from_str(r#"{"name": ""}"#).unwrap();
        assert!(blank.normalized().is_err());
        assert!(ProductUpdate::default().is_empty());
    }
}
