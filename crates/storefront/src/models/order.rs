//! Order types and checkout input validation.

use chrono::{DateTime, Utc};
use serde::Serialize;

use gubre_core::{Email, OrderId, OrderStatus, Price, ProductId, Quantity};

/// A purchased line, snapshotted at checkout time.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OrderItem {
    /// `None` once the product has been removed from the catalog.
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub unit_price: Price,
    pub quantity: Quantity,
    pub line_total: Price,
}

/// A placed order.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub email: Email,
    pub phone: String,
    pub shipping_address: String,
    pub status: OrderStatus,
    pub total_amount: Price,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

/// Validated contact and delivery details for checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingDetails {
    pub email: Email,
    pub phone: String,
    pub shipping_address: String,
}

impl ShippingDetails {
    /// Validate raw checkout input.
    ///
    /// # Errors
    ///
    /// Returns a user-facing message naming the first invalid field.
    pub fn parse(email: &str, phone: &str, shipping_address: &str) -> Result<Self, &'static str> {
        let email = Email::parse(email).map_err(|_| "Yanlış e-poçt ünvanı")?;
        let phone = phone.trim();
        if phone.is_empty() {
            return Err("Telefon nömrəsi boş ola bilməz");
        }
        let shipping_address = shipping_address.trim();
        if shipping_address.is_empty() {
            return Err("Çatdırılma ünvanı boş ola bilməz");
        }
        Ok(Self {
            email,
            phone: phone.to_owned(),
            shipping_address: shipping_address.to_owned(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let details =
            ShippingDetails::parse(" Fermer@Mail.az ", " +994 50 123 45 67 ", "Gəncə, Nizami küç. 5")
                .unwrap();
        assert_eq!(details.email.as_str(), "fermer@mail.az");
        assert_eq!(details.phone, "+994 50 123 45 67");
    }

    #[test]
    fn test_parse_rejects_each_field() {
        assert_eq!(
            ShippingDetails::parse("nope", "1", "Bakı"),
            Err("Yanlış e-poçt ünvanı")
        );
        assert_eq!(
            ShippingDetails::parse("a@b.az", "  ", "Bakı"),
            Err("Telefon nömrəsi boş ola bilməz")
        );
        assert_eq!(
            ShippingDetails::parse("a@b.az", "1", ""),
            Err("Çatdırılma ünvanı boş ola bilməz")
        );
    }
}
