//! Basket (shopping cart) types.
//!
//! The basket is the source of truth for cart contents: every mutation is
//! followed by a refetch, and [`Basket::from_lines`] derives the badge count
//! and total from whatever the database returned.

use serde::Serialize;

use gubre_core::{BasketItemId, Price, ProductId, Quantity};

/// One basket row joined with its product.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BasketLine {
    pub id: BasketItemId,
    pub product_id: ProductId,
    pub name: String,
    pub category: String,
    pub image: String,
    pub price: Price,
    pub quantity: Quantity,
    pub line_total: Price,
}

impl BasketLine {
    /// Build a line, computing its total from the unit price.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: BasketItemId,
        product_id: ProductId,
        name: String,
        category: String,
        image: String,
        price: Price,
        quantity: Quantity,
    ) -> Self {
        Self {
            id,
            product_id,
            name,
            category,
            image,
            price,
            quantity,
            line_total: price.times(quantity),
        }
    }
}

/// A user's whole basket, newest lines first.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Basket {
    pub items: Vec<BasketLine>,
    /// Sum of quantities; shown as the cart badge.
    pub item_count: i64,
    pub total: Price,
}

impl Basket {
    /// An empty basket.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            items: Vec::new(),
            item_count: 0,
            total: Price::ZERO,
        }
    }

    /// Aggregate count and total over `items`.
    #[must_use]
    pub fn from_lines(items: Vec<BasketLine>) -> Self {
        let item_count = items.iter().map(|l| i64::from(l.quantity.get())).sum();
        let total = items.iter().map(|l| l.line_total).sum();
        Self {
            items,
            item_count,
            total,
        }
    }

    /// Whether the basket has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(id: i32, price: &str, qty: i32) -> BasketLine {
        BasketLine::new(
            BasketItemId::new(id),
            ProductId::new(id * 10),
            format!("Gübrə {id}"),
            "Kalium".to_string(),
            String::new(),
            Price::parse(price).unwrap(),
            Quantity::new(qty).unwrap(),
        )
    }

    #[test]
    fn test_line_total() {
        let l = line(1, "12.50", 3);
        assert_eq!(l.line_total.to_string(), "37.50 AZN");
    }

    #[test]
    fn test_from_lines_counts_quantities_not_lines() {
        let basket = Basket::from_lines(vec![line(1, "12.50", 2), line(2, "3.00", 5)]);
        assert_eq!(basket.items.len(), 2);
        assert_eq!(basket.item_count, 7);
        assert_eq!(basket.total.to_string(), "40.00 AZN");
    }

    #[test]
    fn test_adding_quantity_raises_badge_by_that_amount() {
        let before = Basket::from_lines(vec![line(1, "5", 1)]);
        let after = Basket::from_lines(vec![line(1, "5", 1 + 4)]);
        assert_eq!(after.item_count - before.item_count, 4);
    }

    #[test]
    fn test_empty() {
        let basket = Basket::from_lines(Vec::new());
        assert_eq!(basket, Basket::empty());
        assert!(basket.is_empty());
    }

    #[test]
    fn test_serializes_prices_as_strings() {
        let json = serde_json::to_value(Basket::from_lines(vec![line(1, "2.50", 2)])).unwrap();
        assert_eq!(json["total"], "5.00");
        assert_eq!(json["item_count"], 2);
        assert_eq!(json["items"][0]["quantity"], 2);
    }
}
