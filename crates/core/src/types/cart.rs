//! Server-computed cart snapshot.

use serde::{Deserialize, Serialize};

use super::{Price, ProductId};

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(alias = "product")]
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Full cart as computed by the backend.
///
/// Totals are authoritative; the client never recomputes them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub subtotal: Price,
    #[serde(default)]
    pub tax: Price,
    #[serde(default, rename = "shippingCost", alias = "shipping")]
    pub shipping: Price,
    #[serde(default)]
    pub total: Price,
}

impl Cart {
    /// Sum of line quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Line for a given product, if present.
    #[must_use]
    pub fn line(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.product_id == product_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_reads_shipping_cost_verbatim() {
        let cart: Cart = serde_json::from_value(serde_json::json!({
            "items": [
                { "productId": "p1", "name": "Mug", "price": 8.0, "quantity": 2 },
                { "product": "p2", "name": "Tea", "price": "4.25", "quantity": 1 }
            ],
            "subtotal": 20.25,
            "tax": 1.62,
            "shippingCost": 5.99,
            "total": 27.86
        }))
        .unwrap();

        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.shipping, Price::from_cents(599));
        assert_eq!(cart.total, Price::from_cents(2786));
        assert_eq!(cart.line(&ProductId::new("p2")).unwrap().quantity, 1);
    }

    #[test]
    fn test_empty_object_is_empty_cart() {
        let cart: Cart = serde_json::from_str("{}").unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total, Price::ZERO);
    }
}
