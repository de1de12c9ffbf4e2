//! Order records and the checkout payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Address, OrderId, OrderStatus, Price, ProductId};

/// One purchased line within an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(alias = "product")]
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    pub quantity: u32,
}

/// An order as held by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(alias = "_id")]
    pub id: OrderId,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub subtotal: Price,
    #[serde(default)]
    pub tax: Price,
    #[serde(default, rename = "shippingCost", alias = "shipping")]
    pub shipping: Price,
    #[serde(default)]
    pub total: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Line requested at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Checkout payload for `POST /orders`.
///
/// `items` may be left empty to let the backend order the current cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<OrderLine>,
    pub shipping_address: Address,
    pub payment_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,
}
