//! Cart store.
//!
//! The backend owns every total; each successful response replaces the whole
//! cart verbatim.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shopfront_core::{Cart, ProductId};
use tracing::instrument;

use super::{RequestStatus, Slice, SliceState};
use crate::error::ApiError;
use crate::http::ApiClient;
use crate::telemetry;

/// Cart slice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartState {
    pub cart: Cart,
    pub status: RequestStatus,
}

impl SliceState for CartState {
    fn status_mut(&mut self) -> &mut RequestStatus {
        &mut self.status
    }
}

#[derive(Deserialize)]
pub(crate) struct CartEnvelope {
    pub(crate) cart: Cart,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddItem<'a> {
    product_id: &'a ProductId,
    quantity: u32,
}

#[derive(Serialize)]
struct SetQuantity {
    quantity: u32,
}

/// Cart store.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    api: ApiClient,
    slice: Slice<CartState>,
}

impl CartStore {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            inner: Arc::new(CartStoreInner {
                api,
                slice: Slice::new(CartState::default()),
            }),
        }
    }

    pub async fn snapshot(&self) -> CartState {
        self.inner.slice.snapshot().await
    }

    /// Load the current cart.
    ///
    /// # Errors
    ///
    /// Returns the API error; the previous cart is kept.
    #[instrument(skip(self))]
    pub async fn fetch_cart(&self) -> Result<Cart, ApiError> {
        let request = self.inner.api.get::<CartEnvelope>("cart");
        self.apply("fetch_cart", "Failed to load cart", request).await
    }

    /// Add `quantity` of a product.
    ///
    /// # Errors
    ///
    /// Returns the API error (an out-of-stock rejection arrives as
    /// `Validation`); the previous cart is kept.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_item(&self, product_id: &ProductId, quantity: u32) -> Result<Cart, ApiError> {
        let body = AddItem {
            product_id,
            quantity,
        };
        let request = self.inner.api.post::<CartEnvelope, _>("cart/items", &body);
        let cart = self.apply("add_item", "Failed to add item", request).await?;
        telemetry::breadcrumb(
            "cart",
            "Added item",
            &[("product_id", product_id.as_str()), ("quantity", &quantity.to_string())],
        );
        Ok(cart)
    }

    /// Set the quantity of a line. The value is passed through unchecked.
    ///
    /// # Errors
    ///
    /// Returns the API error; the previous cart is kept.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn set_quantity(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart, ApiError> {
        let path = format!("cart/items/{product_id}");
        let body = SetQuantity { quantity };
        let request = self.inner.api.put::<CartEnvelope, _>(&path, &body);
        self.apply("set_quantity", "Failed to update quantity", request)
            .await
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns the API error; the previous cart is kept.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_item(&self, product_id: &ProductId) -> Result<Cart, ApiError> {
        let path = format!("cart/items/{product_id}");
        let request = self.inner.api.delete::<CartEnvelope>(&path);
        let cart = self
            .apply("remove_item", "Failed to remove item", request)
            .await?;
        telemetry::breadcrumb("cart", "Removed item", &[("product_id", product_id.as_str())]);
        Ok(cart)
    }

    /// Empty the cart on the backend.
    ///
    /// # Errors
    ///
    /// Returns the API error; the previous cart is kept.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<Cart, ApiError> {
        let request = self.inner.api.delete::<CartEnvelope>("cart");
        self.apply("clear_cart", "Failed to clear cart", request).await
    }

    /// Replace the cart with one obtained elsewhere (a wishlist move).
    pub async fn replace(&self, cart: Cart) {
        self.inner.slice.update(|s| s.cart = cart).await;
    }

    /// Drop local cart state without a request.
    pub async fn reset(&self) {
        self.inner.slice.update(|s| *s = CartState::default()).await;
    }

    async fn apply(
        &self,
        operation: &'static str,
        fallback: &'static str,
        request: impl Future<Output = Result<CartEnvelope, ApiError>>,
    ) -> Result<Cart, ApiError> {
        self.inner
            .slice
            .dispatch(operation, fallback, request, |state, body| {
                state.cart = body.cart;
                state.cart.clone()
            })
            .await
    }
}
