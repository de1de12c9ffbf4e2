//! Wishlist store.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shopfront_core::{Cart, ProductId, WishlistItem};
use tracing::instrument;

use super::{RequestStatus, Slice, SliceState};
use crate::error::ApiError;
use crate::http::ApiClient;

/// Wishlist slice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WishlistState {
    pub items: Vec<WishlistItem>,
    pub status: RequestStatus,
}

impl SliceState for WishlistState {
    fn status_mut(&mut self) -> &mut RequestStatus {
        &mut self.status
    }
}

/// Both snapshots returned by a move-to-cart.
///
/// [`WishlistStore::move_to_cart`] applies only `wishlist`; handing `cart`
/// to the cart store is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveToCartOutcome {
    pub wishlist: Vec<WishlistItem>,
    pub cart: Cart,
}

#[derive(Deserialize)]
struct WishlistEnvelope {
    wishlist: Vec<WishlistItem>,
}

#[derive(Deserialize)]
struct MoveEnvelope {
    wishlist: Vec<WishlistItem>,
    cart: Cart,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddToWishlist<'a> {
    product_id: &'a ProductId,
}

/// Wishlist store.
#[derive(Clone)]
pub struct WishlistStore {
    inner: Arc<WishlistStoreInner>,
}

struct WishlistStoreInner {
    api: ApiClient,
    slice: Slice<WishlistState>,
}

impl WishlistStore {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            inner: Arc::new(WishlistStoreInner {
                api,
                slice: Slice::new(WishlistState::default()),
            }),
        }
    }

    pub async fn snapshot(&self) -> WishlistState {
        self.inner.slice.snapshot().await
    }

    /// # Errors
    ///
    /// Returns the API error; the previous list is kept.
    #[instrument(skip(self))]
    pub async fn fetch(&self) -> Result<Vec<WishlistItem>, ApiError> {
        let request = self.inner.api.get::<WishlistEnvelope>("wishlist");
        self.apply("fetch_wishlist", "Failed to load wishlist", request)
            .await
    }

    /// # Errors
    ///
    /// Returns the API error; the previous list is kept.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add(&self, product_id: &ProductId) -> Result<Vec<WishlistItem>, ApiError> {
        let body = AddToWishlist { product_id };
        let request = self
            .inner
            .api
            .post::<WishlistEnvelope, _>("wishlist", &body);
        self.apply("add_to_wishlist", "Failed to add to wishlist", request)
            .await
    }

    /// # Errors
    ///
    /// Returns the API error; the previous list is kept.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove(&self, product_id: &ProductId) -> Result<Vec<WishlistItem>, ApiError> {
        let path = format!("wishlist/{product_id}");
        let request = self.inner.api.delete::<WishlistEnvelope>(&path);
        self.apply("remove_from_wishlist", "Failed to remove from wishlist", request)
            .await
    }

    /// Move a product into the cart.
    ///
    /// Replaces the wishlist from the response and returns both snapshots.
    /// The cart store is not touched.
    ///
    /// # Errors
    ///
    /// Returns the API error; the previous list is kept.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn move_to_cart(&self, product_id: &ProductId) -> Result<MoveToCartOutcome, ApiError> {
        let path = format!("wishlist/{product_id}/move-to-cart");
        let body = serde_json::json!({});
        let request = self.inner.api.post::<MoveEnvelope, _>(&path, &body);
        self.inner
            .slice
            .dispatch("move_to_cart", "Failed to move item to cart", request, |state, body| {
                state.items.clone_from(&body.wishlist);
                MoveToCartOutcome {
                    wishlist: body.wishlist,
                    cart: body.cart,
                }
            })
            .await
    }

    /// Drop local wishlist state without a request.
    pub async fn reset(&self) {
        self.inner
            .slice
            .update(|s| *s = WishlistState::default())
            .await;
    }

    async fn apply(
        &self,
        operation: &'static str,
        fallback: &'static str,
        request: impl Future<Output = Result<WishlistEnvelope, ApiError>>,
    ) -> Result<Vec<WishlistItem>, ApiError> {
        self.inner
            .slice
            .dispatch(operation, fallback, request, |state, body| {
                state.items = body.wishlist;
                state.items.clone()
            })
            .await
    }
}
