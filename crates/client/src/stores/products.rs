//! Product catalog store.
//!
//! Listings are kept normalized: a map keyed by product id plus the id order
//! the backend returned. A listing fetch replaces both; a detail fetch only
//! upserts into the map.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use shopfront_core::{NewReview, Pagination, Product, ProductFilters, ProductId, Review};
use tracing::{debug, instrument};

use super::{RequestStatus, Slice, SliceState};
use crate::error::ApiError;
use crate::http::ApiClient;

/// Product slice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductState {
    /// Every product seen so far, keyed by id.
    pub products: HashMap<ProductId, Product>,
    /// Order of the most recent listing.
    pub ids: Vec<ProductId>,
    /// Product selected by the last detail fetch.
    pub current: Option<ProductId>,
    /// Filters being edited; only sent by [`ProductStore::apply_filters`].
    pub filters: ProductFilters,
    pub pagination: Pagination,
    /// Reviews for whichever product was current when they were fetched.
    pub reviews: Vec<Review>,
    pub review_pagination: Option<Pagination>,
    pub status: RequestStatus,
}

impl SliceState for ProductState {
    fn status_mut(&mut self) -> &mut RequestStatus {
        &mut self.status
    }
}

#[derive(Deserialize)]
struct ListEnvelope {
    products: Vec<Product>,
    #[serde(default)]
    pagination: Pagination,
}

#[derive(Deserialize)]
struct ProductEnvelope {
    product: Product,
}

#[derive(Deserialize)]
struct ReviewsEnvelope {
    reviews: Vec<Review>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Deserialize)]
struct ReviewEnvelope {
    review: Review,
}

/// Product catalog store.
#[derive(Clone)]
pub struct ProductStore {
    inner: Arc<ProductStoreInner>,
}

struct ProductStoreInner {
    api: ApiClient,
    slice: Slice<ProductState>,
}

impl ProductStore {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            inner: Arc::new(ProductStoreInner {
                api,
                slice: Slice::new(ProductState::default()),
            }),
        }
    }

    pub async fn snapshot(&self) -> ProductState {
        self.inner.slice.snapshot().await
    }

    /// Id of the current product, if any.
    pub async fn current_id(&self) -> Option<ProductId> {
        self.inner.slice.read(|s| s.current.clone()).await
    }

    /// Fetch one page of the catalog.
    ///
    /// Replaces the map, the id order, and the pagination descriptor.
    ///
    /// # Errors
    ///
    /// Returns the API error; the previous listing is kept.
    #[instrument(skip(self))]
    pub async fn fetch_list(&self, filters: &ProductFilters) -> Result<Vec<ProductId>, ApiError> {
        let query = filters.to_query();
        let request = self
            .inner
            .api
            .get_with_query::<ListEnvelope, _>("products", &query);
        self.inner
            .slice
            .dispatch("fetch_list", "Failed to load products", request, |state, body| {
                state.ids = body.products.iter().map(|p| p.id.clone()).collect();
                state.products = body
                    .products
                    .into_iter()
                    .map(|p| (p.id.clone(), p))
                    .collect();
                state.pagination = body.pagination;
                debug!(count = state.ids.len(), "Product listing replaced");
                state.ids.clone()
            })
            .await
    }

    /// Fetch with the stored filter set.
    ///
    /// # Errors
    ///
    /// See [`ProductStore::fetch_list`].
    pub async fn apply_filters(&self) -> Result<Vec<ProductId>, ApiError> {
        let filters = self.inner.slice.read(|s| s.filters.clone()).await;
        self.fetch_list(&filters).await
    }

    /// Merge `patch` into the stored filters without fetching.
    pub async fn set_filters(&self, patch: ProductFilters) {
        self.inner.slice.update(|s| s.filters.merge(patch)).await;
    }

    /// Reset the stored filters without fetching.
    pub async fn clear_filters(&self) {
        self.inner
            .slice
            .update(|s| s.filters = ProductFilters::default())
            .await;
    }

    /// Fetch one product, upsert it, and mark it current.
    ///
    /// # Errors
    ///
    /// Returns the API error; the map and current pointer are kept.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn fetch_by_id(&self, id: &ProductId) -> Result<Product, ApiError> {
        let path = format!("products/{id}");
        let request = self.inner.api.get::<ProductEnvelope>(&path);
        self.inner
            .slice
            .dispatch("fetch_by_id", "Failed to load product", request, |state, body| {
                let product = body.product;
                state.current = Some(product.id.clone());
                state.products.insert(product.id.clone(), product.clone());
                product
            })
            .await
    }

    /// Fetch a page of reviews, replacing the review list.
    ///
    /// The list is not keyed by product; fetch the product first.
    ///
    /// # Errors
    ///
    /// Returns the API error; the previous reviews are kept.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn fetch_reviews(&self, id: &ProductId, page: u32) -> Result<Vec<Review>, ApiError> {
        let path = format!("products/{id}/reviews");
        let query = [("page", page)];
        let request = self
            .inner
            .api
            .get_with_query::<ReviewsEnvelope, _>(&path, &query);
        self.inner
            .slice
            .dispatch("fetch_reviews", "Failed to load reviews", request, |state, body| {
                state.reviews = body.reviews;
                state.review_pagination = body.pagination;
                state.reviews.clone()
            })
            .await
    }

    /// Post a review and prepend it to the review list.
    ///
    /// # Errors
    ///
    /// Returns the API error; the review list is kept.
    #[instrument(skip(self, review), fields(product_id = %id, rating = review.rating))]
    pub async fn create_review(&self, id: &ProductId, review: &NewReview) -> Result<Review, ApiError> {
        let path = format!("products/{id}/reviews");
        let request = self.inner.api.post::<ReviewEnvelope, _>(&path, review);
        self.inner
            .slice
            .dispatch("create_review", "Failed to submit review", request, |state, body| {
                state.reviews.insert(0, body.review.clone());
                body.review
            })
            .await
    }
}
