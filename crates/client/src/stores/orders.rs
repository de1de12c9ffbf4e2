//! Order history store.
//!
//! Orders are held behind `Arc` so that a cancel can swap exactly one entry
//! while every other entry keeps its identity.

use std::sync::Arc;

use serde::Deserialize;
use shopfront_core::{NewOrder, Order, OrderId};
use tracing::{debug, instrument};

use super::{RequestStatus, Slice, SliceState};
use crate::error::ApiError;
use crate::http::ApiClient;
use crate::telemetry;

/// Order slice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderState {
    /// Order history in backend order (newest first).
    pub orders: Vec<Arc<Order>>,
    /// Order shown in detail.
    pub current: Option<Arc<Order>>,
    pub status: RequestStatus,
}

impl SliceState for OrderState {
    fn status_mut(&mut self) -> &mut RequestStatus {
        &mut self.status
    }
}

impl OrderState {
    /// Swap in `updated` wherever an order with the same id appears.
    fn replace_in_place(&mut self, updated: &Arc<Order>) -> bool {
        let mut replaced = false;
        if let Some(slot) = self.orders.iter_mut().find(|o| o.id == updated.id) {
            *slot = Arc::clone(updated);
            replaced = true;
        }
        if let Some(current) = self.current.as_mut()
            && current.id == updated.id
        {
            *current = Arc::clone(updated);
            replaced = true;
        }
        replaced
    }
}

#[derive(Deserialize)]
struct OrdersEnvelope {
    orders: Vec<Order>,
}

#[derive(Deserialize)]
struct OrderEnvelope {
    order: Order,
}

/// Order history store.
#[derive(Clone)]
pub struct OrderStore {
    inner: Arc<OrderStoreInner>,
}

struct OrderStoreInner {
    api: ApiClient,
    slice: Slice<OrderState>,
}

impl OrderStore {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            inner: Arc::new(OrderStoreInner {
                api,
                slice: Slice::new(OrderState::default()),
            }),
        }
    }

    pub async fn snapshot(&self) -> OrderState {
        self.inner.slice.snapshot().await
    }

    /// Load the signed-in user's orders, replacing the list.
    ///
    /// # Errors
    ///
    /// Returns the API error; the previous list is kept.
    #[instrument(skip(self))]
    pub async fn fetch_mine(&self) -> Result<Vec<Arc<Order>>, ApiError> {
        let request = self.inner.api.get::<OrdersEnvelope>("orders");
        self.inner
            .slice
            .dispatch("fetch_mine", "Failed to load orders", request, |state, body| {
                state.orders = body.orders.into_iter().map(Arc::new).collect();
                state.orders.clone()
            })
            .await
    }

    /// Load one order and make it current.
    ///
    /// # Errors
    ///
    /// Returns the API error; the current order is kept.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn fetch_by_id(&self, id: &OrderId) -> Result<Arc<Order>, ApiError> {
        let path = format!("orders/{id}");
        let request = self.inner.api.get::<OrderEnvelope>(&path);
        self.inner
            .slice
            .dispatch("fetch_by_id", "Failed to load order", request, |state, body| {
                let order = Arc::new(body.order);
                state.current = Some(Arc::clone(&order));
                order
            })
            .await
    }

    /// Place an order, prepend it to the list, and make it current.
    ///
    /// # Errors
    ///
    /// Returns the API error; the list is kept.
    #[instrument(skip(self, payload), fields(lines = payload.items.len()))]
    pub async fn create(&self, payload: &NewOrder) -> Result<Arc<Order>, ApiError> {
        let request = self.inner.api.post::<OrderEnvelope, _>("orders", payload);
        let order = self
            .inner
            .slice
            .dispatch("create", "Failed to create order", request, |state, body| {
                let order = Arc::new(body.order);
                state.orders.insert(0, Arc::clone(&order));
                state.current = Some(Arc::clone(&order));
                order
            })
            .await?;
        telemetry::breadcrumb("order", "Created order", &[("order_id", order.id.as_str())]);
        Ok(order)
    }

    /// Cancel an order.
    ///
    /// Only the matching list entry and the current pointer (when it is the
    /// same order) are replaced.
    ///
    /// # Errors
    ///
    /// Returns the API error; nothing is replaced.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn cancel(&self, id: &OrderId) -> Result<Arc<Order>, ApiError> {
        let path = format!("orders/{id}/cancel");
        let body = serde_json::json!({});
        let request = self.inner.api.post::<OrderEnvelope, _>(&path, &body);
        let order = self
            .inner
            .slice
            .dispatch("cancel", "Failed to cancel order", request, |state, body| {
                let order = Arc::new(body.order);
                if !state.replace_in_place(&order) {
                    debug!("Cancelled order not present locally");
                }
                order
            })
            .await?;
        telemetry::breadcrumb("order", "Cancelled order", &[("order_id", order.id.as_str())]);
        Ok(order)
    }

    /// Drop local order state without a request.
    pub async fn reset(&self) {
        self.inner.slice.update(|s| *s = OrderState::default()).await;
    }
}
