//! Domain stores.
//!
//! Each store owns one slice of client state behind a `tokio::sync::RwLock`
//! and exposes async operations that call the [`ApiClient`](crate::ApiClient)
//! and reduce the response into the slice. Every network operation moves
//! through three phases:
//!
//! 1. pending: `loading = true`, previous error cleared
//! 2. fulfilled: result applied, `loading = false`
//! 3. rejected: `loading = false`, error recorded, data untouched
//!
//! The lock is never held across a network await. Overlapping calls are not
//! fenced, so whichever response arrives last wins.

use std::future::Future;

use tokio::sync::RwLock;
use tracing::warn;

use crate::error::ApiError;

pub mod auth;
pub mod cart;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod wishlist;

pub use auth::{AuthState, AuthStore, Credentials, Registration, hydrate_session};
pub use cart::{CartState, CartStore};
pub use notifications::{NotificationState, NotificationStore};
pub use orders::{OrderState, OrderStore};
pub use products::{ProductState, ProductStore};
pub use wishlist::{MoveToCartOutcome, WishlistState, WishlistStore};

/// Loading and error flags carried by every network-backed slice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestStatus {
    /// A request for this slice is in flight.
    pub loading: bool,
    /// Message from the most recent failed request.
    pub error: Option<String>,
}

impl RequestStatus {
    fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    fn succeed(&mut self) {
        self.loading = false;
        self.error = None;
    }

    fn fail(&mut self, message: String) {
        self.loading = false;
        self.error = Some(message);
    }
}

/// State types that embed a [`RequestStatus`].
pub(crate) trait SliceState {
    fn status_mut(&mut self) -> &mut RequestStatus;
}

/// One lock-guarded slice of state with the pending/fulfilled/rejected cycle.
#[derive(Debug, Default)]
pub(crate) struct Slice<S> {
    state: RwLock<S>,
}

impl<S: SliceState + Clone> Slice<S> {
    pub(crate) fn new(initial: S) -> Self {
        Self {
            state: RwLock::new(initial),
        }
    }

    /// Clone of the current state.
    pub(crate) async fn snapshot(&self) -> S {
        self.state.read().await.clone()
    }

    /// Read a projection without cloning the whole slice.
    pub(crate) async fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&*self.state.read().await)
    }

    /// Apply a local, synchronous change.
    pub(crate) async fn update<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut *self.state.write().await)
    }

    /// Run `request` through the three request phases.
    ///
    /// `reduce` runs under the write lock only when the request succeeds.
    /// On failure the error is recorded as `err.describe(fallback)`.
    pub(crate) async fn dispatch<T, R>(
        &self,
        operation: &'static str,
        fallback: &'static str,
        request: impl Future<Output = Result<T, ApiError>>,
        reduce: impl FnOnce(&mut S, T) -> R,
    ) -> Result<R, ApiError> {
        self.state.write().await.status_mut().begin();

        let result = request.await;

        let mut state = self.state.write().await;
        match result {
            Ok(value) => {
                let out = reduce(&mut state, value);
                state.status_mut().succeed();
                Ok(out)
            }
            Err(err) => {
                warn!(operation, error = %err, "Store operation failed");
                state.status_mut().fail(err.describe(fallback));
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default)]
    struct Counter {
        value: u32,
        status: RequestStatus,
    }

    impl SliceState for Counter {
        fn status_mut(&mut self) -> &mut RequestStatus {
            &mut self.status
        }
    }

    #[tokio::test]
    async fn test_dispatch_success_applies_and_clears_flags() {
        let slice = Slice::new(Counter::default());
        let out = slice
            .dispatch("inc", "failed", async { Ok(5) }, |s, v| {
                s.value = v;
                v * 2
            })
            .await
            .unwrap();

        assert_eq!(out, 10);
        let state = slice.snapshot().await;
        assert_eq!(state.value, 5);
        assert_eq!(state.status, RequestStatus::default());
    }

    #[tokio::test]
    async fn test_dispatch_failure_keeps_data_and_records_fallback() {
        let slice = Slice::new(Counter {
            value: 7,
            status: RequestStatus::default(),
        });
        let result: Result<(), _> = slice
            .dispatch(
                "inc",
                "Could not increment",
                async { Err::<u32, _>(ApiError::network()) },
                |s, v| s.value = v,
            )
            .await;

        assert!(result.is_err());
        let state = slice.snapshot().await;
        assert_eq!(state.value, 7);
        assert!(!state.status.loading);
        assert_eq!(state.status.error.as_deref(), Some("Could not increment"));
    }

    #[tokio::test]
    async fn test_dispatch_marks_loading_while_pending() {
        let slice = std::sync::Arc::new(Slice::new(Counter::default()));
        let (tx, rx) = tokio::sync::oneshot::channel::<u32>();

        let pending = {
            let slice = slice.clone();
            tokio::spawn(async move {
                slice
                    .dispatch("inc", "failed", async { Ok(rx.await.unwrap()) }, |s, v| {
                        s.value = v;
                    })
                    .await
            })
        };

        tokio::task::yield_now().await;
        while !slice.read(|s| s.status.loading).await {
            tokio::task::yield_now().await;
        }

        tx.send(3).unwrap();
        pending.await.unwrap().unwrap();
        assert_eq!(slice.read(|s| (s.value, s.status.loading)).await, (3, false));
    }

    #[tokio::test]
    async fn test_overlapping_dispatches_last_response_wins() {
        let slice = std::sync::Arc::new(Slice::new(Counter::default()));

        let issue = |value: u32| {
            let slice = slice.clone();
            let (started_tx, started_rx) = tokio::sync::oneshot::channel::<()>();
            let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
            let task = tokio::spawn(async move {
                let request = async move {
                    started_tx.send(()).unwrap();
                    release_rx.await.unwrap();
                    Ok(value)
                };
                slice
                    .dispatch("set", "failed", request, |s, v| s.value = v)
                    .await
            });
            (started_rx, release_tx, task)
        };

        let (first_started, release_first, first) = issue(1);
        first_started.await.unwrap();
        let (second_started, release_second, second) = issue(2);
        second_started.await.unwrap();

        release_second.send(()).unwrap();
        second.await.unwrap().unwrap();
        assert_eq!(slice.read(|s| s.value).await, 2);

        // The earlier request answers last and overwrites the newer value.
        release_first.send(()).unwrap();
        first.await.unwrap().unwrap();
        assert_eq!(slice.read(|s| (s.value, s.status.loading)).await, (1, false));
    }
}
