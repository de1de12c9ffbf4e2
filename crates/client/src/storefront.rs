//! Cross-store coordination.
//!
//! [`Storefront`] owns one instance of every store plus the realtime adapter
//! and implements the flows that touch more than one slice: the logout
//! cascade, checkout, moving a wishlist item into the cart, and re-fetching
//! after realtime events.

use std::sync::Arc;

use shopfront_core::{NewOrder, OrderId, ProductId, User};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::ApiClient;
use crate::realtime::{Invalidation, RealtimeAdapter, RealtimeEvent};
use crate::storage::{FileStorage, SessionStorage};
use crate::stores::{
    AuthStore, CartStore, Credentials, MoveToCartOutcome, NotificationStore, OrderStore,
    ProductStore, Registration, WishlistStore, hydrate_session,
};
use crate::telemetry;

/// Error building a [`Storefront`].
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("failed to build API client: {0}")]
    Api(#[from] ApiError),
    #[error("failed to build realtime client: {0}")]
    Realtime(#[from] reqwest::Error),
}

/// Every store plus the realtime channel, wired together.
///
/// Cheap to clone.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: ClientConfig,
    storage: Arc<dyn SessionStorage>,
    auth: AuthStore,
    cart: CartStore,
    products: ProductStore,
    orders: OrderStore,
    wishlist: WishlistStore,
    notifications: NotificationStore,
    realtime: RealtimeAdapter,
}

impl Storefront {
    /// Build everything with file-backed session storage at
    /// `config.session_file`.
    ///
    /// # Errors
    ///
    /// See [`Storefront::with_storage`].
    pub fn initialize(config: ClientConfig) -> Result<Self, InitError> {
        let storage = Arc::new(FileStorage::new(config.session_file.clone()));
        Self::with_storage(config, storage)
    }

    /// Hydrate the session from `storage` and build every store.
    ///
    /// If the hydrated session is authenticated the realtime channel is
    /// connected, so this must run inside a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if either HTTP client fails to build.
    pub fn with_storage(
        config: ClientConfig,
        storage: Arc<dyn SessionStorage>,
    ) -> Result<Self, InitError> {
        let session = hydrate_session(storage.as_ref());
        let resume = session.token.clone();
        if let Some(user) = &session.user {
            telemetry::set_user(user);
        }

        let api = ApiClient::new(&config, Arc::clone(&storage))?;
        let notifications = NotificationStore::new(config.notification_capacity);
        // The event stream stays open indefinitely, so only connecting is bounded.
        let realtime_http = reqwest::Client::builder()
            .connect_timeout(config.request_timeout)
            .build()?;
        let realtime = RealtimeAdapter::new(
            realtime_http,
            config.realtime_url.clone(),
            config.realtime,
            notifications.clone(),
        );

        let storefront = Self {
            inner: Arc::new(StorefrontInner {
                auth: AuthStore::new(api.clone(), Arc::clone(&storage), session),
                cart: CartStore::new(api.clone()),
                products: ProductStore::new(api.clone()),
                orders: OrderStore::new(api.clone()),
                wishlist: WishlistStore::new(api),
                notifications,
                realtime,
                storage,
                config,
            }),
        };

        if let Some(token) = resume {
            info!("Resuming stored session");
            storefront.inner.realtime.connect(token);
        }
        Ok(storefront)
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn storage(&self) -> &Arc<dyn SessionStorage> {
        &self.inner.storage
    }

    #[must_use]
    pub fn auth(&self) -> &AuthStore {
        &self.inner.auth
    }

    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    #[must_use]
    pub fn products(&self) -> &ProductStore {
        &self.inner.products
    }

    #[must_use]
    pub fn orders(&self) -> &OrderStore {
        &self.inner.orders
    }

    #[must_use]
    pub fn wishlist(&self) -> &WishlistStore {
        &self.inner.wishlist
    }

    #[must_use]
    pub fn notifications(&self) -> &NotificationStore {
        &self.inner.notifications
    }

    #[must_use]
    pub fn realtime(&self) -> &RealtimeAdapter {
        &self.inner.realtime
    }

    /// Log in and open the realtime channel.
    ///
    /// # Errors
    ///
    /// Returns the auth store's error; realtime stays as it was.
    pub async fn login(&self, credentials: &Credentials) -> Result<User, ApiError> {
        let user = self.inner.auth.login(credentials).await?;
        self.connect_realtime().await;
        Ok(user)
    }

    /// Register and open the realtime channel.
    ///
    /// # Errors
    ///
    /// Returns the auth store's error; realtime stays as it was.
    pub async fn register(&self, registration: &Registration) -> Result<User, ApiError> {
        let user = self.inner.auth.register(registration).await?;
        self.connect_realtime().await;
        Ok(user)
    }

    /// Refresh the profile; an expired session triggers the logout cascade.
    ///
    /// # Errors
    ///
    /// Returns the auth store's error.
    pub async fn refresh_session(&self) -> Result<User, ApiError> {
        match self.inner.auth.get_profile().await {
            Err(err) if err.is_unauthorized() => {
                self.clear_user_data().await;
                Err(err)
            }
            other => other,
        }
    }

    /// End the session, drop user-scoped data, and close realtime.
    pub async fn logout(&self) {
        self.inner.auth.logout().await;
        self.clear_user_data().await;
    }

    /// Place an order. On success the local cart is cleared and the new
    /// order's id is returned.
    ///
    /// # Errors
    ///
    /// Returns the order store's error; the cart is left alone.
    #[instrument(skip(self, payload))]
    pub async fn checkout(&self, payload: &NewOrder) -> Result<OrderId, ApiError> {
        let order = self.inner.orders.create(payload).await?;
        self.inner.cart.reset().await;
        info!(order_id = %order.id, "Checkout complete");
        Ok(order.id.clone())
    }

    /// Move a wishlist item into the cart, applying both snapshots.
    ///
    /// # Errors
    ///
    /// Returns the wishlist store's error; neither slice changes.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn move_to_cart(&self, product_id: &ProductId) -> Result<MoveToCartOutcome, ApiError> {
        let outcome = self.inner.wishlist.move_to_cart(product_id).await?;
        self.inner.cart.replace(outcome.cart.clone()).await;
        Ok(outcome)
    }

    /// Re-fetch whatever `event` makes stale.
    ///
    /// # Errors
    ///
    /// Returns the error of the re-fetch, if one was issued.
    #[instrument(skip(self, event), fields(event = %event.name))]
    pub async fn apply_event(&self, event: &RealtimeEvent) -> Result<(), ApiError> {
        match event.invalidates() {
            None => {}
            Some(Invalidation::Orders(order_id)) => {
                self.inner.orders.fetch_mine().await?;
                let current = self.inner.orders.snapshot().await.current;
                if let (Some(changed), Some(current)) = (order_id, current)
                    && current.id == changed
                {
                    self.inner.orders.fetch_by_id(&changed).await?;
                }
            }
            Some(Invalidation::Product(product_id)) => {
                let Some(current) = self.inner.products.current_id().await else {
                    debug!("No current product to refresh");
                    return Ok(());
                };
                if product_id.is_none_or(|changed| changed == current) {
                    self.inner.products.fetch_by_id(&current).await?;
                }
            }
            Some(Invalidation::Wishlist) => {
                self.inner.wishlist.fetch().await?;
            }
        }
        Ok(())
    }

    /// Spawn a task that calls [`Storefront::apply_event`] for every
    /// realtime event. Re-fetch failures are logged, not propagated.
    #[must_use]
    pub fn spawn_event_refresh(&self) -> JoinHandle<()> {
        let storefront = self.clone();
        let mut events = self.inner.realtime.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if let Err(e) = storefront.apply_event(&event).await {
                            warn!(error = %e, event = %event.name, "Refresh after realtime event failed");
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Realtime refresh fell behind");
                    }
                    Err(RecvError::Closed) => return,
                }
            }
        })
    }

    async fn connect_realtime(&self) {
        match self.inner.auth.snapshot().await.token {
            Some(token) => self.inner.realtime.connect(token),
            None => warn!("Session opened without a token; realtime not connected"),
        }
    }

    async fn clear_user_data(&self) {
        self.inner.cart.reset().await;
        self.inner.wishlist.reset().await;
        self.inner.orders.reset().await;
        self.inner.realtime.disconnect();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, keys};

    fn config() -> ClientConfig {
        ClientConfig::new("http://127.0.0.1:9/api").unwrap()
    }

    #[tokio::test]
    async fn test_initialize_without_session_leaves_realtime_closed() {
        let storefront = Storefront::with_storage(config(), Arc::new(MemoryStorage::new())).unwrap();
        assert!(!storefront.auth().is_authenticated().await);
        assert!(!storefront.realtime().is_connected());
    }

    #[tokio::test]
    async fn test_initialize_with_stored_token_connects_realtime() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(keys::TOKEN, "tok").unwrap();

        let storefront = Storefront::with_storage(config(), storage).unwrap();
        assert!(storefront.auth().is_authenticated().await);
        assert!(storefront.realtime().is_connected());

        storefront.logout().await;
        assert!(!storefront.realtime().is_connected());
        assert!(!storefront.auth().is_authenticated().await);
        assert_eq!(storefront.storage().get(keys::TOKEN).unwrap(), None);
    }
}
