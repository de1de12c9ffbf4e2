//! Shopfront client state layer.
//!
//! Stores that mirror the storefront REST API into local state, the realtime
//! channel that feeds the notification panel, and a [`Storefront`]
//! coordinator for flows spanning several stores.
//!
//! # Example
//!
//! ```rust,ignore
//! let storefront = Storefront::initialize(ClientConfig::from_env()?)?;
//! storefront.cart().fetch_cart().await?;
//! let count = selectors::cart_item_count(&storefront.cart().snapshot().await);
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod http;
pub mod realtime;
pub mod selectors;
pub mod storage;
pub mod storefront;
pub mod stores;
pub mod telemetry;

pub use config::{ClientConfig, ConfigError, RealtimeConfig};
pub use error::{ApiError, ErrorKind, StorageError};
pub use http::ApiClient;
pub use realtime::{EventName, RealtimeAdapter, RealtimeEvent};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
pub use storefront::{InitError, Storefront};
pub use stores::{
    AuthState, AuthStore, CartState, CartStore, Credentials, MoveToCartOutcome,
    NotificationState, NotificationStore, OrderState, OrderStore, ProductState, ProductStore,
    Registration, RequestStatus, WishlistState, WishlistStore, hydrate_session,
};
