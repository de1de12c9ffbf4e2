//! Core types for Shopfront.
//!
//! Type-safe wrappers for identifiers and money, status enums, and the
//! records exchanged with the storefront API.

pub mod cart;
pub mod catalog;
pub mod email;
pub mod id;
pub mod notification;
pub mod order;
pub mod price;
pub mod status;
pub mod user;
pub mod wishlist;

pub use cart::{Cart, CartItem};
pub use catalog::{NewReview, Pagination, Product, ProductFilters, Review};
pub use email::{Email, EmailError};
pub use id::*;
pub use notification::{NewNotification, Notification};
pub use order::{NewOrder, Order, OrderItem, OrderLine};
pub use price::{Price, PriceError};
pub use status::*;
pub use user::{Address, ProfileUpdate, User};
pub use wishlist::WishlistItem;
