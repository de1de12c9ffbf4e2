//! Shopfront Core - Shared types library.
//!
//! This crate provides the types used across all Shopfront components:
//! - `client` - HTTP adapter, domain stores, and realtime channel
//! - `cli` - Command-line front end driving the stores
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no async.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, emails, statuses, and API records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
