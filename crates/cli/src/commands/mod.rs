//! Subcommand implementations.
//!
//! Results go to stdout; logs go to stderr through `tracing`.

pub mod account;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod watch;
pub mod wishlist;

use shopfront_client::ApiError;
use shopfront_core::{Cart, EmailError, PriceError};
use thiserror::Error;

/// Errors that can occur while running a subcommand.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The API rejected or failed the request.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// Invalid email argument.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Invalid price argument.
    #[error("Invalid price: {0}")]
    InvalidPrice(#[from] PriceError),

    /// Checkout was attempted with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// The command needs a session.
    #[error("Not logged in; run `shopfront login` first")]
    NotLoggedIn,
}

#[allow(clippy::print_stdout)]
fn print_cart(cart: &Cart) {
    if cart.is_empty() {
        println!("Cart is empty");
        return;
    }
    for item in &cart.items {
        println!(
            "{:<12} {:<32} {:>3} x {}",
            item.product_id, item.name, item.quantity, item.price
        );
    }
    println!("Subtotal: {}", cart.subtotal);
    println!("Tax:      {}", cart.tax);
    println!("Shipping: {}", cart.shipping);
    println!("Total:    {}", cart.total);
}
