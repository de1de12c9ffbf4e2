//! Wishlist commands.

use clap::Subcommand;
use shopfront_client::Storefront;
use shopfront_core::{ProductId, WishlistItem};

use super::{CommandError, print_cart};

#[derive(Subcommand)]
pub enum WishlistAction {
    /// Show the wishlist
    List,
    /// Save a product
    Add { product_id: String },
    /// Remove a product
    Remove { product_id: String },
    /// Move a saved product into the cart
    Move { product_id: String },
}

pub async fn run(storefront: &Storefront, action: WishlistAction) -> Result<(), CommandError> {
    let store = storefront.wishlist();
    let items = match action {
        WishlistAction::List => store.fetch().await?,
        WishlistAction::Add { product_id } => store.add(&ProductId::new(product_id)).await?,
        WishlistAction::Remove { product_id } => store.remove(&ProductId::new(product_id)).await?,
        WishlistAction::Move { product_id } => {
            let outcome = storefront.move_to_cart(&ProductId::new(product_id)).await?;
            print_cart(&outcome.cart);
            outcome.wishlist
        }
    };
    print_items(&items);
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_items(items: &[WishlistItem]) {
    if items.is_empty() {
        println!("Wishlist is empty");
    }
    for item in items {
        let price = item.price.map(|p| p.to_string()).unwrap_or_default();
        let stock = match item.in_stock {
            Some(false) => "  (out of stock)",
            _ => "",
        };
        println!("{:<12} {:<40} {price:>10}{stock}", item.product_id, item.name);
    }
}
