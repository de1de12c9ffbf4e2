//! Cart commands.

use clap::Subcommand;
use shopfront_client::Storefront;
use shopfront_core::ProductId;

use super::{CommandError, print_cart};

#[derive(Subcommand)]
pub enum CartAction {
    /// Show the cart
    Show,
    /// Add a product
    Add {
        product_id: String,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set the quantity of a line
    Set { product_id: String, quantity: u32 },
    /// Remove a line
    Remove { product_id: String },
    /// Empty the cart
    Clear,
}

pub async fn run(storefront: &Storefront, action: CartAction) -> Result<(), CommandError> {
    let store = storefront.cart();
    let cart = match action {
        CartAction::Show => store.fetch_cart().await?,
        CartAction::Add {
            product_id,
            quantity,
        } => store.add_item(&ProductId::new(product_id), quantity).await?,
        CartAction::Set {
            product_id,
            quantity,
        } => store.set_quantity(&ProductId::new(product_id), quantity).await?,
        CartAction::Remove { product_id } => store.remove_item(&ProductId::new(product_id)).await?,
        CartAction::Clear => store.clear_cart().await?,
    };
    print_cart(&cart);
    Ok(())
}
