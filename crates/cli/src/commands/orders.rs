//! Order and checkout commands.

use clap::{Args, Subcommand};
use shopfront_client::{Storefront, selectors};
use shopfront_core::{Address, NewOrder, Order, OrderId, OrderLine, OrderProgress, OrderStatus};

use super::CommandError;

#[derive(Subcommand)]
pub enum OrdersAction {
    /// List your orders
    List,
    /// Show one order with its progress
    Show { id: String },
    /// Cancel a pending order
    Cancel { id: String },
}

#[derive(Args)]
pub struct CheckoutArgs {
    #[arg(long)]
    street: String,

    #[arg(long)]
    city: String,

    #[arg(long)]
    state: String,

    #[arg(long)]
    postal_code: String,

    #[arg(long)]
    country: String,

    #[arg(long, default_value = "card")]
    payment_method: String,

    /// Payment intent confirmed by the payment provider
    #[arg(long)]
    payment_intent: Option<String>,
}

#[allow(clippy::print_stdout)]
pub async fn run(storefront: &Storefront, action: OrdersAction) -> Result<(), CommandError> {
    let orders = storefront.orders();
    match action {
        OrdersAction::List => {
            let list = orders.fetch_mine().await?;
            if list.is_empty() {
                println!("No orders");
            }
            for order in list {
                println!(
                    "{:<14} {:<11} {:>10}  {} items",
                    order.id,
                    order.status.as_str(),
                    order.total.to_string(),
                    order.items.len()
                );
            }
        }
        OrdersAction::Show { id } => {
            let order = orders.fetch_by_id(&OrderId::new(id)).await?;
            print_order(&order);
        }
        OrdersAction::Cancel { id } => {
            let order = orders.cancel(&OrderId::new(id)).await?;
            println!("Order {} is now {}", order.id, order.status);
        }
    }
    Ok(())
}

/// Order every line of the current cart.
#[allow(clippy::print_stdout)]
pub async fn checkout(storefront: &Storefront, args: CheckoutArgs) -> Result<(), CommandError> {
    let cart = storefront.cart().fetch_cart().await?;
    if cart.is_empty() {
        return Err(CommandError::EmptyCart);
    }

    let payload = NewOrder {
        items: cart
            .items
            .iter()
            .map(|item| OrderLine {
                product_id: item.product_id.clone(),
                quantity: item.quantity,
            })
            .collect(),
        shipping_address: Address {
            street: args.street,
            city: args.city,
            state: args.state,
            postal_code: args.postal_code,
            country: args.country,
        },
        payment_method: args.payment_method,
        payment_intent_id: args.payment_intent,
    };

    let order_id = storefront.checkout(&payload).await?;
    println!("Order placed: {order_id}");

    let state = storefront.orders().snapshot().await;
    if let Some(order) = selectors::find_order(&state, &order_id) {
        print_order(order);
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_order(order: &Order) {
    println!("Order {}", order.id);
    for item in &order.items {
        println!("  {:>3} x {} ({})", item.quantity, item.name, item.price);
    }
    println!("Total: {}", order.total);
    if let Some(tracking) = &order.tracking_number {
        println!("Tracking: {tracking}");
    }

    match selectors::order_progress(order) {
        OrderProgress::Step { index, .. } => {
            let steps: Vec<String> = OrderStatus::STEPS
                .iter()
                .enumerate()
                .map(|(i, step)| {
                    if i <= index {
                        format!("[{step}]")
                    } else {
                        step.to_string()
                    }
                })
                .collect();
            println!("Progress: {}", steps.join(" > "));
        }
        OrderProgress::Cancelled => println!("Progress: cancelled"),
        OrderProgress::Unknown(raw) => println!("Progress: unknown ({raw})"),
    }
}
