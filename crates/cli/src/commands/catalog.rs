//! Catalog commands.

use clap::Subcommand;
use shopfront_client::{Storefront, selectors};
use shopfront_core::{NewReview, Price, ProductFilters, ProductId};

use super::CommandError;

#[derive(Subcommand)]
pub enum ProductsAction {
    /// List products matching the filters
    List {
        /// Free-text search
        #[arg(short, long)]
        query: Option<String>,

        #[arg(short, long)]
        category: Option<String>,

        #[arg(long)]
        min_price: Option<String>,

        #[arg(long)]
        max_price: Option<String>,

        #[arg(long)]
        min_rating: Option<f64>,

        #[arg(short, long)]
        page: Option<u32>,

        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Show one product
    Show { id: String },
    /// List reviews for a product
    Reviews {
        id: String,

        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Review a product
    Review {
        id: String,

        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: u8,

        #[arg(short, long, default_value = "")]
        comment: String,
    },
}

#[allow(clippy::print_stdout)]
pub async fn run(storefront: &Storefront, action: ProductsAction) -> Result<(), CommandError> {
    let products = storefront.products();
    match action {
        ProductsAction::List {
            query,
            category,
            min_price,
            max_price,
            min_rating,
            page,
            limit,
        } => {
            let filters = ProductFilters {
                query,
                category,
                min_price: min_price.as_deref().map(Price::parse).transpose()?,
                max_price: max_price.as_deref().map(Price::parse).transpose()?,
                min_rating,
                page,
                limit,
            };
            products.set_filters(filters).await;
            products.apply_filters().await?;

            let state = products.snapshot().await;
            for product in selectors::listed_products(&state) {
                println!(
                    "{:<12} {:<40} {:>10}  stock {}",
                    product.id, product.name, product.price.to_string(), product.stock
                );
            }
            let page = state.pagination;
            println!(
                "Page {} of {} ({} items)",
                page.current_page, page.total_pages, page.total_items
            );
        }
        ProductsAction::Show { id } => {
            let product = products.fetch_by_id(&ProductId::new(id)).await?;
            println!("{} ({})", product.name, product.id);
            println!("Price:    {}", product.price);
            println!("Category: {}", product.category);
            println!("Rating:   {:.1} ({} reviews)", product.rating, product.num_reviews);
            println!(
                "Stock:    {}",
                if product.in_stock() { product.stock.to_string() } else { "out of stock".to_owned() }
            );
            if !product.description.is_empty() {
                println!();
                println!("{}", product.description);
            }
        }
        ProductsAction::Reviews { id, page } => {
            let reviews = products.fetch_reviews(&ProductId::new(id), page).await?;
            if reviews.is_empty() {
                println!("No reviews");
            }
            for review in reviews {
                println!("{}/5 {}: {}", review.rating, review.user_name, review.comment);
            }
        }
        ProductsAction::Review {
            id,
            rating,
            comment,
        } => {
            let review = products
                .create_review(&ProductId::new(id), &NewReview { rating, comment })
                .await?;
            println!("Posted review {}", review.id);
        }
    }
    Ok(())
}
