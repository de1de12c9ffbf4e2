//! Shopfront CLI - Storefront client for the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Log in (password may also come from SHOPFRONT_PASSWORD)
//! shopfront login -e ada@example.com -p hunter2
//!
//! # Browse the catalog
//! shopfront products list --category Electronics --page 1
//!
//! # Fill the cart and check out
//! shopfront cart add p1 -q 2
//! shopfront checkout --street "1 Main St" --city Springfield --state IL --postal-code 62701 --country US
//!
//! # Stream realtime notifications until Ctrl-C
//! shopfront watch
//! ```
//!
//! # Environment Variables
//!
//! See `shopfront_client::config` for the full list. `SHOPFRONT_API_URL` is required.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use shopfront_client::{ClientConfig, Storefront};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "shopfront")]
#[command(author, version, about = "Shopfront storefront client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "SHOPFRONT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and store the session
    Register {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "SHOPFRONT_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long)]
        phone: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user, refreshed from the API
    Whoami,
    /// Change the account password
    Password {
        #[arg(long, env = "SHOPFRONT_PASSWORD", hide_env_values = true)]
        current: String,

        #[arg(long = "new")]
        new: String,
    },
    /// Browse the catalog
    Products {
        #[command(subcommand)]
        action: commands::catalog::ProductsAction,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: commands::cart::CartAction,
    },
    /// Place an order for the current cart
    Checkout(commands::orders::CheckoutArgs),
    /// Order history
    Orders {
        #[command(subcommand)]
        action: commands::orders::OrdersAction,
    },
    /// Manage the wishlist
    Wishlist {
        #[command(subcommand)]
        action: commands::wishlist::WishlistAction,
    },
    /// Print realtime notifications as they arrive
    Watch {
        /// Re-fetch affected data after each event
        #[arg(long)]
        refresh: bool,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt::init();
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shopfront_client=info,shopfront_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let storefront = Storefront::initialize(config)?;

    match cli.command {
        Commands::Login { email, password } => {
            commands::account::login(&storefront, &email, password).await?;
        }
        Commands::Register {
            name,
            email,
            password,
            phone,
        } => commands::account::register(&storefront, name, &email, password, phone).await?,
        Commands::Logout => commands::account::logout(&storefront).await,
        Commands::Whoami => commands::account::whoami(&storefront).await?,
        Commands::Password { current, new } => {
            commands::account::change_password(&storefront, current, new).await?;
        }
        Commands::Products { action } => commands::catalog::run(&storefront, action).await?,
        Commands::Cart { action } => commands::cart::run(&storefront, action).await?,
        Commands::Checkout(args) => commands::orders::checkout(&storefront, args).await?,
        Commands::Orders { action } => commands::orders::run(&storefront, action).await?,
        Commands::Wishlist { action } => commands::wishlist::run(&storefront, action).await?,
        Commands::Watch { refresh } => commands::watch::run(&storefront, refresh).await?,
    }

    storefront.realtime().disconnect();
    Ok(())
}
