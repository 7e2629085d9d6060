//! Azlan CLI - browse the catalog, manage the cart and place orders.
//!
//! # Usage
//!
//! ```bash
//! # Browse men's shirts under Rs. 5,000, cheapest first
//! azlan products --category Men --max 5000 --sort-price low-high
//!
//! # Same listing from a shared link's query string
//! azlan products --query "category=Men&max=5000&sort=low-high"
//!
//! # Cart
//! azlan cart add 412 --quantity 2
//! azlan cart show
//!
//! # Checkout as a guest with cash on delivery
//! azlan checkout --name "Ayesha Khan" --email ayesha@example.com \
//!     --address "12 Mall Road" --city Lahore --postal 54000 --phone 03001234567
//! ```
//!
//! # Environment Variables
//!
//! - `WOO_CONSUMER_KEY`, `WOO_CONSUMER_SECRET` - WooCommerce REST credentials
//! - `AZLAN_DATA_DIR` - where the cart and login are kept (default `.azlan`)
//! - `RUST_LOG` - log filter (logs go to stderr)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use azlan_storefront::notify::RecordingNotifier;
use azlan_storefront::storage::{FileStore, SharedStore};
use azlan_storefront::{AppError, AppState, StorefrontConfig};
use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

use commands::account::ReviewArgs;
use commands::browse::ProductFilterArgs;
use commands::checkout::CheckoutArgs;

#[derive(Parser)]
#[command(name = "azlan")]
#[command(author, version, about = "Azlan storefront from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the catalog with search, filters, sorting and paging
    Products(ProductFilterArgs),
    /// Show one product
    Product {
        /// Product id
        id: u64,
    },
    /// List the catalog's categories
    Categories,
    /// Featured products from the product feed
    Featured,
    /// Newest products from the product feed
    NewArrivals,
    /// Trending products from the product feed
    Trending {
        /// Page number
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },
    /// Manage the shopping cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Check a coupon code against the cart
    Coupon {
        /// Coupon code
        code: String,
    },
    /// Place an order for the cart
    Checkout(CheckoutArgs),
    /// Log in with a store account
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "AZLAN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored login
    Logout,
    /// Show the logged-in customer
    Whoami,
    /// List the logged-in customer's orders
    Orders,
    /// List a product's reviews
    Reviews {
        /// Product id
        id: u64,
    },
    /// Review a product
    Review(ReviewArgs),
    /// Store administration (uses the consumer key)
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart contents and totals
    Show,
    /// Add a product
    Add {
        /// Product id
        id: u64,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a product
    Remove {
        /// Product id
        id: u64,
    },
    /// Set a product's quantity
    Update {
        /// Product id
        id: u64,

        /// New quantity (at least 1)
        quantity: u32,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Move an order to a new status
    OrderStatus {
        /// Order id
        id: u64,

        /// New status (`pending`, `processing`, `completed`, ...)
        status: String,
    },
    /// Permanently delete an order
    DeleteOrder {
        /// Order id
        id: u64,
    },
    /// Permanently delete a product
    DeleteProduct {
        /// Product id
        id: u64,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
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
    // Logs go to stderr so command output stays clean on stdout
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "azlan_storefront=info,azlan_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            std::process::exit(2);
        }
    };
    let _sentry_guard = init_sentry(&config);

    let notifier = RecordingNotifier::new();
    let result = match build_state(config, &notifier) {
        Ok(state) => run(cli, &state).await,
        Err(e) => Err(e),
    };

    output::notices(&notifier.drain());

    if let Err(e) = result {
        e.capture();
        output::failure(&e);
        std::process::exit(1);
    }
}

fn build_state(
    config: StorefrontConfig,
    notifier: &RecordingNotifier,
) -> Result<AppState, AppError> {
    let store: SharedStore = Arc::new(FileStore::new(config.data_dir.clone()));
    AppState::new(config, store, Arc::new(notifier.clone()))
}

async fn run(cli: Cli, state: &AppState) -> Result<(), AppError> {
    match cli.command {
        Commands::Products(args) => commands::browse::products(state, &args).await,
        Commands::Product { id } => commands::browse::product(state, id).await?,
        Commands::Categories => commands::browse::categories(state).await?,
        Commands::Featured => commands::browse::featured(state).await,
        Commands::NewArrivals => commands::browse::new_arrivals(state).await,
        Commands::Trending { page } => commands::browse::trending(state, page).await,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(state).await,
            CartAction::Add { id, quantity } => commands::cart::add(state, id, quantity).await?,
            CartAction::Remove { id } => commands::cart::remove(state, id).await,
            CartAction::Update { id, quantity } => {
                commands::cart::update(state, id, quantity).await?;
            }
            CartAction::Clear => commands::cart::clear(state).await,
        },
        Commands::Coupon { code } => commands::checkout::coupon(state, &code).await?,
        Commands::Checkout(args) => commands::checkout::checkout(state, args).await?,
        Commands::Login { email, password } => {
            commands::account::login(state, &email, &password).await?;
        }
        Commands::Logout => commands::account::logout(state)?,
        Commands::Whoami => commands::account::whoami(state).await?,
        Commands::Orders => commands::account::orders(state).await?,
        Commands::Reviews { id } => commands::account::reviews(state, id).await?,
        Commands::Review(args) => commands::account::review(state, args).await?,
        Commands::Admin { action } => match action {
            AdminAction::OrderStatus { id, status } => {
                commands::admin::order_status(state, id, &status).await?;
            }
            AdminAction::DeleteOrder { id } => commands::admin::delete_order(state, id).await?,
            AdminAction::DeleteProduct { id } => {
                commands::admin::delete_product(state, id).await?;
            }
        },
    }
    Ok(())
}
