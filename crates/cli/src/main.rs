//! Tienda CLI - Browse the catalog, manage the cart and place orders.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! tienda products --featured
//! tienda products --category bebidas
//! tienda product cafe-serrano
//!
//! # Manage the cart
//! tienda cart add cafe-serrano -q 2
//! tienda cart set 4 3
//! tienda cart show
//!
//! # Send the order
//! tienda checkout --date 2025-03-01 --time 14:00 --name "Ana Pérez" --ci 85010112345 \
//!     --address "Calle 1 #23" --municipality Bayamo --province Granma --phone 5355551234
//! ```
//!
//! # Commands
//!
//! - `products`, `product`, `categories`, `category`, `store`, `hero` - Read the catalog
//! - `cart` - Show and edit the persisted cart
//! - `checkout` - Compose the order message and print its deep link
//! - `ask` - Print a deep link asking about a single product

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tienda_core::ProductId;
use tienda_storefront::AppState;
use tienda_storefront::checkout::PaymentCurrency;
use tienda_storefront::config::StorefrontConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod render;

#[derive(Parser)]
#[command(name = "tienda")]
#[command(author, version, about = "Tienda storefront")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products
    Products {
        /// Only featured products
        #[arg(long, conflicts_with = "category")]
        featured: bool,

        /// Only products in this category (slug)
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Show a product
    Product {
        /// Product slug
        slug: String,
    },
    /// List categories
    Categories,
    /// Show a category and its products
    Category {
        /// Category slug
        slug: String,
    },
    /// Show the store settings
    Store,
    /// Show the home page hero images
    Hero,
    /// Show and edit the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Send the cart as an order
    Checkout(CheckoutArgs),
    /// Ask about a product without adding it to the cart
    Ask {
        /// Product slug
        slug: String,

        /// Quantity of interest
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        quantity: u32,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add a product by slug
    Add {
        /// Product slug
        slug: String,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        quantity: u32,
    },
    /// Remove a product's line
    Remove {
        /// Product ID
        id: ProductId,
    },
    /// Set a line's quantity (0 removes it)
    Set {
        /// Product ID
        id: ProductId,

        /// New quantity
        quantity: u32,
    },
    /// Empty the cart
    Clear,
    /// Print a quick order link for the cart without the checkout form
    Message,
}

#[derive(clap::Args)]
struct CheckoutArgs {
    /// Delivery date
    #[arg(long)]
    date: String,

    /// Delivery time
    #[arg(long)]
    time: String,

    /// Full name
    #[arg(long)]
    name: String,

    /// National identity card number
    #[arg(long = "ci")]
    national_id: String,

    /// Delivery address
    #[arg(long)]
    address: String,

    #[arg(long)]
    municipality: String,

    #[arg(long)]
    province: String,

    /// Landmarks near the address
    #[arg(long, default_value = "")]
    reference: String,

    /// Contact phone
    #[arg(long)]
    phone: String,

    /// Payment currency (usd, zelle, cup, mixto)
    #[arg(long, default_value = "usd")]
    payment: PaymentCurrency,
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
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing with EnvFilter and Sentry integration
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tienda=info,tienda_storefront=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    // Events before this point have no client to go to
    let _sentry_guard = init_sentry(&config);

    let state = match AppState::new(config) {
        Ok(state) => state,
        Err(e) => return render::failure(&e),
    };

    match run(cli, &state).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => render::failure(&e),
    }
}

async fn run(cli: Cli, state: &AppState) -> tienda_storefront::Result<()> {
    match cli.command {
        Commands::Products { featured, category } => {
            commands::catalog::products(state, featured, category.as_deref()).await?;
        }
        Commands::Product { slug } => commands::catalog::product(state, &slug).await?,
        Commands::Categories => commands::catalog::categories(state).await?,
        Commands::Category { slug } => commands::catalog::category(state, &slug).await?,
        Commands::Store => commands::catalog::store(state).await?,
        Commands::Hero => commands::catalog::hero(state).await?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(state),
            CartAction::Add { slug, quantity } => {
                commands::cart::add(state, &slug, quantity).await?;
            }
            CartAction::Remove { id } => commands::cart::remove(state, id),
            CartAction::Set { id, quantity } => commands::cart::set(state, id, quantity),
            CartAction::Clear => commands::cart::clear(state),
            CartAction::Message => commands::checkout::cart_link(state).await?,
        },
        Commands::Checkout(args) => {
            let form = tienda_storefront::checkout::CheckoutForm {
                date: args.date,
                time: args.time,
                name: args.name,
                national_id: args.national_id,
                address: args.address,
                municipality: args.municipality,
                province: args.province,
                reference: args.reference,
                phone: args.phone,
                payment: args.payment,
            };
            commands::checkout::order(state, &form).await?;
        }
        Commands::Ask { slug, quantity } => commands::checkout::ask(state, &slug, quantity).await?,
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_cart_set() {
        let cli = Cli::try_parse_from(["tienda", "cart", "set", "4", "0"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Cart {
                action: CartAction::Set { id, quantity: 0 }
            } if id == ProductId::new(4)
        ));
    }

    #[test]
    fn test_parse_rejects_zero_add() {
        assert!(Cli::try_parse_from(["tienda", "cart", "add", "cafe", "-q", "0"]).is_err());
    }

    #[test]
    fn test_parse_checkout_payment() {
        let cli = Cli::try_parse_from([
            "tienda", "checkout", "--date", "2025-03-01", "--time", "14:00", "--name", "Ana",
            "--ci", "1", "--address", "Calle 1", "--municipality", "Bayamo", "--province",
            "Granma", "--phone", "5355551234", "--payment", "CUP",
        ])
        .unwrap();
        let Commands::Checkout(args) = cli.command else {
            panic!("expected checkout");
        };
        assert_eq!(args.payment, PaymentCurrency::Cup);
        assert_eq!(args.reference, "");
    }
}
