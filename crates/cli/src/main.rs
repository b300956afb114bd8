//! Card Factory cart CLI.
//!
//! # Usage
//!
//! ```bash
//! # Show the anonymous cart kept under CART_STORAGE_DIR
//! cart-cli list
//!
//! # Add (or re-set) a product
//! cart-cli add --slug birthday-cake --bar-id 42 --name "Birthday Cake" --price 3.99 --quantity 2
//!
//! # Remove a product, or everything
//! cart-cli remove birthday-cake
//! cart-cli clear
//!
//! # Act on the signed-in cart instead
//! cart-cli --authenticated list
//!
//! # Push the anonymous cart to the server and clear it locally
//! cart-cli sync
//! ```
//!
//! # Commands
//!
//! - `list` - Print the cart
//! - `add` - Set a product's quantity
//! - `remove` - Remove a product
//! - `clear` - Empty the cart
//! - `sync` - Migrate the anonymous cart to the server
//!
//! A command exits non-zero if the cart reported a fault while running it.

#![cfg_attr(not(test), forbid(unsafe_code))]

use cardfactory_cart::CartConfig;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "cart-cli")]
#[command(author, version, about = "Card Factory cart tools")]
struct Cli {
    /// Use the signed-in cart on the server instead of the local one
    #[arg(long, global = true)]
    authenticated: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the cart
    List,
    /// Set a product's quantity, adding it if absent
    Add {
        /// Product slug
        #[arg(short, long)]
        slug: String,

        /// Product bar ID
        #[arg(short, long)]
        bar_id: i64,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Display description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Unit price, e.g. 3.99
        #[arg(short, long)]
        price: Decimal,

        /// Quantity; zero, negative or absent means 1
        #[arg(short, long, allow_negative_numbers = true)]
        quantity: Option<i64>,
    },
    /// Remove a product
    Remove {
        /// Product slug
        slug: String,
    },
    /// Empty the cart
    Clear,
    /// Push the anonymous cart to the server (implies --authenticated)
    Sync,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CartConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

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
async fn main() {
    let cli = Cli::parse();

    // Load configuration from environment (needed for Sentry init)
    let config = CartConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cardfactory_cart=info,cardfactory_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, &config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &CartConfig) -> Result<(), Box<dyn std::error::Error>> {
    let authenticated = cli.authenticated || matches!(cli.command, Commands::Sync);
    let cart = commands::cart::open(config, authenticated)?;

    match cli.command {
        Commands::List => commands::cart::list(&cart).await?,
        Commands::Add {
            slug,
            bar_id,
            name,
            description,
            price,
            quantity,
        } => {
            let item = commands::cart::new_item(slug, bar_id, name, description, price)?;
            commands::cart::add(&cart, item, quantity).await?;
        }
        Commands::Remove { slug } => commands::cart::remove(&cart, &slug).await?,
        Commands::Clear => commands::cart::clear(&cart).await?,
        Commands::Sync => {
            commands::cart::sync(&cart).await?;
        }
    }
    Ok(())
}
