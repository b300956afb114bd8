//! Cart commands.
//!
//! Each command runs one cart operation against a file-backed store and,
//! for `--authenticated` or `sync`, the HTTP remote API.
//!
//! # Environment Variables
//!
//! - `CART_STORAGE_DIR` - Directory holding the anonymous cart file
//! - `CART_API_BASE_URL` - Remote cart API, required for signed-in commands
//! - `CART_API_TOKEN` - Bearer token for the remote cart API

use std::sync::Arc;

use async_trait::async_trait;
use cardfactory_cart::{
    CartConfig, CartError, CartFault, CartOperation, CartService, ConfigError, FileStore,
    HttpCartClient, RemoteCartClient, RemoteError, SessionAuth, SyncOutcome,
};
use cardfactory_core::{BarId, Cart, CartLineInput, NewCartItem, Price, PriceError, Quantity};
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::broadcast;

/// Errors that can occur while running a cart command.
#[derive(Debug, Error)]
pub enum CartCommandError {
    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// HTTP client could not be built.
    #[error("Remote client error: {0}")]
    Remote(#[from] RemoteError),

    /// Price argument was rejected.
    #[error("Invalid price: {0}")]
    Price(#[from] PriceError),

    /// The cart swallowed a failure while running the command.
    #[error("{operation} failed: {error}")]
    Fault {
        operation: CartOperation,
        error: Arc<CartError>,
    },
}

impl From<CartFault> for CartCommandError {
    fn from(fault: CartFault) -> Self {
        Self::Fault {
            operation: fault.operation,
            error: fault.error,
        }
    }
}

/// Stands in for the remote API when `CART_API_BASE_URL` is unset.
///
/// Only reachable if a signed-in operation slips through, which [`open`]
/// prevents.
struct UnconfiguredRemote;

impl UnconfiguredRemote {
    fn error() -> RemoteError {
        RemoteError::NotConfigured("set CART_API_BASE_URL".to_string())
    }
}

#[async_trait]
impl RemoteCartClient for UnconfiguredRemote {
    async fn get_cart(&self) -> Result<Cart, RemoteError> {
        Err(Self::error())
    }

    async fn add_items(&self, _lines: &[CartLineInput]) -> Result<(), RemoteError> {
        Err(Self::error())
    }

    async fn remove_item(&self, _slug: &str) -> Result<(), RemoteError> {
        Err(Self::error())
    }

    async fn clear_cart(&self) -> Result<(), RemoteError> {
        Err(Self::error())
    }
}

/// Build the cart for this invocation.
///
/// # Errors
///
/// Returns error if `authenticated` is set and the remote API is not
/// configured, or the HTTP client fails to build.
pub fn open(config: &CartConfig, authenticated: bool) -> Result<CartService, CartCommandError> {
    if authenticated {
        config.require_remote()?;
    }

    let remote: Arc<dyn RemoteCartClient> = match &config.remote {
        Some(remote) => Arc::new(HttpCartClient::new(remote)?),
        None => Arc::new(UnconfiguredRemote),
    };

    tracing::debug!(dir = %config.storage.dir.display(), authenticated, "Opening cart");

    Ok(CartService::new(
        Arc::new(FileStore::new(&config.storage.dir)),
        remote,
        Arc::new(SessionAuth::with_state(authenticated)),
        &config.storage,
    ))
}

/// Build a product from command-line arguments.
///
/// # Errors
///
/// Returns error if `price` is negative.
pub fn new_item(
    slug: String,
    bar_id: i64,
    name: String,
    description: String,
    price: Decimal,
) -> Result<NewCartItem, CartCommandError> {
    Ok(NewCartItem {
        slug,
        bar_id: BarId::new(bar_id),
        name,
        description,
        price: Price::new(price)?,
        assets: Vec::new(),
    })
}

/// Fail with the first fault published since `faults` subscribed.
fn check_faults(faults: &mut broadcast::Receiver<CartFault>) -> Result<(), CartCommandError> {
    match faults.try_recv() {
        Ok(fault) => {
            if let Some(hint) = fault_hint(&fault.error) {
                tracing::warn!("{hint}");
            }
            Err(fault.into())
        }
        Err(_) => Ok(()),
    }
}

/// Operator hint for faults with a known fix.
fn fault_hint(error: &CartError) -> Option<&'static str> {
    error
        .is_unauthorized()
        .then_some("Remote API rejected the request; check CART_API_TOKEN")
}

/// Print the cart.
///
/// # Errors
///
/// Returns error if loading the cart failed.
#[allow(clippy::print_stdout)]
pub async fn list(cart: &CartService) -> Result<(), CartCommandError> {
    let mut faults = cart.subscribe_faults();
    let items = cart.list_items().await;
    check_faults(&mut faults)?;

    print!("{}", render(&items));
    Ok(())
}

/// Set a product's quantity.
///
/// # Errors
///
/// Returns error if saving the cart failed.
pub async fn add(
    cart: &CartService,
    item: NewCartItem,
    quantity: Option<i64>,
) -> Result<Quantity, CartCommandError> {
    let mut faults = cart.subscribe_faults();
    let slug = item.slug.clone();
    let applied = cart.add_item(item, quantity).await;
    check_faults(&mut faults)?;

    tracing::info!(slug = %slug, quantity = %applied, mode = %cart.mode(), "Item added");
    Ok(applied)
}

/// Remove a product.
///
/// # Errors
///
/// Returns error if the removal failed.
pub async fn remove(cart: &CartService, slug: &str) -> Result<(), CartCommandError> {
    let mut faults = cart.subscribe_faults();
    cart.remove_item(slug).await;
    check_faults(&mut faults)?;

    tracing::info!(slug = %slug, mode = %cart.mode(), "Item removed");
    Ok(())
}

/// Empty the cart.
///
/// # Errors
///
/// Returns error if clearing failed.
pub async fn clear(cart: &CartService) -> Result<(), CartCommandError> {
    let mut faults = cart.subscribe_faults();
    cart.clear_cart().await;
    check_faults(&mut faults)?;

    tracing::info!(mode = %cart.mode(), "Cart cleared");
    Ok(())
}

/// Push the anonymous cart to the server.
///
/// # Errors
///
/// Returns error if the push failed.
pub async fn sync(cart: &CartService) -> Result<SyncOutcome, CartCommandError> {
    let mut faults = cart.subscribe_faults();
    let outcome = cart.sync_if_needed().await;
    check_faults(&mut faults)?;

    match outcome {
        SyncOutcome::Synced { lines } => tracing::info!(lines, "Cart synced"),
        SyncOutcome::NothingToSync => tracing::info!("Local cart is empty, nothing to sync"),
        other => tracing::info!(outcome = ?other, "Sync skipped"),
    }
    Ok(outcome)
}

/// Plain-text cart listing.
fn render(cart: &Cart) -> String {
    use std::fmt::Write;

    if cart.is_empty() {
        return "Cart is empty\n".to_string();
    }

    let mut out = String::new();
    for item in cart {
        let _ = writeln!(
            out,
            "{:>4} x {} ({}) @ {}",
            item.quantity.get(),
            item.name,
            item.slug,
            item.price
        );
    }
    let _ = writeln!(
        out,
        "{} items, subtotal ${:.2}",
        cart.item_count(),
        cart.subtotal()
    );
    out
}
