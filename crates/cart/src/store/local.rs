//! The anonymous cart slot.

use std::sync::Arc;

use cardfactory_core::Cart;
use tracing::{debug, instrument, warn};

use super::{KeyValueStore, StoreError};

/// Reads and writes the whole cart under one fixed key.
///
/// Reading never fails: an absent, empty, or unreadable slot is an empty
/// cart. A payload that does not parse is deleted on the way out so the
/// next read starts clean.
#[derive(Clone)]
pub struct LocalCartStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl LocalCartStore {
    /// Wrap `store`, keeping the cart under `key`.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// The key the cart is stored under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the stored cart.
    #[instrument(skip(self), fields(key = %self.key))]
    pub async fn read(&self) -> Cart {
        let raw = match self.store.get(&self.key).await {
            Ok(Some(raw)) if !raw.trim().is_empty() => raw,
            Ok(_) => return Cart::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read local cart, treating as empty");
                return Cart::new();
            }
        };

        match serde_json::from_str::<Cart>(&raw) {
            Ok(cart) => {
                debug!(lines = cart.len(), "Loaded local cart");
                cart
            }
            Err(e) => {
                warn!(error = %e, "Discarding corrupt local cart");
                if let Err(e) = self.store.delete(&self.key).await {
                    warn!(error = %e, "Failed to delete corrupt local cart");
                }
                Cart::new()
            }
        }
    }

    /// Overwrite the stored cart.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if serialization or the store write fails.
    #[instrument(skip(self, cart), fields(key = %self.key, lines = cart.len()))]
    pub async fn write(&self, cart: &Cart) -> Result<(), StoreError> {
        let json = serde_json::to_string(cart)?;
        self.store.set(&self.key, &json).await
    }

    /// Delete the stored cart. Deleting an absent cart is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store delete fails.
    #[instrument(skip(self), fields(key = %self.key))]
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.store.delete(&self.key).await
    }
}

impl std::fmt::Debug for LocalCartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCartStore")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
