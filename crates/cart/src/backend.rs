//! Where the cart lives for the current call.
//!
//! [`CartService`](crate::CartService) picks one backend per operation from
//! the auth signal and routes every step of that operation through it.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use cardfactory_core::Cart;
use tracing::debug;

use crate::error::CartError;
use crate::remote::RemoteCartClient;
use crate::store::LocalCartStore;

/// Which store backs the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartMode {
    /// Anonymous visitor, cart kept in local storage.
    Local,
    /// Signed-in user, cart kept on the server.
    Remote,
}

impl CartMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

impl fmt::Display for CartMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage strategy for one cart operation.
#[async_trait]
pub trait CartBackend: Send + Sync {
    /// Which mode this backend implements.
    fn mode(&self) -> CartMode;

    /// Load the current cart.
    async fn load(&self) -> Result<Cart, CartError>;

    /// Save the whole cart.
    async fn persist(&self, cart: &Cart) -> Result<(), CartError>;

    /// Remove the line with `slug`.
    async fn remove(&self, slug: &str) -> Result<(), CartError>;

    /// Remove every line.
    async fn clear(&self) -> Result<(), CartError>;
}

// =============================================================================
// Local
// =============================================================================

/// Cart kept in the local key-value slot.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    store: LocalCartStore,
}

impl LocalBackend {
    #[must_use]
    pub const fn new(store: LocalCartStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CartBackend for LocalBackend {
    fn mode(&self) -> CartMode {
        CartMode::Local
    }

    async fn load(&self) -> Result<Cart, CartError> {
        Ok(self.store.read().await)
    }

    async fn persist(&self, cart: &Cart) -> Result<(), CartError> {
        Ok(self.store.write(cart).await?)
    }

    async fn remove(&self, slug: &str) -> Result<(), CartError> {
        let mut cart = self.store.read().await;
        if !cart.remove(slug) {
            debug!(slug = %slug, "Slug not in local cart");
            return Ok(());
        }
        Ok(self.store.write(&cart).await?)
    }

    async fn clear(&self) -> Result<(), CartError> {
        Ok(self.store.clear().await?)
    }
}

// =============================================================================
// Remote
// =============================================================================

/// Cart kept on the server.
///
/// `persist` pushes every line of the cart as a bulk upsert rather than a
/// delta, so the server ends up with exactly the quantities the caller saw.
#[derive(Clone)]
pub struct RemoteBackend {
    client: Arc<dyn RemoteCartClient>,
}

impl RemoteBackend {
    #[must_use]
    pub fn new(client: Arc<dyn RemoteCartClient>) -> Self {
        Self { client }
    }
}

impl fmt::Debug for RemoteBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteBackend").finish_non_exhaustive()
    }
}

#[async_trait]
impl CartBackend for RemoteBackend {
    fn mode(&self) -> CartMode {
        CartMode::Remote
    }

    async fn load(&self) -> Result<Cart, CartError> {
        Ok(self.client.get_cart().await?)
    }

    async fn persist(&self, cart: &Cart) -> Result<(), CartError> {
        Ok(self.client.add_items(&cart.lines()).await?)
    }

    async fn remove(&self, slug: &str) -> Result<(), CartError> {
        Ok(self.client.remove_item(slug).await?)
    }

    async fn clear(&self) -> Result<(), CartError> {
        Ok(self.client.clear_cart().await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cardfactory_core::{BarId, NewCartItem, Price, Quantity};

    use super::*;
    use crate::store::{KeyValueStore, MemoryStore};

    const KEY: &str = "cart";

    fn local_backend(store: &MemoryStore) -> LocalBackend {
        LocalBackend::new(LocalCartStore::new(Arc::new(store.clone()), KEY))
    }

    fn item(slug: &str) -> NewCartItem {
        NewCartItem {
            slug: slug.to_string(),
            bar_id: BarId::new(1),
            name: slug.to_string(),
            description: String::new(),
            price: Price::ZERO,
            assets: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_local_remove_unknown_slug_leaves_slot_untouched() {
        let store = MemoryStore::new();
        let backend = local_backend(&store);

        backend.remove("missing").await.unwrap();

        assert!(!store.contains(KEY).await);
    }

    #[tokio::test]
    async fn test_local_remove_rewrites_cart() {
        let store = MemoryStore::new();
        let backend = local_backend(&store);

        let mut cart = Cart::new();
        cart.upsert(item("a"), Quantity::ONE);
        cart.upsert(item("b"), Quantity::ONE);
        backend.persist(&cart).await.unwrap();

        backend.remove("a").await.unwrap();

        let stored = store.get(KEY).await.unwrap().unwrap();
        let reloaded: Cart = serde_json::from_str(&stored).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.get("b").is_some());
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(CartMode::Local.to_string(), "local");
        assert_eq!(CartMode::Remote.to_string(), "remote");
    }
}
