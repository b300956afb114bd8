//! The cart state manager.
//!
//! Every operation reads the auth signal once, picks the matching backend,
//! and runs entirely against it. Nothing is cached between calls: a local
//! read re-parses storage and a remote read re-fetches.

use std::sync::Arc;

use cardfactory_core::{Cart, NewCartItem, Quantity};
use tokio::sync::broadcast;
use tracing::{debug, instrument};

use crate::auth::AuthSignal;
use crate::backend::{CartBackend, CartMode, LocalBackend, RemoteBackend};
use crate::config::StorageConfig;
use crate::events::{CartChanged, CartEvents, CartFault, CartOperation};
use crate::remote::RemoteCartClient;
use crate::store::{KeyValueStore, LocalCartStore};
use crate::sync::{SyncCoordinator, SyncOutcome};

/// Dual-mode shopping cart.
///
/// Cheaply cloneable via `Arc`; clones share the sync latch and the event
/// channels.
#[derive(Clone)]
pub struct CartService {
    inner: Arc<CartServiceInner>,
}

struct CartServiceInner {
    local: LocalBackend,
    remote: RemoteBackend,
    local_store: LocalCartStore,
    remote_client: Arc<dyn RemoteCartClient>,
    auth: Arc<dyn AuthSignal>,
    events: CartEvents,
    sync: SyncCoordinator,
}

impl CartService {
    /// Create a cart over the given store, remote client and auth signal.
    ///
    /// # Arguments
    ///
    /// * `store` - Key-value store for the anonymous cart
    /// * `remote` - Server cart API for signed-in users
    /// * `auth` - Authentication signal, read at the start of every call
    /// * `storage` - Storage key and event buffer size
    #[must_use]
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        remote: Arc<dyn RemoteCartClient>,
        auth: Arc<dyn AuthSignal>,
        storage: &StorageConfig,
    ) -> Self {
        let local_store = LocalCartStore::new(store, storage.key.clone());

        Self {
            inner: Arc::new(CartServiceInner {
                local: LocalBackend::new(local_store.clone()),
                remote: RemoteBackend::new(Arc::clone(&remote)),
                local_store,
                remote_client: remote,
                auth,
                events: CartEvents::new(storage.event_capacity),
                sync: SyncCoordinator::new(),
            }),
        }
    }

    /// Which store the next operation will use.
    #[must_use]
    pub fn mode(&self) -> CartMode {
        self.backend().mode()
    }

    /// Subscribe to change notifications.
    ///
    /// A notification means "re-read with [`list_items`](Self::list_items)".
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CartChanged> {
        self.inner.events.subscribe()
    }

    /// Subscribe to failures the cart swallowed.
    #[must_use]
    pub fn subscribe_faults(&self) -> broadcast::Receiver<CartFault> {
        self.inner.events.subscribe_faults()
    }

    fn backend(&self) -> &dyn CartBackend {
        if self.inner.auth.is_authenticated() {
            &self.inner.remote
        } else {
            &self.inner.local
        }
    }

    /// Load through `backend`, degrading to an empty cart on failure.
    async fn load(&self, backend: &dyn CartBackend, operation: CartOperation) -> Cart {
        match backend.load().await {
            Ok(cart) => cart,
            Err(e) => {
                self.inner.events.report(operation, e);
                Cart::new()
            }
        }
    }

    /// Current cart contents.
    ///
    /// A remote failure yields an empty cart rather than an error.
    #[instrument(skip(self))]
    pub async fn list_items(&self) -> Cart {
        let backend = self.backend();
        let cart = self.load(backend, CartOperation::ListItems).await;
        debug!(mode = %backend.mode(), lines = cart.len(), "Listed cart");
        cart
    }

    /// Set the quantity for a product, adding it if absent.
    ///
    /// Re-adding a product replaces its quantity; it does not add to it.
    /// A missing, zero or negative `quantity` becomes 1 and anything above
    /// `u32::MAX` is capped there. The whole cart is then saved (locally, or
    /// as a bulk upsert on the server) and a change notification fires even
    /// if saving failed.
    ///
    /// Returns the quantity that was applied.
    #[instrument(skip(self, item), fields(slug = %item.slug))]
    pub async fn add_item(&self, item: NewCartItem, quantity: Option<i64>) -> Quantity {
        let backend = self.backend();
        let mut cart = self.load(backend, CartOperation::AddItem).await;

        let applied = cart.upsert(item, Quantity::normalize(quantity));

        if let Err(e) = backend.persist(&cart).await {
            self.inner.events.report(CartOperation::AddItem, e);
        }

        debug!(mode = %backend.mode(), quantity = %applied, "Added item to cart");
        self.inner.events.notify_changed();
        applied
    }

    /// Remove every line with `slug`.
    ///
    /// Unknown slugs are a no-op. A change notification always fires.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, slug: &str) {
        let backend = self.backend();
        if let Err(e) = backend.remove(slug).await {
            self.inner.events.report(CartOperation::RemoveItem, e);
        }

        debug!(mode = %backend.mode(), "Removed item from cart");
        self.inner.events.notify_changed();
    }

    /// Empty the cart. A change notification always fires.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) {
        let backend = self.backend();
        if let Err(e) = backend.clear().await {
            self.inner.events.report(CartOperation::ClearCart, e);
        }

        debug!(mode = %backend.mode(), "Cleared cart");
        self.inner.events.notify_changed();
    }

    /// Move the anonymous cart to the server once the user is signed in.
    ///
    /// Safe to call from several places: while one sync runs, others return
    /// [`SyncOutcome::AlreadySyncing`] without touching either store.
    #[instrument(skip(self))]
    pub async fn sync_if_needed(&self) -> SyncOutcome {
        if !self.inner.auth.is_authenticated() {
            return SyncOutcome::NotAuthenticated;
        }

        self.inner
            .sync
            .run(
                &self.inner.local_store,
                self.inner.remote_client.as_ref(),
                &self.inner.events,
            )
            .await
    }
}

impl std::fmt::Debug for CartService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartService")
            .field("key", &self.inner.local_store.key())
            .field("mode", &self.mode())
            .field("syncing", &self.inner.sync.is_syncing())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use cardfactory_core::{BarId, CartLineInput, Price};
    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;
    use crate::auth::SessionAuth;
    use crate::remote::RemoteError;
    use crate::store::MemoryStore;

    /// Remote that keeps a cart in memory and can be told to fail.
    #[derive(Default)]
    struct StubRemote {
        cart: Mutex<Cart>,
        fail: Mutex<bool>,
        pushes: Mutex<Vec<Vec<CartLineInput>>>,
    }

    impl StubRemote {
        fn set_failing(&self, fail: bool) {
            *self.fail.lock().unwrap() = fail;
        }

        fn check(&self) -> Result<(), RemoteError> {
            if *self.fail.lock().unwrap() {
                Err(RemoteError::Api {
                    status: 503,
                    message: "unavailable".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl RemoteCartClient for StubRemote {
        async fn get_cart(&self) -> Result<Cart, RemoteError> {
            self.check()?;
            Ok(self.cart.lock().unwrap().clone())
        }

        async fn add_items(&self, lines: &[CartLineInput]) -> Result<(), RemoteError> {
            self.check()?;
            self.pushes.lock().unwrap().push(lines.to_vec());
            let mut cart = self.cart.lock().unwrap();
            for line in lines {
                cart.upsert(
                    NewCartItem {
                        slug: line.slug.clone(),
                        bar_id: BarId::default(),
                        name: String::new(),
                        description: String::new(),
                        price: Price::ZERO,
                        assets: Vec::new(),
                    },
                    line.quantity,
                );
            }
            Ok(())
        }

        async fn remove_item(&self, slug: &str) -> Result<(), RemoteError> {
            self.check()?;
            self.cart.lock().unwrap().remove(slug);
            Ok(())
        }

        async fn clear_cart(&self) -> Result<(), RemoteError> {
            self.check()?;
            *self.cart.lock().unwrap() = Cart::new();
            Ok(())
        }
    }

    struct Harness {
        service: CartService,
        store: MemoryStore,
        remote: Arc<StubRemote>,
        auth: SessionAuth,
    }

    fn harness() -> Harness {
        let store = MemoryStore::new();
        let remote = Arc::new(StubRemote::default());
        let auth = SessionAuth::new();
        let service = CartService::new(
            Arc::new(store.clone()),
            remote.clone(),
            Arc::new(auth.clone()),
            &StorageConfig::default(),
        );
        Harness {
            service,
            store,
            remote,
            auth,
        }
    }

    fn product(slug: &str) -> NewCartItem {
        NewCartItem {
            slug: slug.to_string(),
            bar_id: BarId::new(2),
            name: format!("{slug} card"),
            description: String::new(),
            price: Price::from_cents(300).unwrap(),
            assets: Vec::new(),
        }
    }

    #[test]
    fn test_mode_follows_auth_signal() {
        let h = harness();
        assert_eq!(h.service.mode(), CartMode::Local);

        h.auth.log_in();
        assert_eq!(h.service.mode(), CartMode::Remote);
    }

    #[tokio::test]
    async fn test_add_item_local_overwrites_quantity() {
        let h = harness();

        assert_eq!(h.service.add_item(product("a"), Some(4)).await.get(), 4);
        assert_eq!(h.service.add_item(product("a"), Some(2)).await.get(), 2);

        let cart = h.service.list_items().await;
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get("a").unwrap().quantity.get(), 2);
    }

    #[tokio::test]
    async fn test_add_item_normalizes_quantity() {
        let h = harness();

        assert_eq!(h.service.add_item(product("a"), Some(0)).await, Quantity::ONE);
        assert_eq!(h.service.add_item(product("b"), Some(-5)).await, Quantity::ONE);
        assert_eq!(h.service.add_item(product("c"), None).await, Quantity::ONE);
    }

    #[tokio::test]
    async fn test_add_item_reports_capped_quantity() {
        let h = harness();

        let applied = h.service.add_item(product("bulk"), Some(i64::MAX)).await;

        assert_eq!(applied, Quantity::MAX);
        let cart = h.service.list_items().await;
        assert_eq!(cart.get("bulk").unwrap().quantity, Quantity::MAX);
    }

    #[tokio::test]
    async fn test_add_item_remote_pushes_whole_cart() {
        let h = harness();
        h.auth.log_in();

        h.service.add_item(product("a"), Some(1)).await;
        h.service.add_item(product("b"), Some(3)).await;

        let pushes = h.remote.pushes.lock().unwrap().clone();
        assert_eq!(pushes.len(), 2);
        let slugs: Vec<_> = pushes[1].iter().map(|l| l.slug.as_str()).collect();
        assert_eq!(slugs, ["a", "b"]);
        assert!(!h.store.contains("cardfactory_cart").await);
    }

    #[tokio::test]
    async fn test_remote_list_failure_returns_empty_and_reports_fault() {
        let h = harness();
        h.auth.log_in();
        h.service.add_item(product("a"), Some(1)).await;
        h.remote.set_failing(true);
        let mut faults = h.service.subscribe_faults();

        assert!(h.service.list_items().await.is_empty());

        let fault = faults.try_recv().unwrap();
        assert_eq!(fault.operation, CartOperation::ListItems);
    }

    #[tokio::test]
    async fn test_remote_failures_still_notify() {
        let h = harness();
        h.auth.log_in();
        h.remote.set_failing(true);
        let mut changes = h.service.subscribe();
        let mut faults = h.service.subscribe_faults();

        h.service.remove_item("a").await;
        h.service.clear_cart().await;

        assert!(changes.try_recv().is_ok());
        assert!(changes.try_recv().is_ok());
        assert_eq!(
            faults.try_recv().unwrap().operation,
            CartOperation::RemoveItem
        );
        assert_eq!(
            faults.try_recv().unwrap().operation,
            CartOperation::ClearCart
        );
    }

    #[tokio::test]
    async fn test_remove_unknown_slug_notifies_without_fault() {
        let h = harness();
        let mut changes = h.service.subscribe();
        let mut faults = h.service.subscribe_faults();

        h.service.remove_item("missing").await;

        assert_eq!(changes.try_recv().unwrap(), CartChanged);
        assert!(matches!(faults.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_clear_cart_local_deletes_slot() {
        let h = harness();
        h.service.add_item(product("a"), None).await;
        assert!(h.store.contains("cardfactory_cart").await);

        h.service.clear_cart().await;

        assert!(!h.store.contains("cardfactory_cart").await);
        assert!(h.service.list_items().await.is_empty());
    }

    #[tokio::test]
    async fn test_sync_requires_authentication() {
        let h = harness();
        h.service.add_item(product("a"), None).await;

        assert_eq!(h.service.sync_if_needed().await, SyncOutcome::NotAuthenticated);
        assert!(h.store.contains("cardfactory_cart").await);
    }
}
