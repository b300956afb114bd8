//! Integration test support for the Card Factory cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cardfactory-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_modes` - Anonymous and signed-in cart behavior
//! - `cart_sync` - Migrating the anonymous cart on login
//! - `file_store` - The cart over the file-backed store
//!
//! The remote API is replaced by [`FakeRemote`], an in-memory server cart
//! that records every call, can be switched into a failing state, and can
//! hold a bulk upsert in flight so tests can race a second sync against it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use cardfactory_cart::{
    CartService, MemoryStore, RemoteCartClient, RemoteError, SessionAuth, StorageConfig,
};
use cardfactory_core::{BarId, Cart, CartLineInput, DigitalAsset, NewCartItem, Price};
use tokio::sync::{Notify, Semaphore};

/// A call received by [`FakeRemote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    GetCart,
    AddItems(Vec<CartLineInput>),
    RemoveItem(String),
    ClearCart,
}

/// Holds `add_items` until the test releases it.
#[derive(Debug)]
struct Gate {
    entered: Notify,
    release: Semaphore,
}

impl Gate {
    fn new() -> Self {
        Self {
            entered: Notify::new(),
            release: Semaphore::new(0),
        }
    }
}

/// In-memory stand-in for the remote cart API.
#[derive(Debug, Default)]
pub struct FakeRemote {
    cart: Mutex<Cart>,
    calls: Mutex<Vec<RemoteCall>>,
    failing: AtomicBool,
    gate: Option<Gate>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FakeRemote {
    /// A remote that answers immediately.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A remote whose `add_items` waits for [`release`](Self::release).
    #[must_use]
    pub fn gated() -> Arc<Self> {
        Arc::new(Self {
            gate: Some(Gate::new()),
            ..Self::default()
        })
    }

    /// Make every call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every call received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RemoteCall> {
        lock(&self.calls).clone()
    }

    /// Payloads of every `add_items` call.
    #[must_use]
    pub fn pushes(&self) -> Vec<Vec<CartLineInput>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RemoteCall::AddItems(lines) => Some(lines),
                _ => None,
            })
            .collect()
    }

    /// The server-side cart.
    #[must_use]
    pub fn cart(&self) -> Cart {
        lock(&self.cart).clone()
    }

    /// Wait until a gated `add_items` call is in flight.
    pub async fn wait_until_pushing(&self) {
        if let Some(gate) = &self.gate {
            gate.entered.notified().await;
        }
    }

    /// Let one gated `add_items` call finish.
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.release.add_permits(1);
        }
    }

    fn record(&self, call: RemoteCall) -> Result<(), RemoteError> {
        lock(&self.calls).push(call);
        if self.failing.load(Ordering::SeqCst) {
            return Err(RemoteError::Api {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteCartClient for FakeRemote {
    async fn get_cart(&self) -> Result<Cart, RemoteError> {
        self.record(RemoteCall::GetCart)?;
        Ok(self.cart())
    }

    async fn add_items(&self, lines: &[CartLineInput]) -> Result<(), RemoteError> {
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            if let Ok(permit) = gate.release.acquire().await {
                permit.forget();
            }
        }

        self.record(RemoteCall::AddItems(lines.to_vec()))?;
        let mut cart = lock(&self.cart);
        for line in lines {
            cart.upsert(product(&line.slug, 0), line.quantity);
        }
        Ok(())
    }

    async fn remove_item(&self, slug: &str) -> Result<(), RemoteError> {
        self.record(RemoteCall::RemoveItem(slug.to_string()))?;
        lock(&self.cart).remove(slug);
        Ok(())
    }

    async fn clear_cart(&self) -> Result<(), RemoteError> {
        self.record(RemoteCall::ClearCart)?;
        *lock(&self.cart) = Cart::new();
        Ok(())
    }
}

/// A cart wired to in-memory collaborators, with handles to each.
pub struct TestCart {
    pub service: CartService,
    pub store: MemoryStore,
    pub remote: Arc<FakeRemote>,
    pub auth: SessionAuth,
}

impl TestCart {
    /// Anonymous cart over a fresh store and an immediate remote.
    #[must_use]
    pub fn new() -> Self {
        Self::with_remote(FakeRemote::new())
    }

    /// Anonymous cart over a fresh store and the given remote.
    #[must_use]
    pub fn with_remote(remote: Arc<FakeRemote>) -> Self {
        let store = MemoryStore::new();
        let auth = SessionAuth::new();
        let service = CartService::new(
            Arc::new(store.clone()),
            remote.clone(),
            Arc::new(auth.clone()),
            &StorageConfig::default(),
        );
        Self {
            service,
            store,
            remote,
            auth,
        }
    }

    /// Whether the anonymous cart slot exists.
    pub async fn has_local_cart(&self) -> bool {
        self.store.contains(&StorageConfig::default().key).await
    }
}

impl Default for TestCart {
    fn default() -> Self {
        Self::new()
    }
}

/// A product with a deterministic name, price and one asset.
#[must_use]
pub fn product(slug: &str, cents: i64) -> NewCartItem {
    NewCartItem {
        slug: slug.to_string(),
        bar_id: BarId::new(100),
        name: format!("{slug} card"),
        description: format!("The {slug} card"),
        price: Price::from_cents(cents).unwrap_or(Price::ZERO),
        assets: vec![DigitalAsset::new(format!(
            "https://cdn.cardfactory.test/{slug}.png"
        ))],
    }
}
