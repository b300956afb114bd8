//! Change notifications and the fault channel.
//!
//! Both channels are `tokio::sync::broadcast`. A subscriber is a receiver:
//! dropping it unsubscribes, and `try_recv` lets tests drain it without a
//! running event loop.
//!
//! `CartChanged` carries no payload. It means "re-read the cart", not "here
//! is what changed". A subscriber that falls behind sees
//! `RecvError::Lagged`, which means the same thing.

use std::fmt;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::warn;

use crate::error::CartError;

/// Marker sent after every mutating cart operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartChanged;

/// The cart operation a fault came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartOperation {
    ListItems,
    AddItem,
    RemoveItem,
    ClearCart,
    Sync,
}

impl CartOperation {
    /// Stable snake-case name, used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ListItems => "list_items",
            Self::AddItem => "add_item",
            Self::RemoveItem => "remove_item",
            Self::ClearCart => "clear_cart",
            Self::Sync => "sync",
        }
    }
}

impl fmt::Display for CartOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure the cart swallowed.
#[derive(Debug, Clone)]
pub struct CartFault {
    /// Operation that was running.
    pub operation: CartOperation,
    /// What went wrong.
    pub error: Arc<CartError>,
}

/// Publisher side of both channels.
#[derive(Debug, Clone)]
pub struct CartEvents {
    changed: broadcast::Sender<CartChanged>,
    faults: broadcast::Sender<CartFault>,
}

impl CartEvents {
    /// Create the channels, buffering `capacity` messages per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (changed, _) = broadcast::channel(capacity);
        let (faults, _) = broadcast::channel(capacity);
        Self { changed, faults }
    }

    /// Subscribe to change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CartChanged> {
        self.changed.subscribe()
    }

    /// Subscribe to swallowed failures.
    #[must_use]
    pub fn subscribe_faults(&self) -> broadcast::Receiver<CartFault> {
        self.faults.subscribe()
    }

    /// Number of live change subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.changed.receiver_count()
    }

    /// Tell subscribers to re-read the cart.
    pub(crate) fn notify_changed(&self) {
        // No subscribers is fine.
        let _ = self.changed.send(CartChanged);
    }

    /// Log a swallowed failure and publish it on the fault channel.
    pub(crate) fn report(&self, operation: CartOperation, error: impl Into<CartError>) {
        let error = error.into();
        warn!(operation = %operation, error = %error, "Cart operation failed");
        let _ = self.faults.send(CartFault {
            operation,
            error: Arc::new(error),
        });
    }
}

impl Default for CartEvents {
    fn default() -> Self {
        Self::new(crate::config::StorageConfig::default().event_capacity)
    }
}
