//! One-shot migration of the anonymous cart to the server after login.
//!
//! Login happens outside the cart, so the collaborator that observes it calls
//! [`CartService::sync_if_needed`](crate::CartService::sync_if_needed). It may
//! do so from several handlers at once; the latch makes every call after the
//! first a no-op until the running sync finishes. Calls are dropped, not
//! queued.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, instrument};

use crate::events::{CartEvents, CartOperation};
use crate::remote::RemoteCartClient;
use crate::store::LocalCartStore;

/// Result of a sync attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// User is not signed in; nothing was attempted.
    NotAuthenticated,
    /// Another sync is in flight; this call did nothing.
    AlreadySyncing,
    /// Local cart was empty.
    NothingToSync,
    /// Local lines were pushed and the local slot removed.
    Synced {
        /// Number of lines pushed.
        lines: usize,
    },
    /// Push failed; the local cart is untouched and a later call can retry.
    Failed,
}

/// Idle/Syncing latch plus the migration procedure.
#[derive(Debug, Default)]
pub struct SyncCoordinator {
    syncing: AtomicBool,
}

/// Returns the latch to idle when dropped, including on cancellation.
struct SyncGuard<'a> {
    syncing: &'a AtomicBool,
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.syncing.store(false, Ordering::Release);
    }
}

impl SyncCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a sync is in flight.
    #[must_use]
    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Acquire)
    }

    fn try_enter(&self) -> Option<SyncGuard<'_>> {
        self.syncing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SyncGuard {
                syncing: &self.syncing,
            })
    }

    /// Push the local cart to `remote` and clear it on success.
    ///
    /// The caller has already checked that the user is signed in. Local
    /// lines are deleted only after the push succeeds. Failures are reported
    /// on `events` and never returned.
    #[instrument(skip_all, fields(key = %local.key()))]
    pub async fn run(
        &self,
        local: &LocalCartStore,
        remote: &dyn RemoteCartClient,
        events: &CartEvents,
    ) -> SyncOutcome {
        let Some(_guard) = self.try_enter() else {
            debug!("Sync already in flight, skipping");
            return SyncOutcome::AlreadySyncing;
        };

        let cart = local.read().await;
        if cart.is_empty() {
            debug!("Local cart empty, nothing to sync");
            return SyncOutcome::NothingToSync;
        }

        let lines = cart.lines();
        if let Err(e) = remote.add_items(&lines).await {
            events.report(CartOperation::Sync, e);
            return SyncOutcome::Failed;
        }

        // Lines are on the server now. If the delete fails a later sync
        // re-pushes the same quantities, which the upsert absorbs.
        if let Err(e) = local.clear().await {
            events.report(CartOperation::Sync, e);
        }

        info!(lines = lines.len(), "Synced local cart to server");
        events.notify_changed();
        SyncOutcome::Synced { lines: lines.len() }
    }
}
