//! The "is the user signed in" signal.
//!
//! Token issuance and validation happen upstream; the cart only needs a
//! boolean it can read at the start of each operation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Source of the current authentication state.
pub trait AuthSignal: Send + Sync {
    /// Whether the user is authenticated right now.
    fn is_authenticated(&self) -> bool;
}

/// A shared, settable authentication flag.
///
/// Clones observe the same flag: the login flow keeps one clone and flips it,
/// the cart reads another.
#[derive(Debug, Clone, Default)]
pub struct SessionAuth {
    flag: Arc<AtomicBool>,
}

impl SessionAuth {
    /// Create a signal starting in the anonymous state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a signal starting in the given state.
    #[must_use]
    pub fn with_state(authenticated: bool) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(authenticated)),
        }
    }

    /// Mark the user as signed in.
    pub fn log_in(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Mark the user as signed out.
    pub fn log_out(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl AuthSignal for SessionAuth {
    fn is_authenticated(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_anonymous() {
        assert!(!SessionAuth::new().is_authenticated());
        assert!(SessionAuth::with_state(true).is_authenticated());
    }

    #[test]
    fn test_clones_share_state() {
        let auth = SessionAuth::new();
        let observer = auth.clone();

        auth.log_in();
        assert!(observer.is_authenticated());

        auth.log_out();
        assert!(!observer.is_authenticated());
    }
}
