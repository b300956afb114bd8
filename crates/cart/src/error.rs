//! Errors swallowed by the cart and reported on the fault channel.
//!
//! No public cart operation returns these. They travel inside
//! [`CartFault`](crate::events::CartFault) so the UI can choose to surface
//! them.

use thiserror::Error;

use crate::remote::RemoteError;
use crate::store::StoreError;

/// A failure inside a cart operation.
#[derive(Debug, Error)]
pub enum CartError {
    /// Remote cart API call failed.
    #[error("Remote cart error: {0}")]
    Remote(#[from] RemoteError),

    /// Local storage write or delete failed.
    #[error("Local storage error: {0}")]
    Store(#[from] StoreError),
}

impl CartError {
    /// Whether the failure means the user must sign in again.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Remote(RemoteError::Unauthorized(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_error_display() {
        let err = CartError::from(RemoteError::RateLimited(5));
        assert_eq!(
            err.to_string(),
            "Remote cart error: Rate limited, retry after 5 seconds"
        );

        let err = CartError::from(StoreError::InvalidKey("a/b".to_string()));
        assert_eq!(
            err.to_string(),
            "Local storage error: Invalid storage key: a/b"
        );
    }

    #[test]
    fn test_is_unauthorized() {
        assert!(CartError::from(RemoteError::Unauthorized(String::new())).is_unauthorized());
        assert!(!CartError::from(RemoteError::RateLimited(1)).is_unauthorized());
    }
}
