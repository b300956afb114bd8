//! Server-side cart for signed-in users.
//!
//! The server is the source of truth for an authenticated cart; nothing here
//! caches its responses.

mod http;

pub use http::HttpCartClient;

use async_trait::async_trait;
use cardfactory_core::{Cart, CartLineInput};
use thiserror::Error;

/// Errors that can occur when interacting with the remote cart API.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The session is not (or no longer) authorized.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// No remote API is configured for this process.
    #[error("Remote cart API not configured: {0}")]
    NotConfigured(String),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Operations the cart needs from the server.
#[async_trait]
pub trait RemoteCartClient: Send + Sync {
    /// Fetch the signed-in user's cart.
    async fn get_cart(&self) -> Result<Cart, RemoteError>;

    /// Set each slug to the given quantity (bulk upsert, not a delta).
    async fn add_items(&self, lines: &[CartLineInput]) -> Result<(), RemoteError>;

    /// Remove the line with `slug`.
    async fn remove_item(&self, slug: &str) -> Result<(), RemoteError>;

    /// Remove every line.
    async fn clear_cart(&self) -> Result<(), RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_display() {
        let err = RemoteError::Api {
            status: 502,
            message: "bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 502 - bad gateway");
    }

    #[test]
    fn test_rate_limited_error() {
        let err = RemoteError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }
}
