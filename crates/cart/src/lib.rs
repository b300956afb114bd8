//! Card Factory cart library.
//!
//! A shopping cart that works the same way for anonymous visitors and
//! signed-in users:
//!
//! - Anonymous: the cart lives in a local key-value slot ([`store`]).
//! - Signed in: the cart lives on the server ([`remote`]).
//! - On login, [`CartService::sync_if_needed`] pushes the local cart to the
//!   server once and clears the local slot.
//!
//! No cart operation returns an error. Failures are logged and published on
//! the fault channel ([`events`]) so the UI can decide whether to surface
//! them.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! let auth = SessionAuth::new();
//! let cart = CartService::new(
//!     Arc::new(FileStore::new(&config.storage.dir)),
//!     Arc::new(HttpCartClient::new(config.require_remote()?)?),
//!     Arc::new(auth.clone()),
//!     &config.storage,
//! );
//!
//! let mut changes = cart.subscribe();
//! cart.add_item(product.into(), Some(2)).await;
//!
//! auth.log_in();
//! cart.sync_if_needed().await;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod events;
pub mod remote;
pub mod service;
pub mod store;
pub mod sync;

pub use auth::{AuthSignal, SessionAuth};
pub use backend::CartMode;
pub use config::{CartConfig, ConfigError, RemoteCartConfig, StorageConfig};
pub use error::CartError;
pub use events::{CartChanged, CartEvents, CartFault, CartOperation};
pub use remote::{HttpCartClient, RemoteCartClient, RemoteError};
pub use service::CartService;
pub use store::{FileStore, KeyValueStore, LocalCartStore, MemoryStore, StoreError};
pub use sync::{SyncCoordinator, SyncOutcome};
