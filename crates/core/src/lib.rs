//! Card Factory Core - Shared cart types library.
//!
//! This crate provides the types shared by every Card Factory cart component:
//! - `cart` - Dual-mode cart state manager (local storage and remote API)
//! - `cli` - Command-line driver for inspecting and syncing carts
//!
//! # Architecture
//!
//! The core crate contains only types and pure cart logic - no I/O, no
//! storage access, no HTTP clients. This keeps it lightweight and allows it
//! to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Cart lines, quantities, prices, and catalog conversions

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
