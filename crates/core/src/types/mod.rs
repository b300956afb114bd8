//! Core types for Card Factory carts.
//!
//! This module provides type-safe wrappers for the cart domain.

pub mod cart;
pub mod id;
pub mod item;
pub mod price;
pub mod product;
pub mod quantity;

pub use cart::Cart;
pub use id::BarId;
pub use item::{CartItem, CartLineInput, DigitalAsset, NewCartItem};
pub use price::{Price, PriceError};
pub use product::{ProductDetails, ProductSummary};
pub use quantity::Quantity;
