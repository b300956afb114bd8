//! Cart line types.

use serde::{Deserialize, Serialize};

use super::{BarId, Price, Quantity};

// =============================================================================
// Stored Types
// =============================================================================

/// A digital asset (usually an image) attached to a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigitalAsset {
    /// Asset URL.
    pub url: String,
    /// Alt text for accessibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

impl DigitalAsset {
    /// Create an asset reference without alt text.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            alt_text: None,
        }
    }
}

/// A line in the cart.
///
/// `slug` is the identity of the line; every other field is a display
/// snapshot taken when the product was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product slug, unique within a cart.
    pub slug: String,
    /// Number of units, never below 1.
    #[serde(default)]
    pub quantity: Quantity,
    /// Product name.
    #[serde(default)]
    pub name: String,
    /// Product description.
    #[serde(default)]
    pub description: String,
    /// Unit price at the time the line was added.
    #[serde(default)]
    pub price: Price,
    /// Originating catalog bar.
    #[serde(default)]
    pub bar_id: BarId,
    /// Product images, in display order.
    #[serde(default)]
    pub assets: Vec<DigitalAsset>,
}

impl CartItem {
    /// Build a line from add-time product data.
    #[must_use]
    pub fn from_new(item: NewCartItem, quantity: Quantity) -> Self {
        Self {
            slug: item.slug,
            quantity,
            name: item.name,
            description: item.description,
            price: item.price,
            bar_id: item.bar_id,
            assets: item.assets,
        }
    }

    /// The slug/quantity pair sent to the remote cart.
    #[must_use]
    pub fn line(&self) -> CartLineInput {
        CartLineInput {
            slug: self.slug.clone(),
            quantity: self.quantity,
        }
    }
}

// =============================================================================
// Input Types
// =============================================================================

/// Input for a remote bulk upsert: set `slug` to `quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInput {
    /// Product slug.
    pub slug: String,
    /// Quantity to set.
    pub quantity: Quantity,
}

/// Product data supplied when adding a line to the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCartItem {
    /// Product slug.
    pub slug: String,
    /// Originating catalog bar.
    pub bar_id: BarId,
    /// Product name.
    pub name: String,
    /// Product description.
    pub description: String,
    /// Unit price.
    pub price: Price,
    /// Product images, in display order.
    pub assets: Vec<DigitalAsset>,
}
