//! Catalog product shapes that can be added to a cart.
//!
//! The catalog exposes two views of a product: the full detail page reply,
//! which carries an asset gallery, and the listing summary, which carries at
//! most one asset. Both convert into [`NewCartItem`].

use serde::{Deserialize, Serialize};

use super::{BarId, DigitalAsset, NewCartItem, Price};

/// Full product details as shown on a product page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
    pub slug: String,
    pub bar_id: BarId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    /// Asset gallery; absent when the product has no images.
    #[serde(default)]
    pub assets: Option<Vec<DigitalAsset>>,
}

/// Product summary as shown in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub slug: String,
    pub bar_id: BarId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub asset: Option<DigitalAsset>,
}

impl From<ProductDetails> for NewCartItem {
    fn from(product: ProductDetails) -> Self {
        Self {
            slug: product.slug,
            bar_id: product.bar_id,
            name: product.name,
            description: product.description,
            price: product.price,
            assets: product.assets.unwrap_or_default(),
        }
    }
}

impl From<ProductSummary> for NewCartItem {
    fn from(product: ProductSummary) -> Self {
        Self {
            slug: product.slug,
            bar_id: product.bar_id,
            name: product.name,
            description: product.description,
            price: product.price,
            assets: product.asset.into_iter().collect(),
        }
    }
}
