//! The cart: an ordered set of lines keyed by slug.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::{CartItem, CartLineInput, NewCartItem, Quantity};

/// An ordered sequence of cart lines, unique by slug.
///
/// Adding a slug that is already present overwrites that line's quantity
/// in place; it never creates a second line and never adds to the existing
/// quantity.
///
/// Serialized as a plain JSON array of [`CartItem`]. Deserializing a payload
/// with repeated slugs collapses them the same way [`Cart::upsert`] would.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Set the quantity for `item.slug`, appending a new line if absent.
    ///
    /// Returns the quantity that was applied.
    pub fn upsert(&mut self, item: NewCartItem, quantity: Quantity) -> Quantity {
        if let Some(existing) = self.items.iter_mut().find(|line| line.slug == item.slug) {
            existing.quantity = quantity;
        } else {
            self.items.push(CartItem::from_new(item, quantity));
        }
        quantity
    }

    /// Remove every line with the given slug.
    ///
    /// Returns `true` if anything was removed.
    pub fn remove(&mut self, slug: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|line| line.slug != slug);
        self.items.len() != before
    }

    /// Look up a line by slug.
    #[must_use]
    pub fn get(&self, slug: &str) -> Option<&CartItem> {
        self.items.iter().find(|line| line.slug == slug)
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Iterate over lines in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, CartItem> {
        self.items.iter()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Slug/quantity pairs for every line, for a remote bulk upsert.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLineInput> {
        self.items.iter().map(CartItem::line).collect()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items
            .iter()
            .map(|line| u64::from(line.quantity.get()))
            .sum()
    }

    /// Sum of unit price times quantity across all lines.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items
            .iter()
            .map(|line| line.price.amount() * Decimal::from(line.quantity.get()))
            .sum()
    }
}

impl FromIterator<CartItem> for Cart {
    fn from_iter<I: IntoIterator<Item = CartItem>>(iter: I) -> Self {
        let mut items: Vec<CartItem> = Vec::new();
        for item in iter {
            if let Some(existing) = items.iter_mut().find(|line| line.slug == item.slug) {
                existing.quantity = item.quantity;
            } else {
                items.push(item);
            }
        }
        Self { items }
    }
}

impl From<Vec<CartItem>> for Cart {
    fn from(items: Vec<CartItem>) -> Self {
        items.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartItem;
    type IntoIter = std::slice::Iter<'a, CartItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl IntoIterator for Cart {
    type Item = CartItem;
    type IntoIter = std::vec::IntoIter<CartItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'de> Deserialize<'de> for Cart {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<CartItem>::deserialize(deserializer).map(Self::from)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{BarId, DigitalAsset, Price};

    fn new_item(slug: &str, cents: i64) -> NewCartItem {
        NewCartItem {
            slug: slug.to_string(),
            bar_id: BarId::new(1),
            name: slug.to_uppercase(),
            description: String::new(),
            price: Price::from_cents(cents).unwrap(),
            assets: vec![DigitalAsset::new(format!("https://cdn.example.com/{slug}.png"))],
        }
    }

    #[test]
    fn test_upsert_appends_new_slug() {
        let mut cart = Cart::new();
        cart.upsert(new_item("a", 100), Quantity::from(1));
        cart.upsert(new_item("b", 100), Quantity::from(3));

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.items()[0].slug, "a");
        assert_eq!(cart.items()[1].slug, "b");
    }

    #[test]
    fn test_upsert_replaces_quantity_instead_of_incrementing() {
        let mut cart = Cart::new();
        cart.upsert(new_item("a", 100), Quantity::from(5));
        let applied = cart.upsert(new_item("a", 100), Quantity::from(2));

        assert_eq!(applied.get(), 2);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get("a").unwrap().quantity.get(), 2);
    }

    #[test]
    fn test_upsert_existing_keeps_position_and_snapshot() {
        let mut cart = Cart::new();
        cart.upsert(new_item("a", 100), Quantity::ONE);
        cart.upsert(new_item("b", 200), Quantity::ONE);
        cart.upsert(new_item("a", 999), Quantity::from(4));

        assert_eq!(cart.items()[0].slug, "a");
        // price is a snapshot from the first add
        assert_eq!(cart.items()[0].price, Price::from_cents(100).unwrap());
    }

    #[test]
    fn test_remove() {
        let mut cart = Cart::new();
        cart.upsert(new_item("a", 100), Quantity::ONE);

        assert!(!cart.remove("missing"));
        assert!(cart.remove("a"));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_item_count_and_subtotal() {
        let mut cart = Cart::new();
        cart.upsert(new_item("a", 250), Quantity::from(2));
        cart.upsert(new_item("b", 100), Quantity::from(3));

        assert_eq!(cart.item_count(), 5);
        assert_eq!(cart.subtotal(), Decimal::new(800, 2));
    }

    #[test]
    fn test_lines() {
        let mut cart = Cart::new();
        cart.upsert(new_item("a", 100), Quantity::from(1));
        cart.upsert(new_item("b", 100), Quantity::from(3));

        let lines = cart.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].slug, "b");
        assert_eq!(lines[1].quantity.get(), 3);
    }

    #[test]
    fn test_serde_roundtrip_preserves_order() {
        let mut cart = Cart::new();
        for (i, slug) in ["c", "a", "b"].into_iter().enumerate() {
            cart.upsert(new_item(slug, 100), Quantity::from(i64::try_from(i).unwrap() + 1));
        }

        let json = serde_json::to_string(&cart).unwrap();
        assert!(json.starts_with('['));

        let parsed: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, cart);
    }

    #[test]
    fn test_deserialize_collapses_duplicate_slugs() {
        let json = r#"[
            {"slug":"a","quantity":1},
            {"slug":"b","quantity":2},
            {"slug":"a","quantity":7}
        ]"#;
        let cart: Cart = serde_json::from_str(json).unwrap();

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.items()[0].slug, "a");
        assert_eq!(cart.get("a").unwrap().quantity.get(), 7);
    }

    #[test]
    fn test_deserialize_rejects_object() {
        let result: Result<Cart, _> = serde_json::from_str(r#"{"slug":"a"}"#);
        assert!(result.is_err());
    }
}
