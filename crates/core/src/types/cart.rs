//! Cart lines and snapshots.
//!
//! A [`CartSnapshot`] maps product IDs to [`CartLine`]s. Every mutating method
//! upholds the invariant that no line has a quantity below 1: setting a
//! quantity to zero removes the line instead.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// A product as it is added to the cart: a cart line without a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartProduct {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    /// Absolute image URL.
    pub image: String,
    pub slug: String,
}

impl CartProduct {
    /// Attach a quantity, producing a cart line.
    #[must_use]
    pub fn with_quantity(self, quantity: u32) -> CartLine {
        CartLine {
            id: self.id,
            name: self.name,
            price: self.price,
            image: self.image,
            slug: self.slug,
            quantity,
        }
    }
}

/// One product entry in the cart with its chosen quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub image: String,
    pub slug: String,
    pub quantity: u32,
}

impl CartLine {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// The full state of a cart at a point in time.
///
/// Serializes as a JSON object keyed by product ID:
///
/// ```json
/// {"1": {"id": 1, "name": "Café", "price": "10", "image": "…", "slug": "cafe", "quantity": 2}}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartSnapshot {
    lines: BTreeMap<ProductId, CartLine>,
}

impl CartSnapshot {
    /// Badge counts above this value are shown as `99+`.
    pub const BADGE_LIMIT: usize = 99;

    /// Create an empty snapshot.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lines: BTreeMap::new(),
        }
    }

    /// Get the line for a product.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartLine> {
        self.lines.get(&id)
    }

    /// Iterate over lines in product ID order.
    pub fn lines(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.values()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.lines.values().map(|line| u64::from(line.quantity)).sum()
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.lines.values().map(CartLine::line_total).sum()
    }

    /// Cart icon badge text: empty for an empty cart, `99+` past the limit.
    #[must_use]
    pub fn badge_label(&self) -> String {
        match self.len() {
            0 => String::new(),
            n if n > Self::BADGE_LIMIT => format!("{}+", Self::BADGE_LIMIT),
            n => n.to_string(),
        }
    }

    /// Add `quantity` units of a product, creating the line if needed.
    ///
    /// Returns `false` (and changes nothing) when `quantity` is zero.
    pub fn add(&mut self, product: CartProduct, quantity: u32) -> bool {
        if quantity == 0 {
            return false;
        }
        self.lines
            .entry(product.id)
            .and_modify(|line| line.quantity = line.quantity.saturating_add(quantity))
            .or_insert_with(|| product.with_quantity(quantity));
        true
    }

    /// Remove a line. Returns the removed line, if any.
    pub fn remove(&mut self, id: ProductId) -> Option<CartLine> {
        self.lines.remove(&id)
    }

    /// Overwrite a line's quantity; zero removes the line.
    ///
    /// Returns `false` when the product is not in the cart.
    pub fn set_quantity(&mut self, id: ProductId, quantity: u32) -> bool {
        if quantity == 0 {
            return self.lines.remove(&id).is_some();
        }
        match self.lines.get_mut(&id) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Drop lines that violate the quantity invariant or whose key disagrees
    /// with the line's own ID. Returns how many lines were dropped.
    ///
    /// Used after deserializing data that did not come from this type.
    pub fn normalize(&mut self) -> usize {
        let before = self.lines.len();
        self.lines
            .retain(|key, line| line.quantity >= 1 && *key == line.id);
        before - self.lines.len()
    }
}

impl FromIterator<CartLine> for CartSnapshot {
    fn from_iter<I: IntoIterator<Item = CartLine>>(iter: I) -> Self {
        Self {
            lines: iter
                .into_iter()
                .filter(|line| line.quantity >= 1)
                .map(|line| (line.id, line))
                .collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    use super::*;

    fn product(id: i64, price: i64) -> CartProduct {
        CartProduct {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Price::new(Decimal::from(price)).unwrap(),
            image: format!("https://cms.test/uploads/{id}.jpg"),
            slug: format!("product-{id}"),
        }
    }

    #[test]
    fn test_add_accumulates_quantity() {
        let mut cart = CartSnapshot::new();
        assert!(cart.add(product(1, 10), 2));
        assert!(cart.add(product(1, 10), 3));

        let line = cart.get(ProductId::new(1)).unwrap();
        assert_eq!(line.quantity, 5);
        assert_eq!(line.line_total().amount(), Decimal::from(50));
        assert_eq!(cart.total_price().amount(), Decimal::from(50));
    }

    #[test]
    fn test_add_zero_is_noop() {
        let mut cart = CartSnapshot::new();
        assert!(!cart.add(product(1, 10), 0));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_saturates() {
        let mut cart = CartSnapshot::new();
        cart.add(product(1, 1), u32::MAX);
        cart.add(product(1, 1), 10);
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, u32::MAX);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = CartSnapshot::new();
        cart.add(product(1, 10), 2);
        assert!(cart.set_quantity(ProductId::new(1), 0));
        assert!(cart.get(ProductId::new(1)).is_none());
    }

    #[test]
    fn test_set_quantity_unknown_is_noop() {
        let mut cart = CartSnapshot::new();
        assert!(!cart.set_quantity(ProductId::new(9), 4));
        assert!(!cart.set_quantity(ProductId::new(9), 0));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_totals() {
        let mut cart = CartSnapshot::new();
        cart.add(product(1, 10), 2);
        cart.add(product(2, 3), 4);
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.total_quantity(), 6);
        assert_eq!(cart.total_price().amount(), Decimal::from(32));
    }

    #[test]
    fn test_badge_label() {
        let mut cart = CartSnapshot::new();
        assert_eq!(cart.badge_label(), "");
        cart.add(product(1, 1), 7);
        assert_eq!(cart.badge_label(), "1");
        for id in 2..=100 {
            cart.add(product(id, 1), 1);
        }
        assert_eq!(cart.badge_label(), "99+");
    }

    #[test]
    fn test_serialized_shape_is_keyed_by_id() {
        let mut cart = CartSnapshot::new();
        cart.add(product(12, 5), 1);
        let value = serde_json::to_value(&cart).unwrap();
        assert_eq!(value["12"]["quantity"], 1);
        assert_eq!(value["12"]["slug"], "product-12");
    }

    #[test]
    fn test_normalize_drops_invalid_lines() {
        let json = r#"{
            "1": {"id": 1, "name": "a", "price": 1, "image": "", "slug": "a", "quantity": 0},
            "2": {"id": 3, "name": "b", "price": 1, "image": "", "slug": "b", "quantity": 1},
            "4": {"id": 4, "name": "c", "price": 1, "image": "", "slug": "c", "quantity": 2}
        }"#;
        let mut cart: CartSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(cart.normalize(), 2);
        assert_eq!(cart.len(), 1);
        assert!(cart.get(ProductId::new(4)).is_some());
    }

    fn quantities_strategy() -> impl Strategy<Value = Vec<(i64, u32)>> {
        prop::collection::vec((0i64..8, 0u32..500), 0..64)
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

        #[test]
        fn test_lines_never_hold_zero(additions in quantities_strategy()) {
            let mut cart = CartSnapshot::new();
            for &(id, quantity) in &additions {
                prop_assert_eq!(cart.add(product(id, 1), quantity), quantity > 0);
            }
            prop_assert!(cart.lines().all(|line| line.quantity >= 1));

            let units: u64 = additions.iter().map(|&(_, q)| u64::from(q)).sum();
            prop_assert_eq!(cart.total_quantity(), units);

            let ids: Vec<ProductId> = cart.lines().map(|line| line.id).collect();
            for id in ids {
                prop_assert!(cart.set_quantity(id, 0));
            }
            prop_assert!(cart.is_empty());
        }
    }
}
