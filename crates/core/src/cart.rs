//! Cart lines, identity keys and the cart reducer.
//!
//! A cart is an ordered list of [`CartLine`]s. Two lines are the same
//! purchasable configuration when their [`LineKey`]s are equal; the key
//! treats a missing size, color or SKU exactly like an empty string.
//!
//! All mutation goes through [`Cart::apply`] (or the per-action helpers it
//! dispatches to). Every mutation re-derives the total quantity from the
//! lines, so the aggregate can never drift from the collection.
//!
//! # Invariants
//!
//! - At most one line per [`LineKey`].
//! - Every line has `quantity >= 1`; a decrement that would reach zero
//!   removes the line instead.
//! - `total_quantity() == lines().iter().map(|l| l.quantity).sum()`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// Canonical identity of a cart line: `(product, size, color, sku)`.
///
/// Absent optional fields are stored as `""`, so `None` and `Some("")`
/// compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LineKey {
    product_id: String,
    size: String,
    color: String,
    sku: String,
}

impl LineKey {
    /// Build a key, normalizing absent fields to the empty string.
    #[must_use]
    pub fn new(
        product_id: impl Into<String>,
        size: Option<&str>,
        color: Option<&str>,
        sku: Option<&str>,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            size: size.unwrap_or_default().to_owned(),
            color: color.unwrap_or_default().to_owned(),
            sku: sku.unwrap_or_default().to_owned(),
        }
    }

    #[must_use]
    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    #[must_use]
    pub fn size(&self) -> &str {
        &self.size
    }

    #[must_use]
    pub fn color(&self) -> &str {
        &self.color
    }

    #[must_use]
    pub fn sku(&self) -> &str {
        &self.sku
    }
}

const fn one() -> u32 {
    1
}

/// One distinct product configuration and its quantity.
///
/// The serialized shape matches what the storefront has always written under
/// the `cart` storage key (`_id`, `name`, `price`, `quantity`, ...), so older
/// snapshots keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(rename = "_id", alias = "id", default)]
    pub product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default = "one")]
    pub quantity: u32,
    #[serde(default)]
    pub image: String,
}

impl CartLine {
    /// The identity key of this line.
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey::new(
            self.product_id.as_str(),
            self.size.as_deref(),
            self.color.as_deref(),
            self.sku.as_deref(),
        )
    }

    /// Whether this line has the given identity.
    #[must_use]
    pub fn matches(&self, key: &LineKey) -> bool {
        self.product_id.as_str() == key.product_id
            && self.size.as_deref().unwrap_or_default() == key.size
            && self.color.as_deref().unwrap_or_default() == key.color
            && self.sku.as_deref().unwrap_or_default() == key.sku
    }

    /// `price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }

    /// Unit price in the store currency.
    #[must_use]
    pub const fn unit_price(&self) -> Price {
        Price::inr(self.price)
    }
}

/// The product configuration being added to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLine {
    pub product_id: ProductId,
    pub size: Option<String>,
    pub color: Option<String>,
    pub sku: Option<String>,
    pub name: String,
    pub price: Decimal,
    pub image: String,
}

impl NewLine {
    /// The identity key the new line would have.
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey::new(
            self.product_id.as_str(),
            self.size.as_deref(),
            self.color.as_deref(),
            self.sku.as_deref(),
        )
    }

    fn into_line(self, quantity: u32) -> CartLine {
        CartLine {
            product_id: self.product_id,
            size: self.size,
            color: self.color,
            sku: self.sku,
            name: self.name,
            price: self.price.max(Decimal::ZERO),
            quantity,
            image: self.image,
        }
    }
}

/// Every way a cart can change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    /// Add `quantity` (default 1) of a configuration, merging into an
    /// existing line with the same key.
    Add {
        line: NewLine,
        quantity: Option<u32>,
    },
    /// +1 on the matching line.
    Increment(LineKey),
    /// -1 on the matching line; removes it when it would reach zero.
    Decrement(LineKey),
    /// Delete the matching line.
    Remove(LineKey),
    /// Empty the cart.
    Clear,
    /// Replace the whole collection.
    Replace(Vec<CartLine>),
}

/// In-memory cart state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
    total_quantity: u32,
    last_touched: Option<LineKey>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cart from stored lines.
    ///
    /// Lines with a zero quantity are dropped and lines sharing a key are
    /// merged into the first occurrence, so a corrupt snapshot still yields
    /// a cart that upholds the invariants.
    #[must_use]
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let mut cart = Self::new();
        cart.lines = normalize(lines);
        cart.recount();
        cart
    }

    /// Apply one action. This is the single mutation entry point.
    pub fn apply(&mut self, action: CartAction) {
        match action {
            CartAction::Add { line, quantity } => self.add(line, quantity),
            CartAction::Increment(key) => self.increment(&key),
            CartAction::Decrement(key) => self.decrement(&key),
            CartAction::Remove(key) => self.remove(&key),
            CartAction::Clear => self.clear(),
            CartAction::Replace(lines) => self.replace(lines),
        }
    }

    /// Add a configuration. A missing or zero quantity counts as 1.
    pub fn add(&mut self, line: NewLine, quantity: Option<u32>) {
        let quantity = quantity.filter(|q| *q > 0).unwrap_or(1);
        let key = line.key();

        match self.position(&key) {
            Some(idx) => {
                if let Some(existing) = self.lines.get_mut(idx) {
                    existing.quantity = existing.quantity.saturating_add(quantity);
                }
            }
            None => self.lines.push(line.into_line(quantity)),
        }

        self.last_touched = Some(key);
        self.recount();
    }

    /// Increase the matching line by one. Unknown keys are ignored.
    pub fn increment(&mut self, key: &LineKey) {
        if let Some(line) = self.lines.iter_mut().find(|l| l.matches(key)) {
            line.quantity = line.quantity.saturating_add(1);
            self.last_touched = Some(key.clone());
        }
        self.recount();
    }

    /// Decrease the matching line by one, removing it instead of letting
    /// the quantity reach zero. Unknown keys are ignored.
    pub fn decrement(&mut self, key: &LineKey) {
        if let Some(idx) = self.position(key) {
            let remaining = self
                .lines
                .get(idx)
                .map_or(0, |line| line.quantity.saturating_sub(1));

            if remaining > 0 {
                if let Some(line) = self.lines.get_mut(idx) {
                    line.quantity = remaining;
                }
                self.last_touched = Some(key.clone());
            } else {
                self.lines.remove(idx);
                self.last_touched = None;
            }
        }
        self.recount();
    }

    /// Remove the matching line, if any.
    pub fn remove(&mut self, key: &LineKey) {
        self.lines.retain(|line| !line.matches(key));
        self.last_touched = None;
        self.recount();
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.last_touched = None;
        self.recount();
    }

    /// Replace the collection with a normalized copy of `lines`.
    pub fn replace(&mut self, lines: Vec<CartLine>) {
        self.lines = normalize(lines);
        self.last_touched = None;
        self.recount();
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Consume the cart, returning its lines.
    #[must_use]
    pub fn into_lines(self) -> Vec<CartLine> {
        self.lines
    }

    /// Sum of line quantities.
    #[must_use]
    pub const fn total_quantity(&self) -> u32 {
        self.total_quantity
    }

    /// Sum of `price * quantity` over all lines.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The line most recently added or changed, if it is still in the cart.
    #[must_use]
    pub fn last_touched(&self) -> Option<&CartLine> {
        self.last_touched.as_ref().and_then(|key| self.find(key))
    }

    /// Look up a line by key.
    #[must_use]
    pub fn find(&self, key: &LineKey) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.matches(key))
    }

    fn position(&self, key: &LineKey) -> Option<usize> {
        self.lines.iter().position(|line| line.matches(key))
    }

    fn recount(&mut self) {
        self.total_quantity = self
            .lines
            .iter()
            .fold(0u32, |sum, line| sum.saturating_add(line.quantity));
    }
}

fn normalize(lines: Vec<CartLine>) -> Vec<CartLine> {
    let mut out: Vec<CartLine> = Vec::with_capacity(lines.len());
    for mut line in lines {
        if line.quantity == 0 {
            continue;
        }
        line.price = line.price.max(Decimal::ZERO);
        let key = line.key();
        match out.iter_mut().find(|existing| existing.matches(&key)) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity),
            None => out.push(line),
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn new_line(product: &str, size: Option<&str>, color: Option<&str>) -> NewLine {
        NewLine {
            product_id: ProductId::new(product),
            size: size.map(str::to_owned),
            color: color.map(str::to_owned),
            sku: None,
            name: format!("Kurta {product}"),
            price: Decimal::new(500, 0),
            image: "https://cdn.example.com/p.jpg".to_string(),
        }
    }

    fn key(product: &str, size: Option<&str>, color: Option<&str>) -> LineKey {
        LineKey::new(product, size, color, None)
    }

    #[test]
    fn test_absent_and_empty_fields_are_the_same_key() {
        assert_eq!(
            LineKey::new("P1", None, None, None),
            LineKey::new("P1", Some(""), Some(""), Some(""))
        );
        assert_ne!(
            LineKey::new("P1", Some("M"), None, None),
            LineKey::new("P1", Some("L"), None, None)
        );
    }

    #[test]
    fn test_add_same_key_accumulates() {
        let mut cart = Cart::new();
        cart.add(new_line("P1", Some("M"), None), None);
        cart.add(new_line("P1", Some("M"), Some("")), Some(2));

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 3);
        assert_eq!(cart.total_quantity(), 3);
    }

    #[test]
    fn test_add_different_size_creates_distinct_lines() {
        let mut cart = Cart::new();
        cart.add(new_line("P1", Some("M"), None), None);
        cart.add(new_line("P1", Some("L"), None), None);

        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.total_quantity(), 2);
    }

    #[test]
    fn test_add_zero_quantity_counts_as_one() {
        let mut cart = Cart::new();
        cart.add(new_line("P1", None, None), Some(0));
        assert_eq!(cart.total_quantity(), 1);
    }

    #[test]
    fn test_increment_then_decrement_to_removal() {
        let mut cart = Cart::new();
        cart.add(new_line("P1", Some("M"), Some("#000")), None);

        let k = key("P1", Some("M"), Some("#000"));
        cart.increment(&k);
        assert_eq!(cart.lines()[0].quantity, 2);
        assert_eq!(cart.subtotal(), Decimal::new(1000, 0));

        cart.decrement(&k);
        assert_eq!(cart.lines()[0].quantity, 1);
        assert_eq!(cart.last_touched().unwrap().quantity, 1);

        cart.decrement(&k);
        assert!(cart.is_empty());
        assert_eq!(cart.total_quantity(), 0);
        assert!(cart.last_touched().is_none());
    }

    #[test]
    fn test_unknown_key_is_ignored() {
        let mut cart = Cart::new();
        cart.add(new_line("P1", None, None), None);
        cart.increment(&key("P2", None, None));
        cart.decrement(&key("P2", None, None));
        cart.remove(&key("P2", None, None));
        assert_eq!(cart.total_quantity(), 1);
    }

    #[test]
    fn test_remove_is_unconditional() {
        let mut cart = Cart::new();
        cart.add(new_line("P1", None, None), Some(5));
        cart.add(new_line("P2", None, None), None);
        cart.remove(&key("P1", None, None));

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].product_id.as_str(), "P2");
        assert_eq!(cart.total_quantity(), 1);
    }

    #[test]
    fn test_last_touched_follows_add() {
        let mut cart = Cart::new();
        cart.add(new_line("P1", None, None), None);
        cart.add(new_line("P2", None, None), None);
        assert_eq!(cart.last_touched().unwrap().product_id.as_str(), "P2");
    }

    #[test]
    fn test_from_lines_normalizes_snapshot() {
        let json = r#"[
            {"_id": "P1", "name": "A", "price": 100, "quantity": 2, "image": ""},
            {"id": "P1", "size": "", "name": "A", "price": 100, "quantity": 1, "image": ""},
            {"_id": "P2", "name": "B", "price": "50.5", "quantity": 0, "image": ""}
        ]"#;
        let lines: Vec<CartLine> = serde_json::from_str(json).unwrap();
        let cart = Cart::from_lines(lines);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.total_quantity(), 3);
    }

    #[test]
    fn test_apply_clear_and_replace() {
        let mut cart = Cart::new();
        cart.apply(CartAction::Add {
            line: new_line("P1", None, None),
            quantity: Some(3),
        });
        let snapshot = cart.lines().to_vec();

        cart.apply(CartAction::Clear);
        assert!(cart.is_empty());

        cart.apply(CartAction::Replace(snapshot));
        assert_eq!(cart.total_quantity(), 3);
    }

    #[test]
    fn test_total_tracks_lines_over_mixed_sequences() {
        let products = ["P1", "P2", "P3"];
        let sizes = [None, Some("S"), Some("M")];
        let mut cart = Cart::new();
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;

        for _ in 0..2_000 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let product = products[(seed % 3) as usize];
            let size = sizes[((seed >> 8) % 3) as usize];
            let k = key(product, size, None);

            let action = match (seed >> 16) % 4 {
                0 => CartAction::Add {
                    line: new_line(product, size, None),
                    quantity: Some(((seed >> 24) % 3) as u32),
                },
                1 => CartAction::Increment(k),
                2 => CartAction::Decrement(k),
                _ => CartAction::Remove(k),
            };
            cart.apply(action);

            let sum: u32 = cart.lines().iter().map(|l| l.quantity).sum();
            assert_eq!(cart.total_quantity(), sum);
            assert!(cart.lines().iter().all(|l| l.quantity >= 1));

            let mut keys: Vec<LineKey> = cart.lines().iter().map(CartLine::key).collect();
            let before = keys.len();
            keys.sort_by(|a, b| a.product_id().cmp(b.product_id()).then(a.size().cmp(b.size())));
            keys.dedup();
            assert_eq!(keys.len(), before, "duplicate identity keys");
        }
    }

    #[test]
    fn test_serialized_shape_uses_underscore_id() {
        let mut cart = Cart::new();
        cart.add(new_line("P1", Some("M"), None), None);
        let json = serde_json::to_value(cart.lines()).unwrap();
        assert_eq!(json[0]["_id"], "P1");
        assert_eq!(json[0]["size"], "M");
        assert!(json[0].get("color").is_none());
    }
}
