//! # Domain Types
//!
//! The cart line and the cart container.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────────┐        ┌─────────────────────────────────┐    │
//! │  │      CartLine       │        │              Cart               │    │
//! │  │  ─────────────────  │ 0..n   │  ─────────────────────────────  │    │
//! │  │  id (opaque)        │◄───────│  lines: Vec<CartLine>           │    │
//! │  │  title              │        │  unique by id, insertion order  │    │
//! │  │  image_url          │        │                                 │    │
//! │  │  price (opaque)     │        │  add / increment / decrement    │    │
//! │  │  quantity >= 1      │        │                                 │    │
//! │  └─────────────────────┘        └─────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - No two lines share an `id`
//! - Every line has `quantity >= 1`
//! - Insertion order is preserved so the UI list does not jump around

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::validation::validate_line;
use crate::MIN_LINE_QUANTITY;

// =============================================================================
// Cart Line
// =============================================================================

/// A product in the cart together with how many of it the user wants.
///
/// `title`, `image_url` and `price` are carried for display only; the cart
/// never computes with them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLine {
    /// Product identifier, unique within a cart.
    pub id: String,

    /// Display name.
    pub title: String,

    /// Product image location.
    pub image_url: String,

    /// Unit price as shown in the catalog.
    pub price: f64,

    /// Number of units, never below 1 inside a [`Cart`].
    pub quantity: u32,
}

impl CartLine {
    /// Creates a line with quantity 1.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        image_url: impl Into<String>,
        price: f64,
    ) -> Self {
        CartLine {
            id: id.into(),
            title: title.into(),
            image_url: image_url.into(),
            price,
            quantity: MIN_LINE_QUANTITY,
        }
    }
}

// =============================================================================
// Cart Change
// =============================================================================

/// What [`Cart::add`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartChange {
    /// A new line was appended with quantity 1.
    Added,

    /// The id was already present; its quantity went up by one.
    Merged { quantity: u32 },

    /// The line could not be saved and read back, so the cart is unchanged.
    ///
    /// See [`validate_line`].
    Rejected,
}

// =============================================================================
// Cart
// =============================================================================

/// The cart: an ordered list of lines, unique by id.
///
/// ## Operations
/// ```text
/// add(line)       id present? ──yes──► quantity += 1 in place
///                             └─no───► push line with quantity = 1
///
/// increment(id)   id present? ──yes──► quantity += 1
///                             └─no───► unchanged
///
/// decrement(id)   id present and quantity > 1? ──yes──► quantity -= 1
///                                              └─no───► unchanged
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Builds a cart from lines that may not respect the cart invariants.
    ///
    /// ## Normalization
    /// - Repeated ids collapse into the first occurrence, keeping the largest
    ///   quantity seen. Older clients appended the same line twice instead of
    ///   updating it, and both copies carried the same quantity.
    /// - A quantity of 0 is raised to 1.
    ///
    /// Lines that already satisfy the invariants come back unchanged and in
    /// the same order.
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let mut cart = Cart::new();

        for mut line in lines {
            line.quantity = line.quantity.max(MIN_LINE_QUANTITY);

            match cart.lines.iter_mut().find(|l| l.id == line.id) {
                Some(existing) => existing.quantity = existing.quantity.max(line.quantity),
                None => cart.lines.push(line),
            }
        }

        cart
    }

    /// Adds a product to the cart.
    ///
    /// The quantity on `line` is ignored: a new line always starts at 1 and
    /// an existing line goes up by exactly one. When the id is already in the
    /// cart the existing entry keeps its title, image and price.
    ///
    /// A line failing [`validate_line`] is refused with
    /// [`CartChange::Rejected`].
    pub fn add(&mut self, line: CartLine) -> CartChange {
        if validate_line(&line).is_err() {
            return CartChange::Rejected;
        }

        if let Some(existing) = self.lines.iter_mut().find(|l| l.id == line.id) {
            existing.quantity = existing.quantity.saturating_add(1);
            return CartChange::Merged {
                quantity: existing.quantity,
            };
        }

        self.lines.push(CartLine {
            quantity: MIN_LINE_QUANTITY,
            ..line
        });
        CartChange::Added
    }

    /// Raises the quantity of `id` by one.
    ///
    /// Returns `false` (and changes nothing) when `id` is not in the cart.
    pub fn increment(&mut self, id: &str) -> bool {
        match self.lines.iter_mut().find(|l| l.id == id) {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(1);
                true
            }
            None => false,
        }
    }

    /// Lowers the quantity of `id` by one, never below 1.
    ///
    /// Returns `false` when `id` is not in the cart or is already at 1.
    /// Lines are never removed.
    pub fn decrement(&mut self, id: &str) -> bool {
        match self
            .lines
            .iter_mut()
            .find(|l| l.id == id && l.quantity > MIN_LINE_QUANTITY)
        {
            Some(line) => {
                line.quantity -= 1;
                true
            }
            None => false,
        }
    }

    /// Looks up a line by id.
    pub fn get(&self, id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.id == id)
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Consumes the cart, returning its lines.
    pub fn into_lines(self) -> Vec<CartLine> {
        self.lines
    }

    /// Number of distinct products.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of all quantities (the badge count on the cart icon).
    pub fn total_quantity(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn shirt() -> CartLine {
        CartLine {
            id: "p1".to_string(),
            title: "Shirt".to_string(),
            image_url: "u".to_string(),
            price: 20.0,
            quantity: 0,
        }
    }

    fn line(id: &str, quantity: u32) -> CartLine {
        CartLine {
            quantity,
            ..CartLine::new(id, format!("Product {}", id), "u", 9.99)
        }
    }

    #[test]
    fn test_add_new_line_starts_at_one() {
        let mut cart = Cart::new();

        let change = cart.add(shirt());

        assert_eq!(change, CartChange::Added);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.lines()[0].id, "p1");
        assert_eq!(cart.lines()[0].quantity, 1);
        assert_eq!(cart.lines()[0].title, "Shirt");
    }

    #[test]
    fn test_add_ignores_supplied_quantity() {
        let mut cart = Cart::new();

        cart.add(line("p1", 42));

        assert_eq!(cart.get("p1").map(|l| l.quantity), Some(1));
    }

    #[test]
    fn test_add_same_id_merges_in_place() {
        let mut cart = Cart::new();
        cart.add(shirt());

        let change = cart.add(shirt());

        assert_eq!(change, CartChange::Merged { quantity: 2 });
        assert_eq!(cart.len(), 1); // Still one line
        assert_eq!(cart.lines()[0].quantity, 2);
    }

    #[test]
    fn test_add_merge_keeps_existing_fields() {
        let mut cart = Cart::new();
        cart.add(shirt());

        let mut renamed = shirt();
        renamed.title = "Shirt (new name)".to_string();
        renamed.price = 25.0;
        cart.add(renamed);

        let stored = cart.get("p1").unwrap();
        assert_eq!(stored.title, "Shirt");
        assert_eq!(stored.price, 20.0);
    }

    #[test]
    fn test_repeated_adds_count_per_id() {
        let mut cart = Cart::new();
        let ids = ["a", "b", "a", "c", "a", "b"];

        for id in ids {
            cart.add(line(id, 0));
        }

        assert_eq!(cart.len(), 3);
        for id in ["a", "b", "c"] {
            let expected = ids.iter().filter(|&&i| i == id).count() as u32;
            assert_eq!(cart.get(id).unwrap().quantity, expected, "id {}", id);
        }
        // Insertion order of first appearance
        let order: Vec<&str> = cart.lines().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_typescript_binding_uses_payload_names() {
        let decl = CartLine::decl();

        assert!(decl.contains("imageUrl: string"), "{}", decl);
        assert!(decl.contains("price: number"), "{}", decl);
    }

    #[test]
    fn test_add_refuses_unstorable_lines() {
        let mut cart = Cart::from_lines(vec![line("p1", 2)]);
        let before = cart.clone();

        assert_eq!(cart.add(line("", 1)), CartChange::Rejected);
        assert_eq!(cart.add(line(&"x".repeat(129), 1)), CartChange::Rejected);
        assert_eq!(
            cart.add(CartLine::new("p2", "Hat", "u", f64::NAN)),
            CartChange::Rejected
        );
        assert_eq!(
            cart.add(CartLine::new("p1", "Hat", "u", f64::INFINITY)),
            CartChange::Rejected
        );

        assert_eq!(cart, before);
    }

    #[test]
    fn test_increment_only_touches_matching_line() {
        let mut cart = Cart::from_lines(vec![line("p1", 1), line("p2", 5)]);

        assert!(cart.increment("p1"));

        assert_eq!(cart.get("p1").unwrap().quantity, 2);
        assert_eq!(cart.get("p2").unwrap().quantity, 5);
    }

    #[test]
    fn test_increment_missing_id_is_noop() {
        let mut cart = Cart::from_lines(vec![line("p1", 1)]);
        let before = cart.clone();

        assert!(!cart.increment("nope"));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_decrement_floor_is_one() {
        let mut cart = Cart::from_lines(vec![line("p1", 2)]);

        assert!(cart.decrement("p1"));
        assert_eq!(cart.get("p1").unwrap().quantity, 1);

        assert!(!cart.decrement("p1"));
        assert!(!cart.decrement("p1"));
        assert_eq!(cart.get("p1").unwrap().quantity, 1);
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_decrement_missing_id_is_noop() {
        let mut cart = Cart::from_lines(vec![line("p1", 3)]);

        assert!(!cart.decrement("p2"));
        assert_eq!(cart.get("p1").unwrap().quantity, 3);
    }

    #[test]
    fn test_quantity_saturates() {
        let mut cart = Cart::from_lines(vec![line("p1", u32::MAX)]);

        assert!(cart.increment("p1"));
        cart.add(line("p1", 1));

        assert_eq!(cart.get("p1").unwrap().quantity, u32::MAX);
    }

    #[test]
    fn test_from_lines_collapses_duplicates() {
        let cart = Cart::from_lines(vec![line("p1", 2), line("p2", 1), line("p1", 2)]);

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.lines()[0].id, "p1");
        assert_eq!(cart.lines()[0].quantity, 2);
        assert_eq!(cart.lines()[1].id, "p2");
    }

    #[test]
    fn test_from_lines_keeps_largest_duplicate_quantity() {
        let cart = Cart::from_lines(vec![line("p1", 1), line("p1", 4)]);

        assert_eq!(cart.get("p1").unwrap().quantity, 4);
    }

    #[test]
    fn test_from_lines_raises_zero_quantity() {
        let cart = Cart::from_lines(vec![line("p1", 0)]);

        assert_eq!(cart.get("p1").unwrap().quantity, 1);
    }

    #[test]
    fn test_from_lines_is_identity_on_valid_cart() {
        let lines = vec![line("b", 3), line("a", 1), line("c", 7)];

        let cart = Cart::from_lines(lines.clone());

        assert_eq!(cart.into_lines(), lines);
    }

    #[test]
    fn test_total_quantity() {
        let cart = Cart::from_lines(vec![line("p1", 2), line("p2", 3)]);

        assert_eq!(cart.total_quantity(), 5);
        assert!(!cart.is_empty());
        assert!(Cart::new().is_empty());
    }
}
