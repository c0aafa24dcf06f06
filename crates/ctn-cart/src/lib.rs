//! ctn-cart
//!
//! The cart ledger: item lines, derived totals, and the invariant-checking
//! boundary in front of them.
//!
//! # Purpose
//!
//! All cart mutations flow through [`CartLedger::add_line`] /
//! [`CartLedger::remove_line`], which enforce the invariants the selling
//! surfaces rely on:
//!
//! - every line has `quantity >= 1`;
//! - one line per item id (adding an item already in the cart merges
//!   quantities);
//! - blocked items never enter the cart;
//! - a line never exceeds the cached stock at add time.
//!
//! The cart is **not** mutated when an add is rejected.
//!
//! # Stock reservation
//!
//! A successful add optimistically reserves stock in the catalog cache so
//! the same unit cannot be added twice from one screen. Removing a line does
//! not restore the reservation — stock is resynced by the next catalog
//! refresh. This is a documented limitation of the eventually-consistent
//! cache, not a bug to silently fix here.

use std::collections::BTreeMap;

use ctn_catalog::{CatalogCache, RestrictionSet};
use ctn_schemas::Money;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// All invariant violations `CartLedger` can surface at add time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// The item is blocked for the selected student.
    BlockedItem { item_id: i64 },
    /// The item is not in the catalog snapshot.
    UnknownItem { item_id: i64 },
    /// Quantity must be >= 1.
    NonPositiveQuantity { item_id: i64 },
    /// Requested quantity exceeds the cached stock.
    InsufficientStock {
        item_id: i64,
        requested: u32,
        available: u32,
    },
    /// `price × quantity` overflowed i64 micros. Always a data-quality error.
    LineTotalOverflow { item_id: i64 },
}

impl std::fmt::Display for CartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CartError::BlockedItem { item_id } => {
                write!(f, "item {item_id} is blocked for this student")
            }
            CartError::UnknownItem { item_id } => {
                write!(f, "item {item_id} is not in the catalog")
            }
            CartError::NonPositiveQuantity { item_id } => {
                write!(f, "quantity for item {item_id} must be at least 1")
            }
            CartError::InsufficientStock {
                item_id,
                requested,
                available,
            } => write!(
                f,
                "only {available} units of item {item_id} available, requested {requested}"
            ),
            CartError::LineTotalOverflow { item_id } => {
                write!(f, "line total for item {item_id} overflows")
            }
        }
    }
}

impl std::error::Error for CartError {}

// ---------------------------------------------------------------------------
// CartLine
// ---------------------------------------------------------------------------

/// One cart line. Unit price and name are captured from the catalog at add
/// time so a later refresh cannot silently reprice an already-built cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub item_id: i64,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
}

impl CartLine {
    pub fn line_total(&self) -> Money {
        // Quantities are bounded by stock checks at add time; the overflow
        // case is rejected there.
        self.unit_price
            .checked_mul_qty(self.quantity)
            .unwrap_or(Money::ZERO)
    }
}

// ---------------------------------------------------------------------------
// CartLedger
// ---------------------------------------------------------------------------

/// Item-id → line mapping with derived totals.
#[derive(Debug, Default)]
pub struct CartLedger {
    lines: BTreeMap<i64, CartLine>,
}

impl CartLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `qty` of an item, merging with an existing line for the same id.
    ///
    /// Validates against the restriction set and the cached stock, then
    /// reserves the stock locally. The cart is unchanged on any error.
    ///
    /// # Errors
    /// [`CartError`] for a blocked/unknown item, zero quantity, insufficient
    /// stock, or line-total overflow.
    pub fn add_line(
        &mut self,
        catalog: &mut CatalogCache,
        restrictions: &RestrictionSet,
        item_id: i64,
        quantity: u32,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::NonPositiveQuantity { item_id });
        }
        if restrictions.is_blocked(item_id) {
            return Err(CartError::BlockedItem { item_id });
        }
        let item = catalog
            .find_by_id(item_id)
            .ok_or(CartError::UnknownItem { item_id })?;
        if quantity > item.stock {
            return Err(CartError::InsufficientStock {
                item_id,
                requested: quantity,
                available: item.stock,
            });
        }

        let merged_qty = self
            .lines
            .get(&item_id)
            .map(|l| l.quantity)
            .unwrap_or(0)
            .checked_add(quantity)
            .ok_or(CartError::LineTotalOverflow { item_id })?;
        if item.price.checked_mul_qty(merged_qty).is_none() {
            return Err(CartError::LineTotalOverflow { item_id });
        }

        let name = item.name.clone();
        let unit_price = item.price;

        // All checks passed; reservation cannot fail after the stock check
        // above, but stay defensive about the shared cache.
        if !catalog.reserve_stock(item_id, quantity) {
            return Err(CartError::InsufficientStock {
                item_id,
                requested: quantity,
                available: 0,
            });
        }

        self.lines
            .entry(item_id)
            .and_modify(|l| l.quantity = merged_qty)
            .or_insert(CartLine {
                item_id,
                name,
                unit_price,
                quantity,
            });
        Ok(())
    }

    /// Remove a line. Returns `true` if it existed. Reserved stock is not
    /// restored (see module docs).
    pub fn remove_line(&mut self, item_id: i64) -> bool {
        self.lines.remove(&item_id).is_some()
    }

    /// Sum of all line totals.
    pub fn subtotal(&self) -> Money {
        self.lines
            .values()
            .fold(Money::ZERO, |acc, l| acc.saturating_add(l.line_total()))
    }

    pub fn lines(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.values()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Empty the ledger (after a confirmed order, or a session reset).
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ctn_schemas::CatalogItem;

    fn item(id: i64, name: &str, price: i64, stock: u32) -> CatalogItem {
        CatalogItem {
            id,
            name: name.to_string(),
            price: Money::from_pesos(price),
            stock,
            category: "Almuerzo".to_string(),
            calories: 100,
        }
    }

    fn catalog() -> CatalogCache {
        CatalogCache::from_items([
            item(1, "Almuerzo corriente", 5_000, 10),
            item(2, "Jugo", 3_000, 4),
            item(3, "Fruta", 1_500, 0),
        ])
    }

    fn no_restrictions() -> RestrictionSet {
        RestrictionSet::from_blocked(3, [])
    }

    // --- Invariant enforcement ---

    #[test]
    fn rejects_blocked_item_and_cart_unchanged() {
        let mut catalog = catalog();
        let restrictions = RestrictionSet::from_blocked(3, [2]);
        let mut cart = CartLedger::new();

        let err = cart.add_line(&mut catalog, &restrictions, 2, 1);
        assert_eq!(err, Err(CartError::BlockedItem { item_id: 2 }));
        assert!(cart.is_empty());
        // No reservation happened either.
        assert_eq!(catalog.find_by_id(2).unwrap().stock, 4);
    }

    #[test]
    fn rejects_quantity_over_stock_and_cart_unchanged() {
        let mut catalog = catalog();
        let mut cart = CartLedger::new();

        let err = cart.add_line(&mut catalog, &no_restrictions(), 2, 5);
        assert_eq!(
            err,
            Err(CartError::InsufficientStock {
                item_id: 2,
                requested: 5,
                available: 4
            })
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn rejects_zero_quantity() {
        let mut catalog = catalog();
        let mut cart = CartLedger::new();
        assert_eq!(
            cart.add_line(&mut catalog, &no_restrictions(), 1, 0),
            Err(CartError::NonPositiveQuantity { item_id: 1 })
        );
    }

    #[test]
    fn rejects_unknown_item() {
        let mut catalog = catalog();
        let mut cart = CartLedger::new();
        assert_eq!(
            cart.add_line(&mut catalog, &no_restrictions(), 99, 1),
            Err(CartError::UnknownItem { item_id: 99 })
        );
    }

    #[test]
    fn rejects_out_of_stock_item() {
        let mut catalog = catalog();
        let mut cart = CartLedger::new();
        assert_eq!(
            cart.add_line(&mut catalog, &no_restrictions(), 3, 1),
            Err(CartError::InsufficientStock {
                item_id: 3,
                requested: 1,
                available: 0
            })
        );
    }

    // --- Merging and reservation ---

    #[test]
    fn add_reserves_stock_locally() {
        let mut catalog = catalog();
        let mut cart = CartLedger::new();
        cart.add_line(&mut catalog, &no_restrictions(), 1, 2).unwrap();
        assert_eq!(catalog.find_by_id(1).unwrap().stock, 8);
    }

    #[test]
    fn same_item_merges_into_one_line() {
        let mut catalog = catalog();
        let mut cart = CartLedger::new();
        cart.add_line(&mut catalog, &no_restrictions(), 1, 2).unwrap();
        cart.add_line(&mut catalog, &no_restrictions(), 1, 3).unwrap();

        assert_eq!(cart.len(), 1);
        let line = cart.lines().next().unwrap();
        assert_eq!(line.quantity, 5);
        assert_eq!(line.line_total(), Money::from_pesos(25_000));
        assert_eq!(catalog.find_by_id(1).unwrap().stock, 5);
    }

    #[test]
    fn merge_respects_remaining_stock() {
        let mut catalog = catalog();
        let mut cart = CartLedger::new();
        cart.add_line(&mut catalog, &no_restrictions(), 2, 3).unwrap();
        // 1 unit left in cache; asking for 2 more must fail.
        let err = cart.add_line(&mut catalog, &no_restrictions(), 2, 2);
        assert_eq!(
            err,
            Err(CartError::InsufficientStock {
                item_id: 2,
                requested: 2,
                available: 1
            })
        );
        assert_eq!(cart.lines().next().unwrap().quantity, 3);
    }

    // --- Totals ---

    #[test]
    fn subtotal_is_sum_of_line_totals() {
        let mut catalog = catalog();
        let mut cart = CartLedger::new();
        cart.add_line(&mut catalog, &no_restrictions(), 1, 2).unwrap();
        cart.add_line(&mut catalog, &no_restrictions(), 2, 1).unwrap();

        // 2×5000 + 1×3000
        assert_eq!(cart.subtotal(), Money::from_pesos(13_000));
    }

    #[test]
    fn empty_cart_subtotal_is_zero() {
        assert_eq!(CartLedger::new().subtotal(), Money::ZERO);
    }

    // --- Removal ---

    #[test]
    fn remove_line_does_not_restore_stock() {
        let mut catalog = catalog();
        let mut cart = CartLedger::new();
        cart.add_line(&mut catalog, &no_restrictions(), 1, 2).unwrap();
        assert!(cart.remove_line(1));
        assert!(cart.is_empty());
        // Reservation stands until the next catalog refresh.
        assert_eq!(catalog.find_by_id(1).unwrap().stock, 8);
    }

    #[test]
    fn remove_missing_line_is_false() {
        let mut cart = CartLedger::new();
        assert!(!cart.remove_line(1));
    }

    #[test]
    fn clear_empties_the_ledger() {
        let mut catalog = catalog();
        let mut cart = CartLedger::new();
        cart.add_line(&mut catalog, &no_restrictions(), 1, 1).unwrap();
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal(), Money::ZERO);
    }
}
