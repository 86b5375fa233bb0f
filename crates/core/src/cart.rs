//! Cart store.
//!
//! The commerce API owns the cart. [`CartState`] is the local copy a session
//! renders from: every change goes through [`CartState::dispatch`] with the
//! [`Generation`] of the request that produced it, so a slow response can
//! never overwrite a newer one.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::catalog::{Cart, CartItem};
use crate::sequence::Generation;
use crate::types::CartItemId;

/// A change to the cart.
#[derive(Debug, Clone, PartialEq)]
pub enum CartAction {
    /// Replace local state with the server's cart.
    Synced(Cart),
    /// Optimistic quantity change. `0` removes the line.
    SetQuantity { item: CartItemId, quantity: u32 },
    /// Optimistic line removal.
    Remove { item: CartItemId },
    /// Optimistic empty cart.
    Clear,
    /// The request failed; keep items and remember why.
    Failed(String),
}

/// Outcome of [`CartState::dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Applied,
    /// Stamped older than state already applied; ignored.
    Stale,
}

/// Local cart state for one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartState {
    cart: Cart,
    applied: Generation,
    last_error: Option<String>,
}

impl CartState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `action` unless something newer already landed.
    ///
    /// Equal generations apply, so an optimistic update and the server reply
    /// to the same request both go through in order.
    pub fn dispatch(&mut self, generation: Generation, action: CartAction) -> Dispatch {
        if generation < self.applied {
            return Dispatch::Stale;
        }
        self.applied = generation;

        match action {
            CartAction::Synced(cart) => {
                self.cart = cart;
                self.last_error = None;
            }
            CartAction::SetQuantity { item, quantity: 0 } | CartAction::Remove { item } => {
                self.cart.items.retain(|line| line.id != item);
            }
            CartAction::SetQuantity { item, quantity } => {
                if let Some(line) = self.cart.items.iter_mut().find(|line| line.id == item) {
                    line.quantity = quantity;
                }
            }
            CartAction::Clear => self.cart.items.clear(),
            CartAction::Failed(reason) => self.last_error = Some(reason),
        }
        Dispatch::Applied
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.cart.items
    }

    #[must_use]
    pub fn item(&self, id: CartItemId) -> Option<&CartItem> {
        self.cart.items.iter().find(|line| line.id == id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cart.items.is_empty()
    }

    /// Total units across all lines (the header badge).
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.cart
            .items
            .iter()
            .fold(0_u32, |acc, line| acc.saturating_add(line.quantity))
    }

    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.cart.items.iter().map(CartItem::line_total).sum()
    }

    /// Lines asking for more than is in stock.
    #[must_use]
    pub fn stock_issues(&self) -> Vec<&CartItem> {
        self.cart
            .items
            .iter()
            .filter(|line| line.exceeds_stock())
            .collect()
    }

    #[must_use]
    pub const fn applied(&self) -> Generation {
        self.applied
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn take_error(&mut self) -> Option<String> {
        self.last_error.take()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn cart(lines: &[(i64, u32, &str, i64)]) -> Cart {
        let items: Vec<_> = lines
            .iter()
            .map(|(id, quantity, price, stock)| {
                json!({
                    "id": id,
                    "variantId": id * 10,
                    "quantity": quantity,
                    "variant": {
                        "id": id * 10,
                        "sku": format!("SKU-{id}"),
                        "price": price,
                        "stock": stock,
                        "product": {"id": id * 100, "name": format!("Part {id}")}
                    }
                })
            })
            .collect();
        serde_json::from_value(json!({"id": "c1", "items": items})).unwrap()
    }

    fn g(n: u64) -> Generation {
        Generation::new(n)
    }

    #[test]
    fn test_derived_totals() {
        let mut state = CartState::new();
        state.dispatch(g(1), CartAction::Synced(cart(&[(1, 2, "1500.50", 5), (2, 1, "999", 0)])));
        assert_eq!(state.item_count(), 3);
        assert_eq!(state.subtotal(), Decimal::new(400_000, 2));
        let issues = state.stock_issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].id, CartItemId::new(2));
    }

    #[test]
    fn test_set_quantity_and_zero_removes() {
        let mut state = CartState::new();
        state.dispatch(g(1), CartAction::Synced(cart(&[(1, 1, "10", 5), (2, 1, "20", 5)])));

        state.dispatch(
            g(2),
            CartAction::SetQuantity {
                item: CartItemId::new(1),
                quantity: 4,
            },
        );
        assert_eq!(state.item(CartItemId::new(1)).unwrap().quantity, 4);

        state.dispatch(
            g(3),
            CartAction::SetQuantity {
                item: CartItemId::new(2),
                quantity: 0,
            },
        );
        assert!(state.item(CartItemId::new(2)).is_none());
        assert_eq!(state.item_count(), 4);
    }

    #[test]
    fn test_stale_response_is_ignored() {
        let mut state = CartState::new();
        // Request 1 is slow, request 2 answers first.
        let newer = cart(&[(1, 3, "10", 5)]);
        let older = cart(&[(1, 1, "10", 5)]);
        assert_eq!(state.dispatch(g(2), CartAction::Synced(newer)), Dispatch::Applied);
        assert_eq!(state.dispatch(g(1), CartAction::Synced(older)), Dispatch::Stale);
        assert_eq!(state.item_count(), 3);
        assert_eq!(state.applied(), g(2));
    }

    #[test]
    fn test_same_generation_applies() {
        let mut state = CartState::new();
        state.dispatch(g(1), CartAction::Synced(cart(&[(1, 1, "10", 5)])));
        state.dispatch(g(2), CartAction::Clear);
        assert!(state.is_empty());
        assert_eq!(
            state.dispatch(g(2), CartAction::Synced(Cart::default())),
            Dispatch::Applied
        );
    }

    #[test]
    fn test_failure_keeps_items_until_sync() {
        let mut state = CartState::new();
        state.dispatch(g(1), CartAction::Synced(cart(&[(1, 1, "10", 5)])));
        state.dispatch(g(2), CartAction::Failed("out of stock".into()));
        assert_eq!(state.last_error(), Some("out of stock"));
        assert_eq!(state.item_count(), 1);

        state.dispatch(g(3), CartAction::Synced(cart(&[(1, 1, "10", 5)])));
        assert!(state.last_error().is_none());
    }
}
