//! Cart snapshot types.
//!
//! A [`Cart`] is always the server's view. The client replaces its copy with
//! every snapshot it receives and never derives a total of its own.

use serde::{Deserialize, Serialize};

use super::id::{CartId, CartItemId};
use super::money::Money;
use super::product::ProductSummary;

/// A cart line: one product in one size and color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub product: ProductSummary,
    pub quantity: u32,
    pub size: String,
    pub color: String,
}

/// The complete, server-authoritative cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    #[serde(default)]
    pub items: Vec<CartItem>,
    /// Total as computed by the server.
    pub total: Money,
}

impl Cart {
    /// Number of units in the cart (sum of line quantities).
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |acc, item| acc.saturating_add(item.quantity))
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find a line by its ID.
    #[must_use]
    pub fn item(&self, id: CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }
}
