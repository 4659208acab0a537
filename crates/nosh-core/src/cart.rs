//! Cart data model

use serde::{Deserialize, Serialize};

use crate::{CartItemId, FoodId};

/// One line of a cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// Line identifier, stable across sync
    pub id: CartItemId,
    /// Catalog item this line represents
    pub food_id: FoodId,
    /// Display name
    pub name: String,
    /// Price per unit, non-negative
    pub unit_price: f64,
    /// Display label for the chosen variants (e.g. size), not parsed
    pub variant_label: String,
    /// Quantity, always >= 1
    pub quantity: u32,
}

impl CartItem {
    /// Line subtotal
    pub fn line_total(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

/// The last server-confirmed cart state.
///
/// Created on a successful fetch, replaced wholesale after a fully
/// successful sync, never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSnapshot {
    items: Vec<CartItem>,
}

impl CartSnapshot {
    pub fn new(items: Vec<CartItem>) -> Self {
        Self { items }
    }

    /// Empty snapshot (fresh account, cleared cart)
    pub fn empty() -> Self {
        Self { items: Vec::new() }
    }

    /// Items in server order
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Find a line by id
    pub fn item(&self, id: CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|it| it.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Where a loaded cart came from.
///
/// Placeholder data is a degraded-UX fallback and must never be confused
/// with server truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CartOrigin {
    /// Fetched from the backend
    Server,
    /// Seeded from static fallback data after a failed fetch
    Placeholder,
}

impl CartOrigin {
    pub fn is_authoritative(&self) -> bool {
        matches!(self, Self::Server)
    }
}

/// Server-computed cart totals, reported alongside the fetched items
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CartTotals {
    pub subtotal: f64,
    pub delivery_fee: f64,
    pub total: f64,
}
