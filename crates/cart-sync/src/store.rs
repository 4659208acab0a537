//! Remote cart store seam

use async_trait::async_trait;
use thiserror::Error;

use nosh_core::{CartItem, CartItemId, CartTotals};

/// A cart as returned by the backend: the line items plus the totals the
/// server computed for them (subtotal, delivery fee, grand total).
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedCart {
    pub items: Vec<CartItem>,
    pub totals: Option<CartTotals>,
}

/// The backend cart API.
///
/// The engine consumes the backend only through this trait; tests inject an
/// in-memory implementation. New lines never enter a cart through this
/// engine - "add to cart" happens elsewhere and shows up on the next fetch.
#[async_trait]
pub trait RemoteCartStore: Send + Sync {
    /// Fetch the full cart
    async fn fetch_cart(&self) -> Result<FetchedCart, StoreError>;

    /// Delete one line
    async fn remove_item(&self, id: CartItemId) -> Result<(), StoreError>;

    /// Set one line's quantity
    async fn update_quantity(&self, id: CartItemId, quantity: u32) -> Result<(), StoreError>;
}

/// Errors surfaced by a remote cart store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Request never completed (connection, DNS, timeout)
    #[error("transport error: {0}")]
    Transport(String),

    /// Server answered with a non-success status
    #[error("server returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("could not decode server response: {0}")]
    Decode(String),
}
