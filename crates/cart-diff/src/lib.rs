//! # Nosh Cart Diff
//!
//! Pure computation of the minimal operation list that brings the server
//! cart in line with the local working set. No I/O, no error conditions.

use serde::{Deserialize, Serialize};

use cart::CartWorkingSet;
use nosh_core::{CartItemId, CartSnapshot};

/// A single cart mutation to execute against the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CartOp {
    /// Delete a line entirely
    RemoveItem { id: CartItemId },
    /// Set a line's quantity to a new value
    UpdateQuantity { id: CartItemId, quantity: u32 },
}

impl CartOp {
    /// The cart line this operation targets
    pub fn item_id(&self) -> CartItemId {
        match self {
            CartOp::RemoveItem { id } => *id,
            CartOp::UpdateQuantity { id, .. } => *id,
        }
    }

    pub fn is_remove(&self) -> bool {
        matches!(self, CartOp::RemoveItem { .. })
    }
}

impl std::fmt::Display for CartOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CartOp::RemoveItem { id } => write!(f, "remove item {id}"),
            CartOp::UpdateQuantity { id, quantity } => {
                write!(f, "set item {id} quantity to {quantity}")
            }
        }
    }
}

/// An ordered list of operations: removals first, then quantity updates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartDiff {
    /// Operations in execution order
    pub ops: Vec<CartOp>,
}

impl CartDiff {
    /// No changes
    pub fn empty() -> Self {
        Self { ops: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CartOp> {
        self.ops.iter()
    }
}

/// Compute the operations needed to bring the server state (described by
/// `snapshot`) to match `working`.
///
/// Removals come strictly from the working set's pending-removals list: a
/// removed line no longer appears among the visible items, so that list is
/// the only record of intent. Quantity updates come from an id-matched
/// comparison against the snapshot; unchanged lines produce nothing.
///
/// Removals are emitted before updates. A line can never need both, since
/// removal takes it out of the editable list.
pub fn diff(snapshot: &CartSnapshot, working: &CartWorkingSet) -> CartDiff {
    let mut ops: Vec<CartOp> = working
        .pending_removals()
        .iter()
        .map(|id| CartOp::RemoveItem { id: *id })
        .collect();

    for item in working.items() {
        if let Some(orig) = snapshot.item(item.id) {
            if orig.quantity != item.quantity {
                ops.push(CartOp::UpdateQuantity {
                    id: item.id,
                    quantity: item.quantity,
                });
            }
        }
    }

    CartDiff { ops }
}
