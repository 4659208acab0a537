//! # Nosh Cart
//!
//! The editable in-memory cart. A working set starts as a structural copy of
//! the last server-confirmed snapshot, collects local edits (quantity changes
//! and removals), and exposes derived divergence state. Persisting the edits
//! is the sync layer's job; nothing here can fail.

use serde::{Deserialize, Serialize};

use nosh_core::{CartItem, CartItemId, CartSnapshot};

/// Locally edited, not-yet-synced cart state.
///
/// Removed items disappear from the visible list but are retained by id in
/// `pending_removals` until the next sync, so the diff can still emit a
/// remove operation for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartWorkingSet {
    /// Visible, editable items
    items: Vec<CartItem>,
    /// Ids removed locally since the last seed, in removal order
    pending_removals: Vec<CartItemId>,
}

impl CartWorkingSet {
    /// Seed a working set as a structural copy of a snapshot
    pub fn seed(snapshot: &CartSnapshot) -> Self {
        Self {
            items: snapshot.items().to_vec(),
            pending_removals: Vec::new(),
        }
    }

    /// Visible items in order
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Find a visible line by id
    pub fn item(&self, id: CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|it| it.id == id)
    }

    /// Ids removed locally and not yet synced
    pub fn pending_removals(&self) -> &[CartItemId] {
        &self.pending_removals
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Adjust a line's quantity by a signed delta, clamped at 1.
    ///
    /// Dropping a line entirely is [`remove`](Self::remove), a distinct
    /// operation. Unknown ids are ignored.
    pub fn adjust_quantity(&mut self, id: CartItemId, delta: i32) {
        if let Some(item) = self.items.iter_mut().find(|it| it.id == id) {
            let adjusted = item.quantity as i64 + delta as i64;
            item.quantity = adjusted.max(1) as u32;
        }
    }

    /// Remove a line from the visible list, recording the removal intent.
    ///
    /// Idempotent: removing an id that is already gone is a no-op.
    pub fn remove(&mut self, id: CartItemId) {
        let before = self.items.len();
        self.items.retain(|it| it.id != id);

        if self.items.len() < before && !self.pending_removals.contains(&id) {
            self.pending_removals.push(id);
        }
    }

    /// Replace the working set with a copy of `snapshot`, clearing pending
    /// removals. Used after a load and after any sync outcome, so no stale
    /// partial state lingers.
    pub fn reset(&mut self, snapshot: &CartSnapshot) {
        self.items = snapshot.items().to_vec();
        self.pending_removals.clear();
    }

    /// Does this working set diverge from `snapshot`?
    ///
    /// Derived on every call, never cached: true iff something was removed
    /// locally or any id-matched quantity differs.
    pub fn has_changes(&self, snapshot: &CartSnapshot) -> bool {
        if !self.pending_removals.is_empty() {
            return true;
        }

        self.items.iter().any(|it| {
            snapshot
                .item(it.id)
                .map_or(true, |orig| orig.quantity != it.quantity)
        })
    }

    /// Sum of unit price times quantity over the visible items
    pub fn total(&self) -> f64 {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Freeze the current visible items into a snapshot.
    ///
    /// Only meaningful after a fully successful sync, when the working set
    /// is known to match the backend.
    pub fn to_snapshot(&self) -> CartSnapshot {
        CartSnapshot::new(self.items.clone())
    }
}
