//! Load / edit / commit lifecycle for one cart

use thiserror::Error;

use cart::CartWorkingSet;
use cart_diff::{CartDiff, diff};
use nosh_core::{CartItem, CartItemId, CartOrigin, CartSnapshot, CartTotals};

use crate::coordinator::{SyncCoordinator, SyncError, SyncReport, SyncState};
use crate::store::{RemoteCartStore, StoreError};

/// One editable cart: the last server-confirmed snapshot, the working set
/// the user edits, and the coordinator that commits the difference.
///
/// The snapshot only ever advances atomically, and only after a commit in
/// which every operation succeeded. After a failed commit both snapshot and
/// working set are left untouched, so the user keeps their edits and can
/// retry or discard.
#[derive(Debug)]
pub struct CartSession {
    snapshot: CartSnapshot,
    working: CartWorkingSet,
    origin: CartOrigin,
    server_totals: Option<CartTotals>,
    coordinator: SyncCoordinator,
}

/// Initial cart fetch failed
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to load cart: {0}")]
    Fetch(#[from] StoreError),
}

impl CartSession {
    /// Fetch the cart and seed snapshot and working set identically
    pub async fn load(store: &dyn RemoteCartStore) -> Result<Self, LoadError> {
        let fetched = store.fetch_cart().await?;
        let snapshot = CartSnapshot::new(fetched.items);

        tracing::debug!(items = snapshot.len(), "cart loaded");

        Ok(Self {
            working: CartWorkingSet::seed(&snapshot),
            snapshot,
            origin: CartOrigin::Server,
            server_totals: fetched.totals,
            coordinator: SyncCoordinator::new(),
        })
    }

    /// Fetch the cart, falling back to static placeholder items if the
    /// fetch fails. The fallback session is tagged
    /// [`CartOrigin::Placeholder`] so the UI can mark it as
    /// non-authoritative instead of passing it off as real data.
    pub async fn load_or_placeholder(store: &dyn RemoteCartStore, fallback: Vec<CartItem>) -> Self {
        match Self::load(store).await {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(error = %err, "cart load failed, using placeholder items");
                Self::from_placeholder(fallback)
            }
        }
    }

    /// Build a session directly from placeholder items
    pub fn from_placeholder(items: Vec<CartItem>) -> Self {
        let snapshot = CartSnapshot::new(items);
        Self {
            working: CartWorkingSet::seed(&snapshot),
            snapshot,
            origin: CartOrigin::Placeholder,
            server_totals: None,
            coordinator: SyncCoordinator::new(),
        }
    }

    /// Last server-confirmed state
    pub fn snapshot(&self) -> &CartSnapshot {
        &self.snapshot
    }

    /// Visible items including local edits
    pub fn items(&self) -> &[CartItem] {
        self.working.items()
    }

    /// Where the snapshot came from. Only a (re)load from the server
    /// upgrades a placeholder session to authoritative.
    pub fn origin(&self) -> CartOrigin {
        self.origin
    }

    /// Totals the server computed at fetch time (subtotal, delivery fee,
    /// total). Unlike [`total`](Self::total) these do not reflect local
    /// edits.
    pub fn server_totals(&self) -> Option<CartTotals> {
        self.server_totals
    }

    /// Sum of unit price times quantity over the edited items
    pub fn total(&self) -> f64 {
        self.working.total()
    }

    /// Does the working set diverge from the snapshot?
    pub fn has_changes(&self) -> bool {
        self.working.has_changes(&self.snapshot)
    }

    /// Coordinator state, for disabling mutation controls while syncing
    pub fn sync_state(&self) -> SyncState {
        self.coordinator.state()
    }

    /// Adjust a line's quantity by a signed delta, clamped at 1
    pub fn adjust_quantity(&mut self, id: CartItemId, delta: i32) {
        self.working.adjust_quantity(id, delta);
    }

    /// Remove a line locally; the backend learns of it on the next commit
    pub fn remove_item(&mut self, id: CartItemId) {
        self.working.remove(id);
    }

    /// Throw away local edits and reseed from the current snapshot
    pub fn discard(&mut self) {
        self.working.reset(&self.snapshot);
    }

    /// The operations a commit would execute right now
    pub fn pending_diff(&self) -> CartDiff {
        diff(&self.snapshot, &self.working)
    }

    /// Commit local edits to the backend.
    ///
    /// On full success the pre-commit working set becomes the new snapshot
    /// (no re-fetch; [`reload`](Self::reload) is the re-fetch path). On any
    /// failure snapshot and working set are both left exactly as they were:
    /// the error names the failing operation and how many operations had
    /// already executed, and the backend may now be ahead of the snapshot
    /// for those. A commit with no divergence executes nothing and
    /// succeeds.
    pub async fn commit(&mut self, store: &dyn RemoteCartStore) -> Result<SyncReport, SyncError> {
        let pending = self.pending_diff();
        let report = self.coordinator.commit(store, &pending).await?;

        self.snapshot = self.working.to_snapshot();
        self.working.reset(&self.snapshot);

        Ok(report)
    }

    /// Re-fetch the cart, dropping local edits and replacing snapshot and
    /// working set with fresh server state
    pub async fn reload(&mut self, store: &dyn RemoteCartStore) -> Result<(), LoadError> {
        let fetched = store.fetch_cart().await?;

        self.snapshot = CartSnapshot::new(fetched.items);
        self.working.reset(&self.snapshot);
        self.origin = CartOrigin::Server;
        self.server_totals = fetched.totals;

        tracing::debug!(items = self.snapshot.len(), "cart reloaded");
        Ok(())
    }
}
