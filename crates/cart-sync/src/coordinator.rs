//! Sequential diff execution with partial-failure attribution

use parking_lot::Mutex;
use thiserror::Error;

use cart_diff::{CartDiff, CartOp};

use crate::store::{RemoteCartStore, StoreError};

/// Executes an operation list against a [`RemoteCartStore`].
///
/// Operations run strictly in diff order, one at a time. Sequential
/// execution costs latency but makes partial failure unambiguous: the
/// first failing operation is known, everything after it was never
/// attempted, and nothing already executed is rolled back.
///
/// Per sync attempt the coordinator moves `Idle -> Syncing -> Idle`. A
/// second commit while one is in flight is rejected outright - two
/// interleaved operation lists against the same working set would be
/// incoherent.
#[derive(Debug)]
pub struct SyncCoordinator {
    state: Mutex<SyncState>,
}

/// Coordinator state, visible to the UI so it can disable mutation
/// controls while a commit is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Syncing,
}

/// Outcome of a fully successful commit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Number of operations executed
    pub executed: usize,
}

/// A failed or rejected commit
#[derive(Debug, Error)]
pub enum SyncError {
    /// A commit was requested while another was in flight. Nothing was
    /// executed; the caller should retry once the first commit settles.
    #[error("a cart sync is already in flight")]
    Reentrancy,

    /// One operation failed. Execution stopped there; operations before
    /// `index` succeeded and are NOT rolled back, so the last snapshot may
    /// now be stale relative to the backend. That gap is surfaced, never
    /// masked.
    #[error("could not {op} (after {executed} earlier operation(s)): {source}")]
    Operation {
        /// The operation that failed
        op: CartOp,
        /// Its position in the diff
        index: usize,
        /// How many operations had already succeeded
        executed: usize,
        #[source]
        source: StoreError,
    },
}

impl SyncCoordinator {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SyncState::Idle),
        }
    }

    /// Current state
    pub fn state(&self) -> SyncState {
        *self.state.lock()
    }

    /// Is a commit in flight?
    pub fn is_syncing(&self) -> bool {
        self.state() == SyncState::Syncing
    }

    /// Execute `diff` against `store`, stopping at the first failure.
    ///
    /// An empty diff succeeds immediately (still subject to the
    /// re-entrancy guard). No operation is retried here; retry is a
    /// caller-initiated re-commit.
    pub async fn commit(
        &self,
        store: &dyn RemoteCartStore,
        diff: &CartDiff,
    ) -> Result<SyncReport, SyncError> {
        let _in_flight = self.begin()?;

        tracing::debug!(ops = diff.len(), "cart sync started");

        let mut executed = 0;
        for (index, op) in diff.iter().enumerate() {
            let result = match op {
                CartOp::RemoveItem { id } => store.remove_item(*id).await,
                CartOp::UpdateQuantity { id, quantity } => {
                    store.update_quantity(*id, *quantity).await
                }
            };

            if let Err(source) = result {
                tracing::warn!(%op, executed, error = %source, "cart sync aborted");
                return Err(SyncError::Operation {
                    op: op.clone(),
                    index,
                    executed,
                    source,
                });
            }

            executed += 1;
            tracing::debug!(%op, "cart operation applied");
        }

        tracing::info!(executed, "cart sync complete");
        Ok(SyncReport { executed })
    }

    fn begin(&self) -> Result<InFlight<'_>, SyncError> {
        let mut state = self.state.lock();
        if *state == SyncState::Syncing {
            return Err(SyncError::Reentrancy);
        }
        *state = SyncState::Syncing;
        Ok(InFlight { state: &self.state })
    }
}

impl Default for SyncCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the coordinator to `Idle` on every exit path, including panics
struct InFlight<'a> {
    state: &'a Mutex<SyncState>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *self.state.lock() = SyncState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FetchedCart;
    use async_trait::async_trait;
    use nosh_core::CartItemId;
    use std::sync::Arc;
    use tokio::sync::Notify;

    /// Records every call; optionally fails on one item id
    struct MockStore {
        calls: Mutex<Vec<String>>,
        fail_on: Option<CartItemId>,
    }

    impl MockStore {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on: None,
            }
        }

        fn failing_on(id: CartItemId) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on: Some(id),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }

        fn check(&self, id: CartItemId) -> Result<(), StoreError> {
            if self.fail_on == Some(id) {
                return Err(StoreError::Transport("connection reset".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl RemoteCartStore for MockStore {
        async fn fetch_cart(&self) -> Result<FetchedCart, StoreError> {
            Ok(FetchedCart {
                items: Vec::new(),
                totals: None,
            })
        }

        async fn remove_item(&self, id: CartItemId) -> Result<(), StoreError> {
            self.check(id)?;
            self.calls.lock().push(format!("remove {id}"));
            Ok(())
        }

        async fn update_quantity(&self, id: CartItemId, quantity: u32) -> Result<(), StoreError> {
            self.check(id)?;
            self.calls.lock().push(format!("update {id} -> {quantity}"));
            Ok(())
        }
    }

    fn two_op_diff() -> CartDiff {
        CartDiff {
            ops: vec![
                CartOp::RemoveItem { id: CartItemId(2) },
                CartOp::UpdateQuantity {
                    id: CartItemId(1),
                    quantity: 2,
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_commit_runs_in_diff_order() {
        let store = MockStore::new();
        let coordinator = SyncCoordinator::new();

        let report = coordinator.commit(&store, &two_op_diff()).await.unwrap();

        assert_eq!(report.executed, 2);
        assert_eq!(store.calls(), vec!["remove 2", "update 1 -> 2"]);
        assert_eq!(coordinator.state(), SyncState::Idle);
    }

    #[tokio::test]
    async fn test_empty_diff_is_immediate_success() {
        let store = MockStore::new();
        let coordinator = SyncCoordinator::new();

        let report = coordinator.commit(&store, &CartDiff::empty()).await.unwrap();

        assert_eq!(report.executed, 0);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_first_failure_stops_execution() {
        // Removal of item 2 succeeds, then the quantity update on item 1
        // fails: the error must name item 1 and count one executed op.
        let store = MockStore::failing_on(CartItemId(1));
        let coordinator = SyncCoordinator::new();

        let err = coordinator
            .commit(&store, &two_op_diff())
            .await
            .unwrap_err();

        match err {
            SyncError::Operation {
                op,
                index,
                executed,
                ..
            } => {
                assert_eq!(op.item_id(), CartItemId(1));
                assert_eq!(index, 1);
                assert_eq!(executed, 1);
            }
            other => panic!("unexpected error: {other}"),
        }

        assert_eq!(store.calls(), vec!["remove 2"]);
        assert_eq!(coordinator.state(), SyncState::Idle);
    }

    #[tokio::test]
    async fn test_failure_at_first_op_executes_nothing() {
        let store = MockStore::failing_on(CartItemId(2));
        let coordinator = SyncCoordinator::new();

        let err = coordinator
            .commit(&store, &two_op_diff())
            .await
            .unwrap_err();

        match err {
            SyncError::Operation { index, executed, .. } => {
                assert_eq!(index, 0);
                assert_eq!(executed, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(store.calls().is_empty());
    }

    /// Blocks inside the first operation until released, so a second
    /// commit can be attempted while the first is in flight
    struct SlowStore {
        started: Notify,
        release: Notify,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl RemoteCartStore for SlowStore {
        async fn fetch_cart(&self) -> Result<FetchedCart, StoreError> {
            Ok(FetchedCart {
                items: Vec::new(),
                totals: None,
            })
        }

        async fn remove_item(&self, _id: CartItemId) -> Result<(), StoreError> {
            self.started.notify_one();
            self.release.notified().await;
            *self.calls.lock() += 1;
            Ok(())
        }

        async fn update_quantity(&self, _id: CartItemId, _quantity: u32) -> Result<(), StoreError> {
            *self.calls.lock() += 1;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_reentrant_commit_rejected() {
        let store = Arc::new(SlowStore {
            started: Notify::new(),
            release: Notify::new(),
            calls: Mutex::new(0),
        });
        let coordinator = Arc::new(SyncCoordinator::new());

        let diff = CartDiff {
            ops: vec![CartOp::RemoveItem { id: CartItemId(2) }],
        };

        let first = {
            let store = Arc::clone(&store);
            let coordinator = Arc::clone(&coordinator);
            let diff = diff.clone();
            tokio::spawn(async move { coordinator.commit(store.as_ref(), &diff).await })
        };

        // Wait until the first commit is inside its first operation
        store.started.notified().await;
        assert!(coordinator.is_syncing());

        let second = coordinator.commit(store.as_ref(), &diff).await;
        assert!(matches!(second, Err(SyncError::Reentrancy)));

        store.release.notify_one();
        let report = first.await.unwrap().unwrap();

        // The rejected commit executed nothing; no operation ran twice
        assert_eq!(report.executed, 1);
        assert_eq!(*store.calls.lock(), 1);
        assert_eq!(coordinator.state(), SyncState::Idle);
    }
}
