//! # Nosh Cart Sync
//!
//! Commits locally edited cart state back to the backend:
//! - [`RemoteCartStore`] is the seam to the cart REST API
//! - [`SyncCoordinator`] executes a diff sequentially with partial-failure
//!   attribution and a re-entrancy guard
//! - [`CartSession`] ties snapshot, working set, and coordinator together
//!   into the load / edit / commit / reload cycle the UI drives

pub mod coordinator;
pub mod session;
pub mod store;

pub use cart_diff::{CartDiff, CartOp};
pub use coordinator::{SyncCoordinator, SyncError, SyncReport, SyncState};
pub use session::{CartSession, LoadError};
pub use store::{FetchedCart, RemoteCartStore, StoreError};
