//! # Nosh Address
//!
//! Delivery-address selection, persisted outside the component tree.
//! The selection lives in two injected [`StorageBackend`]s - a durable one
//! (the saved selection) and an ephemeral one (the current session
//! location used as a fallback). The cart engine reads the selection but
//! never writes it; address choice does not interact with cart diffing.

pub mod storage;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use nosh_core::AddressId;

pub use storage::{MemoryStorage, StorageBackend};

/// Durable storage key for the selected address id
pub const SELECTED_ADDRESS_ID_KEY: &str = "selectedDeliveryAddressId";
/// Durable storage key for the selected address snapshot
pub const SELECTED_ADDRESS_KEY: &str = "selectedDeliveryAddress";
/// Ephemeral storage key for the current session location
pub const SESSION_LOCATION_KEY: &str = "currentSessionLocation";

/// A saved customer address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    /// Display label, e.g. "Home" or "Work"
    pub title: String,
    /// Full address line
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub is_default: bool,
}

/// Device location captured for the current session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLocation {
    pub latitude: f64,
    pub longitude: f64,
    /// Reverse-geocoded label, if the provider supplied one
    pub address: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Where an order should be delivered
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryTarget {
    /// A saved address the user picked
    Saved(Address),
    /// The device's current location
    CurrentLocation(SessionLocation),
}

/// Reads and writes the delivery selection.
///
/// Resolution order: saved selection from durable storage, then the
/// session location from ephemeral storage, then nothing. Corrupt stored
/// entries are treated as absent.
pub struct DeliverySelection {
    local: Arc<dyn StorageBackend>,
    session: Arc<dyn StorageBackend>,
}

impl DeliverySelection {
    pub fn new(local: Arc<dyn StorageBackend>, session: Arc<dyn StorageBackend>) -> Self {
        Self { local, session }
    }

    /// Persist `address` as the delivery selection
    pub fn select(&self, address: &Address) {
        self.local
            .set(SELECTED_ADDRESS_ID_KEY, &address.id.to_string());
        if let Ok(json) = serde_json::to_string(address) {
            self.local.set(SELECTED_ADDRESS_KEY, &json);
        }
    }

    /// Drop the saved selection so the session location applies
    pub fn use_current_location(&self) {
        self.local.remove(SELECTED_ADDRESS_ID_KEY);
        self.local.remove(SELECTED_ADDRESS_KEY);
    }

    /// Record the device location for this session
    pub fn set_session_location(&self, location: &SessionLocation) {
        if let Ok(json) = serde_json::to_string(location) {
            self.session.set(SESSION_LOCATION_KEY, &json);
        }
    }

    /// Id of the saved selection, if one exists
    pub fn selected_address_id(&self) -> Option<AddressId> {
        let raw = self.local.get(SELECTED_ADDRESS_ID_KEY)?;
        raw.parse().ok().map(AddressId)
    }

    /// Resolve the current delivery target
    pub fn selected(&self) -> Option<DeliveryTarget> {
        if let Some(address) = self.saved_address() {
            return Some(DeliveryTarget::Saved(address));
        }

        self.session_location().map(DeliveryTarget::CurrentLocation)
    }

    fn saved_address(&self) -> Option<Address> {
        // Both keys must be present and coherent
        self.selected_address_id()?;
        let json = self.local.get(SELECTED_ADDRESS_KEY)?;
        serde_json::from_str(&json).ok()
    }

    fn session_location(&self) -> Option<SessionLocation> {
        let json = self.session.get(SESSION_LOCATION_KEY)?;
        serde_json::from_str(&json).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(id: u64, is_default: bool) -> Address {
        Address {
            id: AddressId(id),
            title: "Home".to_string(),
            address: "2118 Thornridge Cir., Syracuse".to_string(),
            latitude: Some(23.8103),
            longitude: Some(90.4125),
            is_default,
        }
    }

    fn selection() -> (DeliverySelection, Arc<MemoryStorage>, Arc<MemoryStorage>) {
        let local = Arc::new(MemoryStorage::new());
        let session = Arc::new(MemoryStorage::new());
        let selection = DeliverySelection::new(local.clone(), session.clone());
        (selection, local, session)
    }

    #[test]
    fn test_select_persists_id_and_snapshot() {
        let (selection, local, _) = selection();

        selection.select(&address(7, false));

        assert_eq!(local.get(SELECTED_ADDRESS_ID_KEY).as_deref(), Some("7"));
        assert_eq!(selection.selected_address_id(), Some(AddressId(7)));
        match selection.selected() {
            Some(DeliveryTarget::Saved(saved)) => assert_eq!(saved.id, AddressId(7)),
            other => panic!("unexpected target: {other:?}"),
        }
    }

    #[test]
    fn test_falls_back_to_session_location() {
        let (selection, _, _) = selection();

        selection.set_session_location(&SessionLocation {
            latitude: 23.8103,
            longitude: 90.4125,
            address: None,
            timestamp: Utc::now(),
        });

        match selection.selected() {
            Some(DeliveryTarget::CurrentLocation(loc)) => assert_eq!(loc.latitude, 23.8103),
            other => panic!("unexpected target: {other:?}"),
        }
    }

    #[test]
    fn test_saved_selection_wins_over_session_location() {
        let (selection, _, _) = selection();

        selection.set_session_location(&SessionLocation {
            latitude: 0.0,
            longitude: 0.0,
            address: None,
            timestamp: Utc::now(),
        });
        selection.select(&address(3, true));

        assert!(matches!(
            selection.selected(),
            Some(DeliveryTarget::Saved(_))
        ));
    }

    #[test]
    fn test_use_current_location_clears_saved() {
        let (selection, local, _) = selection();

        selection.select(&address(3, false));
        selection.use_current_location();

        assert!(local.get(SELECTED_ADDRESS_ID_KEY).is_none());
        assert!(local.get(SELECTED_ADDRESS_KEY).is_none());
        assert!(selection.selected().is_none());
    }

    #[test]
    fn test_corrupt_entries_treated_as_absent() {
        let (selection, local, session) = selection();

        local.set(SELECTED_ADDRESS_ID_KEY, "not-a-number");
        local.set(SELECTED_ADDRESS_KEY, "{broken json");
        session.set(SESSION_LOCATION_KEY, "also broken");

        assert!(selection.selected_address_id().is_none());
        assert!(selection.selected().is_none());
    }
}
