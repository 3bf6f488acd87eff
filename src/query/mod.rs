// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Read-only query access to the device state store.
//!
//! This is the request/response side of the bridge, consumed by an external
//! HTTP layer. It adds no caching of its own (the store already holds the
//! only copy) and returns detached snapshots, so callers can serialize or
//! inspect results without holding any lock.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::state::{DeviceState, DeviceStateStore};

/// Read-only view over a [`DeviceStateStore`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use chrono::Utc;
/// use gatebridge::query::DeviceQuery;
/// use gatebridge::state::{DeviceStateStore, StateUpdate};
///
/// let store = Arc::new(DeviceStateStore::new());
/// store.apply_update("tor-1", StateUpdate::at(Utc::now()).with_status("open"));
///
/// let query = DeviceQuery::new(Arc::clone(&store));
/// assert_eq!(query.devices().len(), 1);
/// assert!(query.device("tor-1").is_ok());
/// assert!(query.device("tor-9").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct DeviceQuery {
    store: Arc<DeviceStateStore>,
}

impl DeviceQuery {
    /// Creates a query view over the given store.
    #[must_use]
    pub fn new(store: Arc<DeviceStateStore>) -> Self {
        Self { store }
    }

    /// Returns a snapshot of every known device's state.
    #[must_use]
    pub fn devices(&self) -> HashMap<String, DeviceState> {
        self.store.snapshot()
    }

    /// Returns the latest state for one device.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceNotFound`] if the device has never reported
    /// and was not seeded.
    pub fn device(&self, device_id: &str) -> Result<DeviceState> {
        self.store
            .get(device_id)
            .ok_or_else(|| Error::DeviceNotFound(device_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StateUpdate;
    use chrono::{TimeZone, Utc};

    fn store_with_devices() -> Arc<DeviceStateStore> {
        let store = Arc::new(DeviceStateStore::new());
        let ts = Utc.with_ymd_and_hms(2025, 11, 2, 12, 0, 0).unwrap();
        store.apply_update("tor-1", StateUpdate::at(ts).with_temperature(21.5).with_status("open"));
        store.apply_update("tor-2", StateUpdate::at(ts).with_status("closed"));
        store
    }

    #[test]
    fn devices_returns_full_snapshot() {
        let query = DeviceQuery::new(store_with_devices());

        let devices = query.devices();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices["tor-1"].temperature, Some(21.5));
        assert_eq!(devices["tor-2"].status.as_deref(), Some("closed"));
    }

    #[test]
    fn device_returns_latest_state() {
        let query = DeviceQuery::new(store_with_devices());

        let state = query.device("tor-1").unwrap();
        assert_eq!(state.status.as_deref(), Some("open"));
    }

    #[test]
    fn unknown_device_is_not_found() {
        let query = DeviceQuery::new(store_with_devices());

        let err = query.device("tor-9").unwrap_err();
        assert!(matches!(err, Error::DeviceNotFound(id) if id == "tor-9"));
    }

    #[test]
    fn query_observes_later_updates() {
        let store = store_with_devices();
        let query = DeviceQuery::new(Arc::clone(&store));

        let later = Utc.with_ymd_and_hms(2025, 11, 2, 12, 5, 0).unwrap();
        store.apply_update("tor-1", StateUpdate::at(later).with_temperature(22.4));

        assert_eq!(query.device("tor-1").unwrap().temperature, Some(22.4));
    }

    #[test]
    fn empty_store_lists_nothing() {
        let query = DeviceQuery::new(Arc::new(DeviceStateStore::new()));
        assert!(query.devices().is_empty());
    }
}
