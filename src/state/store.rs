// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory store of the latest state per device.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::{DeviceState, StateUpdate};

/// Mapping from device identifier to the latest known [`DeviceState`].
///
/// Records are created lazily on first telemetry for a device (or seeded at
/// startup) and never deleted at runtime. The store assumes a single logical
/// writer (the broker subscription task) and any number of concurrent
/// readers. Each merge runs in one write-lock critical section, so a reader
/// never observes a half-merged record.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use gatebridge::state::{DeviceState, DeviceStateStore, StateUpdate};
///
/// let store = DeviceStateStore::with_seed([(
///     "tor-1".to_string(),
///     DeviceState::new(Utc::now()).with_status("closed"),
/// )]);
///
/// store.apply_update("tor-1", StateUpdate::at(Utc::now()).with_temperature(21.5));
///
/// let state = store.get("tor-1").unwrap();
/// assert_eq!(state.status.as_deref(), Some("closed"));
/// assert_eq!(state.temperature, Some(21.5));
/// ```
#[derive(Debug, Default)]
pub struct DeviceStateStore {
    devices: RwLock<HashMap<String, DeviceState>>,
}

impl DeviceStateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with the given records.
    #[must_use]
    pub fn with_seed(seed: impl IntoIterator<Item = (String, DeviceState)>) -> Self {
        Self {
            devices: RwLock::new(seed.into_iter().collect()),
        }
    }

    /// Returns the latest state for a device, or `None` if it has never
    /// reported.
    #[must_use]
    pub fn get(&self, device_id: &str) -> Option<DeviceState> {
        self.devices.read().get(device_id).cloned()
    }

    /// Returns a point-in-time copy of every device record.
    ///
    /// Traversal order is unspecified. Mutating the returned map has no
    /// effect on the store.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, DeviceState> {
        self.devices.read().clone()
    }

    /// Merges a partial update into the record for `device_id`.
    ///
    /// The record is created if this is the device's first report. Only the
    /// fields present in `update` overwrite existing values; `updated_at` is
    /// always refreshed. Returns the resulting full record.
    pub fn apply_update(&self, device_id: &str, update: StateUpdate) -> DeviceState {
        let mut devices = self.devices.write();
        match devices.get_mut(device_id) {
            Some(state) => {
                state.merge(update);
                state.clone()
            }
            None => {
                let state = DeviceState::from(update);
                devices.insert(device_id.to_string(), state.clone());
                state
            }
        }
    }

    /// Returns the number of devices with a recorded state.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    /// Returns `true` if no device has reported yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 3, 12, 0, secs).unwrap()
    }

    #[test]
    fn get_unknown_device_is_none() {
        let store = DeviceStateStore::new();
        assert!(store.get("tor-1").is_none());
    }

    #[test]
    fn first_update_creates_record() {
        let store = DeviceStateStore::new();

        let state = store.apply_update("tor-1", StateUpdate::at(ts(0)).with_temperature(19.8));

        assert_eq!(state.temperature, Some(19.8));
        assert!(state.status.is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn partial_update_preserves_other_fields() {
        let store = DeviceStateStore::new();
        store.apply_update("tor-1", StateUpdate::at(ts(0)).with_status("open"));

        let state = store.apply_update("tor-1", StateUpdate::at(ts(1)).with_temperature(22.4));

        assert_eq!(state.temperature, Some(22.4));
        assert_eq!(state.status.as_deref(), Some("open"));
        assert_eq!(state.updated_at, ts(1));
    }

    #[test]
    fn sequential_updates_apply_in_order() {
        let store = DeviceStateStore::new();

        store.apply_update("tor-1", StateUpdate::at(ts(0)).with_temperature(20.0));
        store.apply_update("tor-1", StateUpdate::at(ts(1)).with_temperature(21.0));

        let state = store.get("tor-1").unwrap();
        assert_eq!(state.temperature, Some(21.0));
        assert_eq!(state.updated_at, ts(1));
    }

    #[test]
    fn updates_for_one_device_leave_others_alone() {
        let store = DeviceStateStore::new();
        store.apply_update("tor-1", StateUpdate::at(ts(0)).with_status("open"));
        store.apply_update("tor-2", StateUpdate::at(ts(1)).with_status("closed"));

        assert_eq!(store.get("tor-1").unwrap().status.as_deref(), Some("open"));
        assert_eq!(store.get("tor-2").unwrap().status.as_deref(), Some("closed"));
    }

    #[test]
    fn snapshot_is_detached_from_store() {
        let store = DeviceStateStore::new();
        store.apply_update("tor-1", StateUpdate::at(ts(0)));

        let mut snapshot = store.snapshot();
        snapshot.remove("tor-1");
        snapshot.insert("tor-9".to_string(), DeviceState::new(ts(0)));

        assert!(store.get("tor-1").is_some());
        assert!(store.get("tor-9").is_none());
    }

    #[test]
    fn seeded_records_are_visible() {
        let store = DeviceStateStore::with_seed([
            (
                "tor-1".to_string(),
                DeviceState::new(ts(0)).with_temperature(21.5).with_status("open"),
            ),
            (
                "tor-2".to_string(),
                DeviceState::new(ts(1)).with_temperature(19.8).with_status("closed"),
            ),
        ]);

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("tor-1").unwrap().temperature, Some(21.5));
        assert_eq!(store.get("tor-2").unwrap().status.as_deref(), Some("closed"));
    }

    #[test]
    fn empty_store() {
        let store = DeviceStateStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert!(store.snapshot().is_empty());
    }
}
