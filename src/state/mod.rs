// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state tracking.
//!
//! This module provides the canonical per-device state record and the
//! in-memory store that holds the latest known record for every device.
//! [`DeviceState`] carries the most recent readings, [`StateUpdate`] is the
//! partial record produced from one telemetry message, and
//! [`DeviceStateStore`] merges updates into records and hands out snapshots.
//!
//! # Examples
//!
//! ```
//! use chrono::Utc;
//! use gatebridge::state::{DeviceStateStore, StateUpdate};
//!
//! let store = DeviceStateStore::new();
//!
//! let update = StateUpdate::at(Utc::now()).with_temperature(22.4);
//! let state = store.apply_update("tor-1", update);
//!
//! assert_eq!(state.temperature, Some(22.4));
//! assert_eq!(store.get("tor-1").unwrap().temperature, Some(22.4));
//! ```

mod device_state;
mod store;

pub use device_state::{DeviceState, StateUpdate};
pub use store::DeviceStateStore;
