// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The per-device state record and its partial-update form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Latest known state of a single device.
///
/// Readings are optional because a field stays unknown until the device
/// first reports it. Once set, a field is never cleared at runtime; it is
/// only overwritten by a newer reading for the same device.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use gatebridge::state::DeviceState;
///
/// let state = DeviceState::new(Utc::now())
///     .with_temperature(21.5)
///     .with_status("open");
///
/// assert_eq!(state.temperature, Some(21.5));
/// assert_eq!(state.status.as_deref(), Some("open"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceState {
    /// Most recent temperature reading in degrees Celsius.
    pub temperature: Option<f64>,

    /// Most recent reported status (e.g. `"open"` / `"closed"`).
    pub status: Option<String>,

    /// When the device last reported, UTC.
    pub updated_at: DateTime<Utc>,
}

impl DeviceState {
    /// Creates a state record with no readings yet.
    #[must_use]
    pub fn new(updated_at: DateTime<Utc>) -> Self {
        Self {
            temperature: None,
            status: None,
            updated_at,
        }
    }

    /// Sets the temperature reading.
    #[must_use]
    pub fn with_temperature(mut self, celsius: f64) -> Self {
        self.temperature = Some(celsius);
        self
    }

    /// Sets the status value.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Merges a partial update into this record.
    ///
    /// Only the fields present in `update` overwrite; `updated_at` is always
    /// refreshed to the update's timestamp.
    pub(crate) fn merge(&mut self, update: StateUpdate) {
        if let Some(temperature) = update.temperature {
            self.temperature = Some(temperature);
        }
        if let Some(status) = update.status {
            self.status = Some(status);
        }
        self.updated_at = update.updated_at;
    }
}

impl From<StateUpdate> for DeviceState {
    fn from(update: StateUpdate) -> Self {
        Self {
            temperature: update.temperature,
            status: update.status,
            updated_at: update.updated_at,
        }
    }
}

/// A partial state update produced from one telemetry message.
///
/// Fields the message did not carry are `None` and leave the stored record
/// untouched on merge. The timestamp is mandatory: every applied update
/// refreshes `updated_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct StateUpdate {
    /// New temperature reading, if the message carried one.
    pub temperature: Option<f64>,

    /// New status value, if the message carried one.
    pub status: Option<String>,

    /// Timestamp of the reading (payload-provided or receipt time).
    pub updated_at: DateTime<Utc>,
}

impl StateUpdate {
    /// Creates an empty update stamped with the given timestamp.
    #[must_use]
    pub fn at(updated_at: DateTime<Utc>) -> Self {
        Self {
            temperature: None,
            status: None,
            updated_at,
        }
    }

    /// Sets the temperature reading.
    #[must_use]
    pub fn with_temperature(mut self, celsius: f64) -> Self {
        self.temperature = Some(celsius);
        self
    }

    /// Sets the status value.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Returns `true` if the update carries no readings (timestamp only).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.status.is_none()
    }
}
