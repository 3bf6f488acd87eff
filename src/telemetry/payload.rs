// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Schema of the inbound telemetry payload.

use serde::Deserialize;
use serde_json::Value;

use crate::error::NormalizeError;

/// Decoded telemetry message as published on `<namespace>/<deviceId>/telemetry`.
///
/// All fields are optional; readings the device did not include are simply
/// absent. The metric values are kept as raw JSON so that type validation
/// happens explicitly during normalization instead of being folded into the
/// decode step: a payload with a `tempC` of the wrong type is structurally
/// valid JSON and must be reported as such.
///
/// # Examples
///
/// ```
/// use gatebridge::telemetry::TelemetryPayload;
///
/// let raw = br#"{"ts":"2025-11-03T12:34:56Z","metrics":{"doorState":"open"}}"#;
/// let payload = TelemetryPayload::parse(raw).unwrap();
///
/// assert_eq!(payload.ts(), Some("2025-11-03T12:34:56Z"));
/// assert!(payload.metrics().is_some());
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelemetryPayload {
    /// Reading timestamp as an ISO 8601 string.
    #[serde(default)]
    ts: Option<String>,

    /// Device identifier as claimed by the payload body.
    ///
    /// Accepted for schema compatibility but never trusted: the identifier
    /// used for state updates comes from the topic.
    #[serde(rename = "deviceId", default)]
    device_id: Option<String>,

    /// Sparse set of named metric values.
    #[serde(default)]
    metrics: Option<Metrics>,
}

/// Metric values carried by one telemetry message.
///
/// Values are raw JSON; [`normalize`](super::normalize) performs the type
/// checks. Unknown metric names are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Metrics {
    /// Temperature in degrees Celsius; expected numeric.
    #[serde(rename = "tempC", default)]
    temp_c: Option<Value>,

    /// Door state; expected string.
    #[serde(rename = "doorState", default)]
    door_state: Option<Value>,
}

impl TelemetryPayload {
    /// Decodes a raw broker payload.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::MalformedMessage`] if the bytes are not a
    /// JSON object of the expected shape.
    pub fn parse(raw: &[u8]) -> Result<Self, NormalizeError> {
        serde_json::from_slice(raw).map_err(NormalizeError::MalformedMessage)
    }

    /// Returns the payload-provided timestamp, if any.
    #[must_use]
    pub fn ts(&self) -> Option<&str> {
        self.ts.as_deref()
    }

    /// Returns the device identifier claimed by the payload body.
    #[must_use]
    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    /// Returns the metric set, if the message carried one.
    #[must_use]
    pub fn metrics(&self) -> Option<&Metrics> {
        self.metrics.as_ref()
    }
}

impl Metrics {
    /// Returns the raw temperature value, if present.
    #[must_use]
    pub fn temp_c(&self) -> Option<&Value> {
        self.temp_c.as_ref()
    }

    /// Returns the raw door state value, if present.
    #[must_use]
    pub fn door_state(&self) -> Option<&Value> {
        self.door_state.as_ref()
    }
}
