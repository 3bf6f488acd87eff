// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The versioned message envelope pushed to live connections.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::DeviceState;

/// Outbound message envelope.
///
/// Every frame pushed to a live connection is one of these, serialized as
/// `{"v":1,"type":...,"ts":...,"data":...}`. The version field lets
/// consumers reject envelopes from a future, incompatible schema.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use gatebridge::push::Envelope;
/// use gatebridge::state::DeviceState;
///
/// let state = DeviceState::new(Utc::now()).with_status("open");
/// let envelope = Envelope::telemetry("tor-1", &state);
///
/// let json = serde_json::to_value(&envelope).unwrap();
/// assert_eq!(json["v"], 1);
/// assert_eq!(json["type"], "telemetry");
/// assert_eq!(json["data"]["deviceId"], "tor-1");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    /// Envelope schema version.
    pub v: u8,

    /// What kind of message this is.
    #[serde(rename = "type")]
    pub kind: EnvelopeKind,

    /// Timestamp of the carried event; `null` for the greeting.
    pub ts: Option<DateTime<Utc>>,

    /// The message payload.
    pub data: EnvelopeData,
}

/// The kinds of envelope a connection can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeKind {
    /// One-time greeting sent when a connection is registered.
    Hello,
    /// A device state update.
    Telemetry,
}

/// Payload of an [`Envelope`], matching its kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EnvelopeData {
    /// Greeting payload.
    Hello(ServerInfo),
    /// Telemetry payload.
    Telemetry(DeviceUpdate),
}

/// Identification of the pushing server, sent in the greeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerInfo {
    /// Server name.
    pub server: String,
    /// Server version.
    pub version: String,
}

/// A device state update as carried by a `telemetry` envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceUpdate {
    /// The device the update is for.
    #[serde(rename = "deviceId")]
    pub device_id: String,
    /// The full state record after the update was applied.
    pub data: DeviceState,
}

impl Envelope {
    /// Builds the one-time greeting envelope.
    #[must_use]
    pub fn hello() -> Self {
        Self {
            v: 1,
            kind: EnvelopeKind::Hello,
            ts: None,
            data: EnvelopeData::Hello(ServerInfo {
                server: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            }),
        }
    }

    /// Builds a telemetry envelope carrying the updated record.
    ///
    /// The envelope timestamp mirrors the record's `updated_at`.
    #[must_use]
    pub fn telemetry(device_id: impl Into<String>, state: &DeviceState) -> Self {
        Self {
            v: 1,
            kind: EnvelopeKind::Telemetry,
            ts: Some(state.updated_at),
            data: EnvelopeData::Telemetry(DeviceUpdate {
                device_id: device_id.into(),
                data: state.clone(),
            }),
        }
    }
}
