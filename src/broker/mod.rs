// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The broker subscription side of the bridge.
//!
//! [`TelemetrySubscriber`] owns the MQTT connection: it subscribes to the
//! `<namespace>/+/telemetry` wildcard, normalizes every inbound message
//! into the device state store and fans the updated record out to the live
//! connections. Connection failures are retried forever with a fixed
//! backoff; only an explicit shutdown signal ends the task.

mod subscriber;

pub use subscriber::{SubscriberStats, TelemetrySubscriber};

/// Extracts the device id from a telemetry topic.
///
/// Only the exact `<namespace>/<deviceId>/telemetry` shape matches; the
/// device id is the second path segment, which the subscription's `+`
/// wildcard bound. Topics in a foreign namespace or with an unexpected
/// shape are rejected.
fn telemetry_device_id<'a>(topic: &'a str, namespace: &str) -> Option<&'a str> {
    let segments: Vec<&str> = topic.split('/').collect();
    match segments.as_slice() {
        &[ns, device_id, "telemetry"] if ns == namespace && !device_id.is_empty() => {
            Some(device_id)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_device_id() {
        assert_eq!(
            telemetry_device_id("sensors/tor-1/telemetry", "sensors"),
            Some("tor-1")
        );
    }

    #[test]
    fn rejects_foreign_namespace() {
        assert_eq!(telemetry_device_id("other/tor-1/telemetry", "sensors"), None);
    }

    #[test]
    fn rejects_wrong_suffix() {
        assert_eq!(telemetry_device_id("sensors/tor-1/status", "sensors"), None);
    }

    #[test]
    fn rejects_wrong_segment_count() {
        assert_eq!(telemetry_device_id("sensors/telemetry", "sensors"), None);
        assert_eq!(
            telemetry_device_id("sensors/tor-1/telemetry/extra", "sensors"),
            None
        );
    }

    #[test]
    fn rejects_empty_device_id() {
        assert_eq!(telemetry_device_id("sensors//telemetry", "sensors"), None);
    }
}
