// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Normalization of decoded payloads into state updates.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::NormalizeError;
use crate::state::StateUpdate;

use super::TelemetryPayload;

/// Turns a decoded payload into a partial state update.
///
/// The update's timestamp is the payload's `ts` when present and parseable
/// as RFC 3339 (normalized to UTC), otherwise `received_at`. Metrics absent
/// from the payload are omitted from the update so the merge preserves
/// prior state.
///
/// # Errors
///
/// Returns [`NormalizeError::MalformedPayload`] if a metric is present but
/// carries the wrong JSON type: `tempC` must be numeric, `doorState` must
/// be a string. The whole normalization fails in that case; the caller
/// decides to drop and log, never to apply a partially validated message.
pub fn normalize(
    payload: &TelemetryPayload,
    received_at: DateTime<Utc>,
) -> Result<StateUpdate, NormalizeError> {
    let updated_at = payload
        .ts()
        .and_then(parse_timestamp)
        .unwrap_or(received_at);

    let mut update = StateUpdate::at(updated_at);

    let Some(metrics) = payload.metrics() else {
        return Ok(update);
    };

    if let Some(value) = metrics.temp_c() {
        let celsius = value
            .as_f64()
            .ok_or_else(|| type_mismatch("tempC", "a number", value))?;
        update = update.with_temperature(celsius);
    }

    if let Some(value) = metrics.door_state() {
        let status = value
            .as_str()
            .ok_or_else(|| type_mismatch("doorState", "a string", value))?;
        update = update.with_status(status);
    }

    Ok(update)
}

/// Parses an RFC 3339 timestamp, normalizing any offset to UTC.
fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(ts) {
        Ok(parsed) => Some(parsed.with_timezone(&Utc)),
        Err(e) => {
            tracing::trace!(ts = %ts, error = %e, "Unparseable timestamp, using receipt time");
            None
        }
    }
}

fn type_mismatch(field: &str, expected: &str, value: &Value) -> NormalizeError {
    NormalizeError::MalformedPayload {
        field: field.to_string(),
        message: format!("expected {expected}, got {value}"),
    }
}
