// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inbound telemetry decoding and normalization.
//!
//! Raw broker payloads are decoded into the strict [`TelemetryPayload`]
//! schema and then normalized into a
//! [`StateUpdate`](crate::state::StateUpdate): a tagged result that is
//! either a valid partial update or one of the malformed-input errors.
//! Nothing is silently coerced; a metric of the wrong JSON type fails the
//! whole message.
//!
//! # Examples
//!
//! ```
//! use chrono::Utc;
//! use gatebridge::telemetry::{TelemetryPayload, normalize};
//!
//! let raw = br#"{"ts":"2025-11-03T12:34:56Z","metrics":{"tempC":22.4}}"#;
//! let payload = TelemetryPayload::parse(raw).unwrap();
//! let update = normalize(&payload, Utc::now()).unwrap();
//!
//! assert_eq!(update.temperature, Some(22.4));
//! ```

mod normalizer;
mod payload;

pub use normalizer::normalize;
pub use payload::{Metrics, TelemetryPayload};
