// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `gatebridge` library.
//!
//! The hierarchy separates failures by how they are handled: broker-level
//! errors are transient and only ever logged before a reconnect, per-message
//! normalization errors are logged and the message dropped, per-connection
//! send errors drop that one connection, and unknown-device lookups surface
//! as a structured not-found result. None of them abort the subscription
//! loop or a broadcast pass.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error on the broker connection (transient, retried with backoff).
    #[error("broker error: {0}")]
    Broker(#[from] BrokerError),

    /// Error normalizing an inbound telemetry message (message dropped).
    #[error("normalize error: {0}")]
    Normalize(#[from] NormalizeError),

    /// Error delivering a frame to a live connection (connection dropped).
    #[error("send error: {0}")]
    Send(#[from] SendError),

    /// No state has been recorded for the requested device.
    #[error("device not found: {0}")]
    DeviceNotFound(String),
}

/// Errors on the connection to the MQTT broker.
///
/// Every variant is transient from the subscriber's point of view: the
/// session is torn down, the error logged, and a new connection attempted
/// after the configured backoff.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// An MQTT client request (subscribe, disconnect) failed.
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// The broker connection failed or was lost.
    #[error("connection failed: {0}")]
    Connection(#[from] rumqttc::ConnectionError),

    /// Invalid broker address or configuration value.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Errors turning an inbound payload into a state update.
///
/// Both variants are contained per message: the caller logs, counts, and
/// continues the loop without applying anything for the offending message.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// The payload was not decodable as the expected JSON object.
    #[error("malformed message: {0}")]
    MalformedMessage(#[from] serde_json::Error),

    /// The payload decoded but a metric carried the wrong type.
    #[error("malformed payload: {field}: {message}")]
    MalformedPayload {
        /// The metric field that failed validation.
        field: String,
        /// Description of the validation failure.
        message: String,
    },
}

/// Errors delivering a frame to a single live connection.
///
/// A failed send marks the connection dead; the registry removes it after
/// the current broadcast pass completes.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    /// The connection's receiving side is gone.
    #[error("connection closed")]
    Closed,

    /// The connection's send buffer is full.
    #[error("send buffer full")]
    Full,
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
