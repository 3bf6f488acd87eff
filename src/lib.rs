// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `gatebridge` - Bridge MQTT device telemetry to live push consumers.
//!
//! This library connects a publish/subscribe telemetry broker to a set of
//! live, bidirectional client connections. It keeps an in-memory
//! latest-value cache per device and exposes it both as a pull interface
//! (queries) and a push interface (per-update broadcasts).
//!
//! # Architecture
//!
//! - [`TelemetrySubscriber`] owns the broker connection, subscribes to
//!   `<namespace>/+/telemetry` and retries forever on failure.
//! - Inbound payloads are decoded and normalized
//!   ([`telemetry`](crate::telemetry)) into partial state updates.
//! - [`DeviceStateStore`] merges each update into the canonical per-device
//!   record.
//! - [`ConnectionRegistry`] fans the updated record out to every live
//!   connection, dropping connections that fail to accept delivery.
//! - [`DeviceQuery`] serves read-only snapshots to request/response callers.
//!
//! The crate deliberately stops at two boundaries: HTTP routing and the
//! transport framing of live connections belong to the embedding
//! application. A connection enters the bridge as a
//! [`ConnectionSink`](crate::push::ConnectionSink), anything that can
//! deliver a serialized frame and report failure.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use gatebridge::{
//!     BrokerConfig, ConnectionRegistry, DeviceQuery, DeviceStateStore, TelemetrySubscriber,
//! };
//! use gatebridge::push::ChannelSink;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(DeviceStateStore::new());
//!     let connections = Arc::new(ConnectionRegistry::new());
//!
//!     // Ingestion: one long-lived task, reconnects forever.
//!     let subscriber = TelemetrySubscriber::new(
//!         BrokerConfig::new("192.168.1.50", 1883),
//!         Arc::clone(&store),
//!         Arc::clone(&connections),
//!     );
//!     let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!     let ingest = tokio::spawn(subscriber.run(shutdown_rx));
//!
//!     // Push: the connection-accepting layer registers each connection.
//!     let (sink, mut outbound) = ChannelSink::pair(64);
//!     let connection_id = connections.register(Arc::new(sink));
//!     tokio::spawn(async move {
//!         while let Some(frame) = outbound.recv().await {
//!             // write `frame` to the websocket ...
//!             let _ = frame;
//!         }
//!     });
//!
//!     // Pull: the HTTP layer answers queries from snapshots.
//!     let query = DeviceQuery::new(Arc::clone(&store));
//!     let _all = query.devices();
//!
//!     // Shutdown.
//!     connections.unregister(connection_id);
//!     shutdown_tx.send(true).ok();
//!     ingest.await.ok();
//! }
//! ```

pub mod broker;
pub mod config;
pub mod error;
pub mod push;
pub mod query;
pub mod state;
pub mod telemetry;

pub use broker::{SubscriberStats, TelemetrySubscriber};
pub use config::BrokerConfig;
pub use error::{BrokerError, Error, NormalizeError, Result, SendError};
pub use push::{ConnectionId, ConnectionRegistry, Envelope};
pub use query::DeviceQuery;
pub use state::{DeviceState, DeviceStateStore, StateUpdate};
