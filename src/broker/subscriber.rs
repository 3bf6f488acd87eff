// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The resilient broker subscription task.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::Utc;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use tokio::sync::watch;

use crate::config::BrokerConfig;
use crate::error::{BrokerError, NormalizeError};
use crate::push::{ConnectionRegistry, Envelope};
use crate::state::{DeviceState, DeviceStateStore};
use crate::telemetry::{TelemetryPayload, normalize};

use super::telemetry_device_id;

/// Global counter for generating unique client IDs.
static CLIENT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Counters exposed by a running [`TelemetrySubscriber`].
///
/// Malformed input is logged *and* counted here so operators can notice a
/// misbehaving publisher without scraping logs.
#[derive(Debug, Default)]
pub struct SubscriberStats {
    connected: AtomicBool,
    applied: AtomicU64,
    malformed_messages: AtomicU64,
    malformed_payloads: AtomicU64,
    reconnects: AtomicU64,
}

impl SubscriberStats {
    /// Returns whether the subscriber currently has a broker connection.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Number of telemetry updates applied to the store.
    #[must_use]
    pub fn applied(&self) -> u64 {
        self.applied.load(Ordering::Relaxed)
    }

    /// Number of inbound messages dropped as undecodable.
    #[must_use]
    pub fn malformed_messages(&self) -> u64 {
        self.malformed_messages.load(Ordering::Relaxed)
    }

    /// Number of inbound messages dropped for a wrongly-typed metric.
    #[must_use]
    pub fn malformed_payloads(&self) -> u64 {
        self.malformed_payloads.load(Ordering::Relaxed)
    }

    /// Number of reconnection attempts after a lost or failed connection.
    #[must_use]
    pub fn reconnects(&self) -> u64 {
        self.reconnects.load(Ordering::Relaxed)
    }

    fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }
}

/// How one broker session ended.
enum SessionEnd {
    /// Shutdown was requested; the run loop terminates.
    Shutdown,
    /// The connection failed or was lost; the run loop retries after backoff.
    ConnectionLost(BrokerError),
}

/// The long-lived broker subscription task.
///
/// Owns the MQTT connection and drives the whole inbound pipeline: topic →
/// device id, payload → state update, store merge, broadcast. The task is
/// the store's single writer, so updates for a device are applied in
/// arrival order.
///
/// Connection failures of any kind are never fatal: the session is torn
/// down and retried after the configured backoff, indefinitely. The task
/// ends only when the shutdown signal is set (or its sender is dropped),
/// and a live broker connection is disconnected before the task returns.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use gatebridge::{BrokerConfig, ConnectionRegistry, DeviceStateStore, TelemetrySubscriber};
///
/// #[tokio::main]
/// async fn main() {
///     let store = Arc::new(DeviceStateStore::new());
///     let connections = Arc::new(ConnectionRegistry::new());
///
///     let subscriber = TelemetrySubscriber::new(
///         BrokerConfig::from_env().expect("broker configuration"),
///         Arc::clone(&store),
///         Arc::clone(&connections),
///     );
///
///     let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
///     let task = tokio::spawn(subscriber.run(shutdown_rx));
///
///     // ... serve queries from `store`, register connections ...
///
///     shutdown_tx.send(true).ok();
///     task.await.ok();
/// }
/// ```
#[derive(Debug)]
pub struct TelemetrySubscriber {
    config: BrokerConfig,
    store: Arc<DeviceStateStore>,
    connections: Arc<ConnectionRegistry>,
    stats: Arc<SubscriberStats>,
}

impl TelemetrySubscriber {
    /// Creates a subscriber over the given store and connection set.
    #[must_use]
    pub fn new(
        config: BrokerConfig,
        store: Arc<DeviceStateStore>,
        connections: Arc<ConnectionRegistry>,
    ) -> Self {
        Self {
            config,
            store,
            connections,
            stats: Arc::new(SubscriberStats::default()),
        }
    }

    /// Returns a handle to the subscriber's counters.
    #[must_use]
    pub fn stats(&self) -> Arc<SubscriberStats> {
        Arc::clone(&self.stats)
    }

    /// Runs the subscription until shutdown is signalled.
    ///
    /// Every pass of the outer loop is one broker session: connect,
    /// subscribe, consume messages. A connection-level failure ends the
    /// session and the loop re-enters after the configured backoff:
    /// unbounded retries, fixed interval. Both the message wait and the
    /// backoff wait are interruptible by the shutdown signal.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            host = %self.config.host,
            port = self.config.port,
            topic = %self.config.telemetry_topic(),
            "Starting telemetry subscription"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            match self.session(&mut shutdown).await {
                SessionEnd::Shutdown => break,
                SessionEnd::ConnectionLost(e) => {
                    self.stats.set_connected(false);
                    self.stats.reconnects.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        error = %e,
                        backoff = ?self.config.retry_backoff,
                        "Broker connection lost, will retry"
                    );
                }
            }

            if self.backoff(&mut shutdown).await {
                break;
            }
        }

        self.stats.set_connected(false);
        tracing::info!("Telemetry subscription stopped");
    }

    /// One broker session: connect, subscribe, consume until it ends.
    async fn session(&self, shutdown: &mut watch::Receiver<bool>) -> SessionEnd {
        let counter = CLIENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        let client_id = format!("gatebridge_{}_{}", std::process::id(), counter);

        let mut options = MqttOptions::new(client_id, &self.config.host, self.config.port);
        options.set_keep_alive(self.config.keep_alive);
        options.set_clean_session(true);
        if let Some((username, password)) = &self.config.credentials {
            options.set_credentials(username, password);
        }

        let (client, mut event_loop) = AsyncClient::new(options, 10);

        let topic = self.config.telemetry_topic();
        if let Err(e) = client.subscribe(&topic, QoS::AtLeastOnce).await {
            return SessionEnd::ConnectionLost(e.into());
        }

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        // Unwind without leaking the broker connection.
                        let _ = client.disconnect().await;
                        return SessionEnd::Shutdown;
                    }
                }
                event = event_loop.poll() => match event {
                    Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                        self.stats.set_connected(true);
                        tracing::info!(?connack, topic = %topic, "Connected to broker");
                    }
                    Ok(Event::Incoming(Packet::SubAck(suback))) => {
                        tracing::debug!(?suback, "Subscription acknowledged");
                    }
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        self.handle_publish(&publish.topic, &publish.payload);
                    }
                    Ok(_) => {}
                    Err(e) => return SessionEnd::ConnectionLost(e.into()),
                }
            }
        }
    }

    /// Waits out the retry backoff; returns `true` if shutdown arrived.
    async fn backoff(&self, shutdown: &mut watch::Receiver<bool>) -> bool {
        let wait = tokio::time::sleep(self.config.retry_backoff);
        tokio::pin!(wait);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        return true;
                    }
                }
                () = &mut wait => return false,
            }
        }
    }

    /// Processes one inbound publish; never fails.
    fn handle_publish(&self, topic: &str, payload: &[u8]) {
        let Some(device_id) = telemetry_device_id(topic, &self.config.namespace) else {
            tracing::trace!(topic = %topic, "Ignoring message on unexpected topic");
            return;
        };

        match self.ingest(device_id, payload) {
            Ok(state) => {
                self.stats.applied.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(device = %device_id, ?state, "Applied telemetry update");
            }
            Err(e) => {
                match &e {
                    NormalizeError::MalformedMessage(_) => {
                        self.stats.malformed_messages.fetch_add(1, Ordering::Relaxed);
                    }
                    NormalizeError::MalformedPayload { .. } => {
                        self.stats.malformed_payloads.fetch_add(1, Ordering::Relaxed);
                    }
                }
                tracing::warn!(topic = %topic, error = %e, "Dropping malformed telemetry");
            }
        }
    }

    /// Decode → normalize → merge → broadcast for one message.
    fn ingest(&self, device_id: &str, payload: &[u8]) -> Result<DeviceState, NormalizeError> {
        let decoded = TelemetryPayload::parse(payload)?;
        let update = normalize(&decoded, Utc::now())?;

        let state = self.store.apply_update(device_id, update);

        let delivered = self
            .connections
            .broadcast(&Envelope::telemetry(device_id, &state));
        tracing::trace!(device = %device_id, delivered, "Broadcast telemetry update");

        Ok(state)
    }
}
