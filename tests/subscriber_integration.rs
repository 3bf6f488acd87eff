// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the broker subscription using mockforge-mqtt.

use std::sync::Arc;
use std::time::Duration;

use gatebridge::{BrokerConfig, ConnectionRegistry, DeviceStateStore, TelemetrySubscriber};
use mockforge_mqtt::broker::MqttConfig;
use mockforge_mqtt::start_mqtt_server;
use tokio::sync::watch;
use tokio::time::sleep;

/// Helper to find an available port for testing.
fn get_test_port() -> u16 {
    use std::sync::atomic::{AtomicU16, Ordering};
    static PORT_COUNTER: AtomicU16 = AtomicU16::new(18950);
    PORT_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Starts a mock MQTT broker on the given port.
async fn start_mock_broker(port: u16) {
    let config = MqttConfig {
        port,
        host: "127.0.0.1".to_string(),
        ..Default::default()
    };

    tokio::spawn(async move {
        let _ = start_mqtt_server(config).await;
    });

    // Give the broker time to start, bind to port, and be ready to accept connections
    sleep(Duration::from_millis(500)).await;
}

fn spawn_subscriber(
    config: BrokerConfig,
) -> (
    tokio::task::JoinHandle<()>,
    Arc<gatebridge::SubscriberStats>,
    watch::Sender<bool>,
) {
    let store = Arc::new(DeviceStateStore::new());
    let connections = Arc::new(ConnectionRegistry::new());
    let subscriber = TelemetrySubscriber::new(config, store, connections);
    let stats = subscriber.stats();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(subscriber.run(shutdown_rx));

    (task, stats, shutdown_tx)
}

// ============================================================================
// Connection Tests
// ============================================================================

mod broker_connection {
    use super::*;

    #[tokio::test]
    async fn connects_and_subscribes() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let (task, stats, shutdown_tx) = spawn_subscriber(BrokerConfig::new("127.0.0.1", port));

        // Wait for the session to reach the connected state.
        let mut connected = false;
        for _ in 0..100 {
            if stats.is_connected() {
                connected = true;
                break;
            }
            sleep(Duration::from_millis(50)).await;
        }
        assert!(connected, "subscriber never reached the broker");

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("subscriber did not stop after shutdown")
            .unwrap();
        assert!(!stats.is_connected());
    }
}

// ============================================================================
// Reconnect Tests
// ============================================================================
//
// These run against a port with no broker listening, under a paused tokio
// clock so the fixed backoff elapses virtually.

mod reconnect {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn retries_indefinitely_with_backoff() {
        let port = get_test_port();
        // Nothing listens on `port`: every connection attempt fails.
        let (task, stats, shutdown_tx) = spawn_subscriber(BrokerConfig::new("127.0.0.1", port));

        // Several failed sessions, none of them fatal.
        while stats.reconnects() < 3 {
            sleep(Duration::from_millis(100)).await;
        }
        assert!(!stats.is_connected());
        assert!(!task.is_finished());

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(30), task)
            .await
            .expect("subscriber did not stop after shutdown")
            .unwrap();
    }

    #[tokio::test]
    async fn resumes_once_broker_becomes_available() {
        let port = get_test_port();
        // Short real-time backoff so a few failed attempts pass quickly.
        let (task, stats, shutdown_tx) = spawn_subscriber(
            BrokerConfig::new("127.0.0.1", port).with_retry_backoff(Duration::from_millis(200)),
        );

        // Fail at least twice before the broker exists.
        let mut failures = 0;
        for _ in 0..100 {
            failures = stats.reconnects();
            if failures >= 2 {
                break;
            }
            sleep(Duration::from_millis(100)).await;
        }
        assert!(failures >= 2, "expected failed attempts before the broker is up");

        start_mock_broker(port).await;

        let mut connected = false;
        for _ in 0..100 {
            if stats.is_connected() {
                connected = true;
                break;
            }
            sleep(Duration::from_millis(100)).await;
        }
        assert!(connected, "subscriber did not resume after the broker came up");

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("subscriber did not stop after shutdown")
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_backoff_wait() {
        let port = get_test_port();
        let (task, stats, shutdown_tx) = spawn_subscriber(
            BrokerConfig::new("127.0.0.1", port).with_retry_backoff(Duration::from_secs(3600)),
        );

        // Let the first attempt fail so the task sits in its backoff wait.
        while stats.reconnects() < 1 {
            sleep(Duration::from_millis(100)).await;
        }

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(30), task)
            .await
            .expect("subscriber did not leave the backoff wait on shutdown")
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_shutdown_sender_stops_subscriber() {
        let port = get_test_port();
        let (task, stats, shutdown_tx) = spawn_subscriber(BrokerConfig::new("127.0.0.1", port));

        while stats.reconnects() < 1 {
            sleep(Duration::from_millis(100)).await;
        }

        drop(shutdown_tx);
        tokio::time::timeout(Duration::from_secs(30), task)
            .await
            .expect("subscriber did not stop after its shutdown channel closed")
            .unwrap();
    }
}
