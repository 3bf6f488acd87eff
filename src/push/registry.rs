// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registry of live push connections.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::SendError;

use super::Envelope;

/// Opaque identity of one live connection.
///
/// Handed out by [`ConnectionRegistry::register`] and used to remove the
/// connection when the transport layer observes a disconnect.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Debug for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Show only first 8 characters for readability
        let short = &self.0.to_string()[..8];
        write!(f, "ConnectionId({short}...)")
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One end of a live connection, as seen by the registry.
///
/// Implementations deliver a single serialized frame to their transport and
/// report failure as a value. `send` must not block: a connection that
/// cannot accept the frame right now is reported as failed rather than
/// stalling the broadcast pass for everyone else.
pub trait ConnectionSink: Send + Sync {
    /// Delivers one frame to the connection.
    ///
    /// # Errors
    ///
    /// Returns [`SendError`] if the connection is gone or cannot accept the
    /// frame. The registry treats any error as a disconnect.
    fn send(&self, frame: &str) -> Result<(), SendError>;
}

/// A [`ConnectionSink`] backed by a bounded channel.
///
/// The transport layer keeps the paired receiver and drains it into its
/// socket; when the transport task ends the receiver is dropped and the
/// next delivery attempt reports the connection closed.
///
/// # Examples
///
/// ```
/// use gatebridge::push::{ChannelSink, ConnectionSink};
///
/// let (sink, mut rx) = ChannelSink::pair(16);
/// sink.send("{\"v\":1}").unwrap();
/// assert_eq!(rx.try_recv().unwrap(), "{\"v\":1}");
/// ```
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<String>,
}

impl ChannelSink {
    /// Wraps an existing sender.
    #[must_use]
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }

    /// Creates a sink together with the receiver the transport drains.
    #[must_use]
    pub fn pair(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl ConnectionSink for ChannelSink {
    fn send(&self, frame: &str) -> Result<(), SendError> {
        self.tx.try_send(frame.to_string()).map_err(|e| match e {
            mpsc::error::TrySendError::Closed(_) => SendError::Closed,
            mpsc::error::TrySendError::Full(_) => SendError::Full,
        })
    }
}

/// The set of currently live connections.
///
/// Membership is the sole source of truth for "is this connection alive":
/// connections enter on [`register`](Self::register) and leave on
/// [`unregister`](Self::unregister) or on their first failed delivery.
/// Registration and removal may happen concurrently with a broadcast pass;
/// the broadcast iterates over a snapshot of the set and defers removals
/// until the pass completes.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ConnectionId, Arc<dyn ConnectionSink>>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new live connection and greets it.
    ///
    /// The one-time `hello` envelope is delivered immediately; if that
    /// delivery fails the connection is dropped again, but the returned id
    /// stays valid to pass to [`unregister`](Self::unregister).
    pub fn register(&self, sink: Arc<dyn ConnectionSink>) -> ConnectionId {
        let id = ConnectionId::new();
        self.connections.write().insert(id, Arc::clone(&sink));
        tracing::debug!(connection = %id, "Connection registered");

        match serde_json::to_string(&Envelope::hello()) {
            Ok(frame) => {
                if let Err(e) = sink.send(&frame) {
                    tracing::debug!(connection = %id, error = %e, "Greeting failed, dropping connection");
                    self.connections.write().remove(&id);
                }
            }
            Err(e) => tracing::error!(error = %e, "Failed to serialize greeting"),
        }

        id
    }

    /// Removes a connection from the live set.
    ///
    /// Idempotent: removing an id that already left is a no-op. Returns
    /// `true` if the connection was still registered.
    pub fn unregister(&self, id: ConnectionId) -> bool {
        let removed = self.connections.write().remove(&id).is_some();
        if removed {
            tracing::debug!(connection = %id, "Connection unregistered");
        }
        removed
    }

    /// Delivers an envelope to every live connection.
    ///
    /// The envelope is serialized once. A failed delivery never aborts the
    /// pass; the failing connection is treated as disconnected and removed
    /// after the pass completes. Broadcasting with no registered
    /// connections is a no-op. Returns the number of successful deliveries.
    pub fn broadcast(&self, envelope: &Envelope) -> usize {
        let frame = match serde_json::to_string(envelope) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize broadcast envelope");
                return 0;
            }
        };

        // Snapshot the live set so membership changes during the pass
        // cannot invalidate the iteration.
        let targets: Vec<(ConnectionId, Arc<dyn ConnectionSink>)> = self
            .connections
            .read()
            .iter()
            .map(|(id, sink)| (*id, Arc::clone(sink)))
            .collect();

        let mut delivered = 0;
        let mut dead = Vec::new();

        for (id, sink) in targets {
            match sink.send(&frame) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::debug!(connection = %id, error = %e, "Delivery failed, dropping connection");
                    dead.push(id);
                }
            }
        }

        if !dead.is_empty() {
            let mut connections = self.connections.write();
            for id in dead {
                connections.remove(&id);
            }
        }

        delivered
    }

    /// Returns whether the connection is still in the live set.
    #[must_use]
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.read().contains_key(&id)
    }

    /// Returns the number of live connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.read().len()
    }

    /// Returns `true` if no connection is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }
}

impl fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("connections", &self.len())
            .finish()
    }
}
