// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Live-push fan-out to connected consumers.
//!
//! The crate does not speak any connection transport itself. The surrounding
//! layer (a WebSocket server, usually) hands each accepted connection to the
//! [`ConnectionRegistry`] as a [`ConnectionSink`], an abstraction that
//! delivers one serialized frame and reports failure instead of panicking.
//! The registry owns the live set: connections are registered on connect,
//! greeted with a one-time `hello` [`Envelope`], and dropped on disconnect
//! or on the first failed delivery.
//!
//! # Examples
//!
//! ```
//! use gatebridge::push::{ChannelSink, ConnectionRegistry};
//! use std::sync::Arc;
//!
//! let registry = ConnectionRegistry::new();
//!
//! let (sink, mut rx) = ChannelSink::pair(16);
//! let id = registry.register(Arc::new(sink));
//!
//! // The hello envelope is waiting in the connection's outbound queue.
//! let hello = rx.try_recv().unwrap();
//! assert!(hello.contains("\"type\":\"hello\""));
//!
//! registry.unregister(id);
//! ```

mod envelope;
mod registry;

pub use envelope::{DeviceUpdate, Envelope, EnvelopeData, EnvelopeKind, ServerInfo};
pub use registry::{ChannelSink, ConnectionId, ConnectionRegistry, ConnectionSink};
