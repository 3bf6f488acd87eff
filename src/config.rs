// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broker connection configuration.

use std::time::Duration;

use crate::error::BrokerError;

/// Configuration for the telemetry broker subscription.
///
/// # Examples
///
/// ```
/// use gatebridge::BrokerConfig;
///
/// let config = BrokerConfig::new("192.168.1.50", 1883)
///     .with_namespace("sensors")
///     .with_credentials("mqtt_user", "mqtt_password");
///
/// assert_eq!(config.telemetry_topic(), "sensors/+/telemetry");
/// ```
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// The broker host address.
    pub host: String,
    /// The broker port (default 1883).
    pub port: u16,
    /// Topic namespace; telemetry arrives on `<namespace>/<deviceId>/telemetry`.
    pub namespace: String,
    /// Optional (username, password) for broker authentication.
    pub credentials: Option<(String, String)>,
    /// MQTT keep-alive interval.
    pub keep_alive: Duration,
    /// Wait between reconnection attempts after a connection failure.
    pub retry_backoff: Duration,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            namespace: "sensors".to_string(),
            credentials: None,
            keep_alive: Duration::from_secs(30),
            retry_backoff: Duration::from_secs(3),
        }
    }
}

impl BrokerConfig {
    /// Creates a configuration for the given broker address.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Reads the configuration from the process environment.
    ///
    /// Recognized variables: `BROKER_HOST`, `BROKER_PORT` and
    /// `BROKER_NAMESPACE`. Unset variables fall back to the defaults
    /// (`localhost`, 1883, `sensors`).
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::InvalidAddress`] if `BROKER_PORT` is set but
    /// not a valid port number.
    pub fn from_env() -> Result<Self, BrokerError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from a variable lookup function.
    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, BrokerError> {
        let mut config = Self::default();

        if let Some(host) = var("BROKER_HOST") {
            config.host = host;
        }
        if let Some(port) = var("BROKER_PORT") {
            config.port = port
                .parse()
                .map_err(|_| BrokerError::InvalidAddress(format!("invalid port: {port}")))?;
        }
        if let Some(namespace) = var("BROKER_NAMESPACE") {
            config.namespace = namespace;
        }

        Ok(config)
    }

    /// Sets the topic namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Sets authentication credentials for the broker.
    #[must_use]
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets the keep-alive interval (default: 30 seconds).
    #[must_use]
    pub fn with_keep_alive(mut self, duration: Duration) -> Self {
        self.keep_alive = duration;
        self
    }

    /// Sets the wait between reconnection attempts (default: 3 seconds).
    #[must_use]
    pub fn with_retry_backoff(mut self, duration: Duration) -> Self {
        self.retry_backoff = duration;
        self
    }

    /// Returns the wildcard topic filter matching telemetry for any device.
    ///
    /// The single-segment `+` wildcard binds to the device identifier.
    #[must_use]
    pub fn telemetry_topic(&self) -> String {
        let namespace = &self.namespace;
        format!("{namespace}/+/telemetry")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = BrokerConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 1883);
        assert_eq!(config.namespace, "sensors");
        assert!(config.credentials.is_none());
        assert_eq!(config.keep_alive, Duration::from_secs(30));
        assert_eq!(config.retry_backoff, Duration::from_secs(3));
    }

    #[test]
    fn telemetry_topic_uses_namespace() {
        let config = BrokerConfig::default().with_namespace("plant-7");
        assert_eq!(config.telemetry_topic(), "plant-7/+/telemetry");
    }

    #[test]
    fn builder_chain() {
        let config = BrokerConfig::new("broker.local", 8883)
            .with_namespace("gates")
            .with_credentials("user", "pass")
            .with_keep_alive(Duration::from_secs(60))
            .with_retry_backoff(Duration::from_secs(1));

        assert_eq!(config.host, "broker.local");
        assert_eq!(config.port, 8883);
        assert_eq!(config.namespace, "gates");
        assert_eq!(
            config.credentials,
            Some(("user".to_string(), "pass".to_string()))
        );
        assert_eq!(config.keep_alive, Duration::from_secs(60));
        assert_eq!(config.retry_backoff, Duration::from_secs(1));
    }

    #[test]
    fn from_vars_with_overrides() {
        let config = BrokerConfig::from_vars(|key| match key {
            "BROKER_HOST" => Some("10.0.0.7".to_string()),
            "BROKER_PORT" => Some("11883".to_string()),
            "BROKER_NAMESPACE" => Some("barn".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.host, "10.0.0.7");
        assert_eq!(config.port, 11883);
        assert_eq!(config.namespace, "barn");
    }

    #[test]
    fn from_vars_defaults_when_unset() {
        let config = BrokerConfig::from_vars(|_| None).unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 1883);
    }

    #[test]
    fn from_vars_rejects_bad_port() {
        let result = BrokerConfig::from_vars(|key| match key {
            "BROKER_PORT" => Some("not-a-port".to_string()),
            _ => None,
        });

        assert!(matches!(result, Err(BrokerError::InvalidAddress(_))));
    }
}
