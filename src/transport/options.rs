//! Transport configuration.
//!
//! [`TransportConfig`] is the raw, deserializable form. Validation turns it
//! into [`TransportOptions`], which is what the event loop runs on.
//!
//! # Example
//!
//! ```ignore
//! use assistant_socket::transport::TransportConfig;
//!
//! let config: TransportConfig = serde_json::from_str(
//!     r#"{ "origin": "wss://assistant.example.com", "reconnect_delay_ms": 500 }"#,
//! )?;
//! let options = config.validate()?;
//! assert_eq!(options.endpoint.as_str(), "wss://assistant.example.com/");
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

use super::outbox::OutboxPolicy;

// ============================================================================
// Constants
// ============================================================================

/// Default origin of the assistant backend.
pub const DEFAULT_ORIGIN: &str = "ws://127.0.0.1:5005";

/// Default path, the root of the origin.
pub const DEFAULT_PATH: &str = "/";

/// Fixed delay between reconnect attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(500);

/// Handshake timeout; exceeding it counts as a failed handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

// ============================================================================
// TransportConfig
// ============================================================================

/// Raw transport configuration.
///
/// Every field has a default, so an empty JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Full endpoint URL. Takes precedence over `origin` + `path`.
    pub endpoint: Option<String>,

    /// Origin (`scheme://host:port`) of the backend.
    pub origin: String,

    /// Path joined onto `origin`.
    pub path: String,

    /// Reconnect after failures.
    pub reconnection: bool,

    /// Fixed delay between attempts, in milliseconds.
    pub reconnect_delay_ms: u64,

    /// Maximum consecutive reconnect attempts. `None` retries forever.
    pub max_attempts: Option<u64>,

    /// Handshake timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// Handling of `send` while not connected.
    pub outbox: OutboxPolicy,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            origin: DEFAULT_ORIGIN.to_string(),
            path: DEFAULT_PATH.to_string(),
            reconnection: true,
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY.as_millis() as u64,
            max_attempts: None,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT.as_millis() as u64,
            outbox: OutboxPolicy::default(),
        }
    }
}

impl TransportConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidEndpoint`] if the endpoint is not a `ws`/`wss` URL
    ///   (`http`/`https` are rewritten to `ws`/`wss`)
    /// - [`Error::Config`] if a timeout or the outbox capacity is zero
    pub fn validate(&self) -> Result<TransportOptions> {
        let endpoint = self.resolve_endpoint()?;

        if self.connect_timeout_ms == 0 {
            return Err(Error::config("connect_timeout_ms must be greater than zero"));
        }

        if let OutboxPolicy::Buffer { capacity: 0 } = self.outbox {
            return Err(Error::config(
                "outbox capacity must be greater than zero; use the drop policy to disable buffering",
            ));
        }

        Ok(TransportOptions {
            endpoint,
            reconnection: self.reconnection,
            reconnect_delay: Duration::from_millis(self.reconnect_delay_ms),
            max_attempts: self.max_attempts,
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            outbox: self.outbox,
        })
    }

    /// Resolves `endpoint` or `origin` + `path` into a WebSocket URL.
    fn resolve_endpoint(&self) -> Result<Url> {
        let raw = match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => Url::parse(&self.origin)
                .and_then(|origin| origin.join(&self.path))
                .map_err(|e| Error::invalid_endpoint(&self.origin, e.to_string()))?
                .to_string(),
        };

        let mut url = Url::parse(&raw).map_err(|e| Error::invalid_endpoint(&raw, e.to_string()))?;

        let scheme = match url.scheme() {
            "ws" | "http" => "ws",
            "wss" | "https" => "wss",
            other => {
                return Err(Error::invalid_endpoint(
                    &raw,
                    format!("unsupported scheme '{other}'"),
                ));
            }
        };

        if url.scheme() != scheme && url.set_scheme(scheme).is_err() {
            return Err(Error::invalid_endpoint(&raw, "cannot rewrite scheme"));
        }

        if url.host_str().is_none() {
            return Err(Error::invalid_endpoint(&raw, "missing host"));
        }

        Ok(url)
    }
}

// ============================================================================
// TransportOptions
// ============================================================================

/// Validated transport settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    /// WebSocket endpoint.
    pub endpoint: Url,
    /// Reconnect after failures.
    pub reconnection: bool,
    /// Fixed delay between attempts.
    pub reconnect_delay: Duration,
    /// Attempt budget, `None` = unbounded.
    pub max_attempts: Option<u64>,
    /// Handshake timeout.
    pub connect_timeout: Duration,
    /// Handling of `send` while not connected.
    pub outbox: OutboxPolicy,
}

impl TransportOptions {
    /// Returns `true` if another reconnect attempt is allowed after
    /// `attempts` consecutive ones.
    #[inline]
    #[must_use]
    pub fn may_retry(&self, attempts: u64) -> bool {
        self.reconnection && self.max_attempts.is_none_or(|max| attempts < max)
    }
}

// ============================================================================
// Tests
// ============================================================================
