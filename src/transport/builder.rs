//! Builder pattern for transport configuration.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use assistant_socket::Transport;
//!
//! # fn example() -> assistant_socket::Result<()> {
//! let transport = Transport::builder()
//!     .origin("ws://127.0.0.1:5005")
//!     .reconnect_delay(Duration::from_millis(500))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;

use super::connector::{Connector, WsConnector};
use super::core::Transport;
use super::options::TransportConfig;
use super::outbox::OutboxPolicy;

// ============================================================================
// TransportBuilder
// ============================================================================

/// Builder for configuring a [`Transport`].
///
/// Use [`Transport::builder()`] to create a new builder.
#[derive(Clone)]
pub struct TransportBuilder {
    /// Raw configuration, validated in `build()`.
    config: TransportConfig,
    /// Channel factory.
    connector: Arc<dyn Connector>,
}

impl fmt::Debug for TransportBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportBuilder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for TransportBuilder {
    fn default() -> Self {
        Self {
            config: TransportConfig::default(),
            connector: Arc::new(WsConnector),
        }
    }
}

// ============================================================================
// TransportBuilder Implementation
// ============================================================================

impl TransportBuilder {
    /// Creates a builder with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    #[inline]
    #[must_use]
    pub fn config(mut self, config: TransportConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the full endpoint URL.
    #[inline]
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the origin the default path is resolved against.
    #[inline]
    #[must_use]
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.config.origin = origin.into();
        self
    }

    /// Sets the path joined onto the origin.
    #[inline]
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Enables or disables reconnection.
    #[inline]
    #[must_use]
    pub fn reconnection(mut self, enabled: bool) -> Self {
        self.config.reconnection = enabled;
        self
    }

    /// Sets the fixed delay between reconnect attempts.
    #[inline]
    #[must_use]
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.config.reconnect_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Bounds the number of consecutive reconnect attempts.
    #[inline]
    #[must_use]
    pub fn max_attempts(mut self, max_attempts: Option<u64>) -> Self {
        self.config.max_attempts = max_attempts;
        self
    }

    /// Sets the handshake timeout.
    #[inline]
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Sets the outbox policy.
    #[inline]
    #[must_use]
    pub fn outbox(mut self, policy: OutboxPolicy) -> Self {
        self.config.outbox = policy;
        self
    }

    /// Substitutes the channel factory.
    #[inline]
    #[must_use]
    pub fn connector(mut self, connector: impl Connector) -> Self {
        self.connector = Arc::new(connector);
        self
    }

    /// Builds the transport with validation.
    ///
    /// The transport starts `Disconnected`; call [`Transport::connect`].
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidEndpoint`](crate::Error::InvalidEndpoint) if the endpoint is unusable
    /// - [`Error::Config`](crate::Error::Config) if a setting is out of range
    pub fn build(self) -> Result<Transport> {
        let options = self.config.validate()?;
        Ok(Transport::new(options, self.connector))
    }
}

// ============================================================================
// Tests
// ============================================================================
