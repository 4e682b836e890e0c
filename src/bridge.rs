//! Bridge bootstrap.
//!
//! [`Bridge`] wires a [`Transport`], an [`EventRouter`] and a
//! [`SessionTracker`] around an application store. It is the one object an
//! application needs to hold.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use assistant_socket::store::AppStore;
//! use assistant_socket::{Bridge, BridgeConfig};
//!
//! # async fn example() -> assistant_socket::Result<()> {
//! let store = Arc::new(AppStore::new(Vec::<String>::new()));
//! store.register_mutation("SOCKET_bot_uttered", |log: &mut Vec<String>, payload| {
//!     log.push(payload["text"].as_str().unwrap_or_default().to_string());
//! });
//!
//! let config = BridgeConfig::from_json_str(r#"{ "transport": { "origin": "ws://localhost:5005" } }"#)?;
//! let bridge = Bridge::new(config, store)?;
//! bridge.start()?;
//! bridge.send_utterance("hello");
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::identifiers::SessionId;
use crate::protocol::UserUtterance;
use crate::protocol::assistant::USER_UTTERED;
use crate::router::{EventRouter, RouterOptions};
use crate::session::{SessionOptions, SessionTracker};
use crate::store::{Action, SharedStore, Store};
use crate::transport::{Transport, TransportConfig};

// ============================================================================
// BridgeConfig
// ============================================================================

/// Complete bridge configuration.
///
/// Every section has defaults, so `{}` is a valid document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Connection settings.
    pub transport: TransportConfig,
    /// Naming convention.
    pub router: RouterOptions,
    /// Session handshake.
    pub session: SessionOptions,
}

impl BridgeConfig {
    /// Parses a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if the document is not
    /// valid JSON or has fields of the wrong type.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ============================================================================
// Bridge
// ============================================================================

/// Transport, router and session tracker bound to one store.
///
/// Dropping the bridge shuts it down.
pub struct Bridge {
    store: SharedStore,
    transport: Transport,
    router: EventRouter,
    session: SessionTracker,
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("transport", &self.transport)
            .field("router", &self.router)
            .field("session", &self.session_id())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Bridge - Constructors
// ============================================================================

impl Bridge {
    /// Validates `config` and wires everything up. Does not connect.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the endpoint or a prefix is invalid.
    pub fn new(config: BridgeConfig, store: SharedStore) -> Result<Self> {
        let transport = Transport::builder().config(config.transport).build()?;
        Self::with_transport(transport, config.router, config.session, store)
    }

    /// Wires a prepared transport.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a prefix is invalid.
    pub fn with_transport(
        transport: Transport,
        router: RouterOptions,
        session: SessionOptions,
        store: SharedStore,
    ) -> Result<Self> {
        let router = EventRouter::new(router, store.clone(), transport.clone())?;
        let session = SessionTracker::new(session, transport.clone());

        session.attach();
        router.attach();

        Ok(Self {
            store,
            transport,
            router,
            session,
        })
    }
}

// ============================================================================
// Bridge - Lifecycle
// ============================================================================

impl Bridge {
    /// Starts connecting.
    ///
    /// # Errors
    ///
    /// See [`Transport::connect`].
    pub fn start(&self) -> Result<()> {
        info!(endpoint = %self.transport.endpoint(), "Starting assistant bridge");
        self.transport.connect()
    }

    /// Detaches the router and session tracker and shuts the transport down.
    ///
    /// Idempotent.
    pub fn shutdown(&self) {
        self.router.detach();
        self.session.detach();
        self.transport.shutdown();
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ============================================================================
// Bridge - Messaging
// ============================================================================

impl Bridge {
    /// Sends a user message through the store.
    ///
    /// Dispatches a local `<reserved_prefix>user_uttered` action, so store
    /// subscribers observe it before the router forwards it.
    pub fn send_utterance(&self, text: impl Into<String>) {
        let payload = UserUtterance::new(text)
            .with_session(self.session.session_id())
            .to_payload();
        let name = format!("{}{USER_UTTERED}", self.router.options().reserved_prefix);

        self.store.dispatch(Action::new(name, payload));
    }

    /// Returns the confirmed session, if any.
    #[inline]
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.session.session_id()
    }
}

// ============================================================================
// Bridge - Accessors
// ============================================================================

impl Bridge {
    /// Returns the store.
    #[inline]
    #[must_use]
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Returns the transport.
    #[inline]
    #[must_use]
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Returns the router.
    #[inline]
    #[must_use]
    pub fn router(&self) -> &EventRouter {
        &self.router
    }
}

// ============================================================================
// Tests
// ============================================================================
