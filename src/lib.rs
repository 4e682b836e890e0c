//! Assistant Socket - realtime bridge between a conversational assistant
//! backend and an application state store.
//!
//! This library keeps one persistent WebSocket channel to the assistant and
//! maps its traffic onto a store through a prefix naming convention.
//!
//! # Architecture
//!
//! ```text
//!  backend ◄──── WebSocket ────► Transport ──on_any──► EventRouter ──► Store
//!                                    ▲                     │            │
//!                                    └─────── send ────────┘◄─ actions ─┘
//! ```
//!
//! Key design principles:
//!
//! - The transport never gives up: failures become a fixed-delay retry loop
//! - Inbound event `X` becomes `mutate(prefix + X)` then `dispatch(prefix + X)`
//! - Local actions named `SOCKET_Y` are sent as wire event `Y`
//! - The store is passed in explicitly, so tests can substitute their own
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use assistant_socket::store::AppStore;
//! use assistant_socket::{Bridge, BridgeConfig, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let store = Arc::new(AppStore::new(Vec::<String>::new()));
//!     store.register_mutation("SOCKET_bot_uttered", |log: &mut Vec<String>, payload| {
//!         log.push(payload["text"].as_str().unwrap_or_default().to_string());
//!     });
//!
//!     let bridge = Bridge::new(BridgeConfig::default(), store.clone())?;
//!     bridge.start()?;
//!     bridge.send_utterance("hello");
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`bridge`] | One-call bootstrap: [`Bridge`], [`BridgeConfig`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Wire events and assistant payloads |
//! | [`router`] | Event to store naming convention |
//! | [`session`] | Session handshake |
//! | [`store`] | Store contract and reference store |
//! | [`transport`] | Reconnecting WebSocket transport |

// ============================================================================
// Modules
// ============================================================================

/// Bridge bootstrap.
///
/// Use [`Bridge::new`] to wire a transport and router around a store.
pub mod bridge;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Wire event format and assistant payloads.
pub mod protocol;

/// Transport to store routing.
pub mod router;

/// Session handshake with the assistant backend.
pub mod session;

/// Application state store.
pub mod store;

/// Reconnecting WebSocket transport.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Bridge types
pub use bridge::{Bridge, BridgeConfig};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{SessionId, SubscriptionId};

// Protocol types
pub use protocol::{AssistantEvent, Event};

// Router types
pub use router::{EventRouter, RouterOptions};

// Session types
pub use session::{SessionOptions, SessionTracker};

// Store types
pub use store::{Action, ActionOrigin, AppStore, SharedStore, Store};

// Transport types
pub use transport::{ConnectionState, OutboxPolicy, Transport, TransportBuilder, TransportConfig};
