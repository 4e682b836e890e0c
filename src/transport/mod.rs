//! WebSocket transport layer.
//!
//! This module maintains one persistent duplex channel to the assistant
//! backend and surfaces its lifecycle.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐                              ┌──────────────────┐
//! │  Transport       │                              │  Assistant       │
//! │  (handles)       │         WebSocket            │  backend         │
//! │      │ commands  │◄────────────────────────────►│                  │
//! │      ▼           │     {"name", "payload"}      │                  │
//! │  Supervisor task │                              │                  │
//! └──────────────────┘                              └──────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Transport::builder().build()` - Validate options, state `Disconnected`
//! 2. `Transport::connect` - Spawn the supervisor, state `Connecting`
//! 3. Handshake succeeds - state `Connected`, buffered events are flushed
//! 4. Error or remote close - state `Reconnecting`, wait the fixed delay,
//!    then back to `Connecting`; repeats without limit by default
//! 5. `Transport::shutdown` - close, cancel the timer, state `Disconnected`
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `builder` | Fluent transport configuration |
//! | `connection` | Supervisor task and event loop |
//! | `connector` | Channel establishment seam and WebSocket connector |
//! | `core` | The `Transport` handle |
//! | `handlers` | Event handler registry |
//! | `options` | Raw and validated settings |
//! | `outbox` | Send-while-disconnected policy |
//! | `state` | Connection state machine |

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder for transports.
pub mod builder;

/// Supervisor task and event loop.
mod connection;

/// Channel establishment.
pub mod connector;

/// Transport handle.
pub mod core;

/// Event handler registry.
pub mod handlers;

/// Transport settings.
pub mod options;

/// Outbound queue policy.
pub mod outbox;

/// Connection state machine.
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::TransportBuilder;
pub use connector::{Connector, Duplex, FrameSink, FrameStream, WsConnector};
pub use self::core::Transport;
pub use handlers::{EventHandler, StateListener};
pub use options::{TransportConfig, TransportOptions};
pub use outbox::OutboxPolicy;
pub use state::{ConnectionState, StateTransition, TransitionCause};
