//! Wire event message type.
//!
//! Every frame on the duplex channel, in either direction, is one JSON text
//! message carrying an event name and an opaque payload.
//!
//! # Format
//!
//! ```json
//! { "name": "bot_uttered", "payload": { "text": "hi" } }
//! ```
//!
//! No schema validation happens here: the payload is handed to handlers
//! exactly as received.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Value, from_str, to_string};

use crate::error::{Error, Result};

// ============================================================================
// Lifecycle Event Names
// ============================================================================

/// Emitted after every successful connect.
pub const CONNECT: &str = "connect";

/// Emitted when an established connection is lost or closed.
pub const DISCONNECT: &str = "disconnect";

/// Emitted when a connect attempt or handshake fails.
pub const CONNECT_ERROR: &str = "connect_error";

/// Emitted before each reconnect attempt, payload is the attempt number.
pub const RECONNECT_ATTEMPT: &str = "reconnect_attempt";

/// Emitted after a successful reconnect, payload is the attempts it took.
pub const RECONNECT: &str = "reconnect";

/// Emitted when a bounded attempt budget runs out.
pub const RECONNECT_FAILED: &str = "reconnect_failed";

/// All lifecycle names synthesized locally by the transport.
pub const LIFECYCLE_EVENTS: &[&str] = &[
    CONNECT,
    DISCONNECT,
    CONNECT_ERROR,
    RECONNECT_ATTEMPT,
    RECONNECT,
    RECONNECT_FAILED,
];

// ============================================================================
// Event
// ============================================================================

/// A named event with an opaque JSON payload.
///
/// Used for inbound events delivered by the remote end, for lifecycle
/// events synthesized by the transport, and for outbound emissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event name, e.g. `bot_uttered`.
    pub name: String,

    /// Event data. Missing on the wire means `null`.
    #[serde(default)]
    pub payload: Value,
}

impl Event {
    /// Creates a new event.
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    /// Parses a text frame into an event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the frame is not a JSON object with a
    /// string `name`.
    pub fn from_frame(text: &str) -> Result<Self> {
        from_str::<Self>(text).map_err(|e| Error::protocol(format!("malformed frame: {e}")))
    }

    /// Serializes the event into a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the payload cannot be serialized.
    pub fn to_frame(&self) -> Result<String> {
        Ok(to_string(self)?)
    }

    /// Returns `true` if the transport synthesized this event locally.
    #[inline]
    #[must_use]
    pub fn is_lifecycle(&self) -> bool {
        LIFECYCLE_EVENTS.contains(&self.name.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================
