//! Store actions.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use serde_json::Value;

// ============================================================================
// ActionOrigin
// ============================================================================

/// Where an action was dispatched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ActionOrigin {
    /// Application code. Candidate for outbound forwarding.
    #[default]
    Local,
    /// Mirrored from an inbound event. Never forwarded back out.
    Remote,
}

// ============================================================================
// Action
// ============================================================================

/// A named store operation with an opaque payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    /// Action name, e.g. `SOCKET_user_uttered`.
    pub name: String,
    /// Action data.
    pub payload: Value,
    /// Dispatch origin.
    pub origin: ActionOrigin,
}

impl Action {
    /// Creates a locally originated action.
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
            origin: ActionOrigin::Local,
        }
    }

    /// Creates an action mirrored from an inbound event.
    #[inline]
    #[must_use]
    pub fn remote(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
            origin: ActionOrigin::Remote,
        }
    }

    /// Returns `true` if application code dispatched this action.
    #[inline]
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.origin == ActionOrigin::Local
    }
}

// ============================================================================
// Types
// ============================================================================

/// Callback observing every dispatched action, before its handler runs.
pub type ActionSubscriber = Arc<dyn Fn(&Action) + Send + Sync>;
