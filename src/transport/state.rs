//! Connection state machine.
//!
//! ```text
//!                 Start            Established
//! Disconnected ─────────► Connecting ─────────► Connected
//!       ▲                  ▲    │                 │   │
//!       │            Retry │    │ Failure Failure │   │ Explicit
//!       │                  │    ▼                 ▼   │
//!       │                 Reconnecting ◄──────────┘   │
//!       │                                              │
//!       └──── Shutdown / Exhausted (from any state)    └──► Connecting
//! ```
//!
//! An error never moves `Connected` straight to `Connecting`; only an
//! explicit reconnect request does.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle state of the duplex channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// No connection and none pending. Initial and terminal state.
    #[default]
    Disconnected,
    /// A connect attempt is in flight.
    Connecting,
    /// The channel is open.
    Connected,
    /// Waiting out the reconnect delay after a failure.
    Reconnecting,
}

impl ConnectionState {
    /// Returns `true` if moving to `next` for `cause` is a legal transition.
    #[must_use]
    pub fn can_transition(self, next: Self, cause: TransitionCause) -> bool {
        use ConnectionState::{Connected, Connecting, Disconnected, Reconnecting};
        use TransitionCause::{Established, Exhausted, Explicit, Failure, Retry, Shutdown, Start};

        match (self, next) {
            (Disconnected, Connecting) => cause == Start,
            (Connecting, Connected) => cause == Established,
            (Connecting | Connected, Reconnecting) => cause == Failure,
            (Reconnecting, Connecting) => cause == Retry,
            (Connected, Connecting) => cause == Explicit,
            (Connecting | Connected | Reconnecting, Disconnected) => {
                matches!(cause, Shutdown | Exhausted)
            }
            _ => false,
        }
    }

    /// Returns `true` while the channel is open.
    #[inline]
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
        };
        f.write_str(name)
    }
}

// ============================================================================
// TransitionCause
// ============================================================================

/// Why a state transition happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionCause {
    /// `connect()` was called.
    Start,
    /// The handshake completed.
    Established,
    /// Network error, remote close or failed handshake.
    Failure,
    /// The reconnect delay elapsed.
    Retry,
    /// `reconnect()` was called on an open connection.
    Explicit,
    /// `shutdown()` was called or every handle was dropped.
    Shutdown,
    /// Reconnection is disabled or the attempt budget ran out.
    Exhausted,
}

// ============================================================================
// StateTransition
// ============================================================================

/// A recorded state change, passed to state listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    /// State before the change.
    pub from: ConnectionState,
    /// State after the change.
    pub to: ConnectionState,
    /// What triggered it.
    pub cause: TransitionCause,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use ConnectionState::{Connected, Connecting, Disconnected, Reconnecting};

    const STATES: [ConnectionState; 4] = [Disconnected, Connecting, Connected, Reconnecting];
    const CAUSES: [TransitionCause; 7] = [
        TransitionCause::Start,
        TransitionCause::Established,
        TransitionCause::Failure,
        TransitionCause::Retry,
        TransitionCause::Explicit,
        TransitionCause::Shutdown,
        TransitionCause::Exhausted,
    ];

    #[test]
    fn test_happy_path() {
        assert!(Disconnected.can_transition(Connecting, TransitionCause::Start));
        assert!(Connecting.can_transition(Connected, TransitionCause::Established));
        assert!(Connected.can_transition(Reconnecting, TransitionCause::Failure));
        assert!(Reconnecting.can_transition(Connecting, TransitionCause::Retry));
        assert!(Connected.can_transition(Disconnected, TransitionCause::Shutdown));
    }

    #[test]
    fn test_error_never_skips_reconnecting() {
        assert!(!Connected.can_transition(Connecting, TransitionCause::Failure));
        assert!(!Connected.can_transition(Connecting, TransitionCause::Retry));
        assert!(Connected.can_transition(Connecting, TransitionCause::Explicit));
    }

    #[test]
    fn test_disconnected_is_terminal_except_start() {
        for next in STATES {
            for cause in CAUSES {
                let allowed = Disconnected.can_transition(next, cause);
                assert_eq!(allowed, next == Connecting && cause == TransitionCause::Start);
            }
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Reconnecting.to_string(), "reconnecting");
        assert!(Connected.is_connected());
        assert!(!Connecting.is_connected());
    }

    proptest! {
        #[test]
        fn prop_failure_from_connected_goes_through_reconnecting(
            steps in proptest::collection::vec((0usize..4, 0usize..7), 0..64)
        ) {
            let mut state = Disconnected;
            for (next, cause) in steps {
                let next = STATES[next];
                let cause = CAUSES[cause];
                if state.can_transition(next, cause) {
                    if state == Connected && next == Connecting {
                        prop_assert_eq!(cause, TransitionCause::Explicit);
                    }
                    if state == Connected && cause == TransitionCause::Failure {
                        prop_assert_eq!(next, Reconnecting);
                    }
                    state = next;
                }
            }
        }
    }
}
