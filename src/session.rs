//! Conversation session handshake.
//!
//! The assistant backend expects a `session_request` after every connect
//! and answers with `session_confirm`. [`SessionTracker`] performs that
//! exchange and remembers the confirmed [`SessionId`], so a reconnect can
//! resume the same conversation.
//!
//! ```text
//! client                                backend
//!   │── connect ─────────────────────────►│
//!   │── session_request {session_id} ────►│
//!   │◄──────────── session_confirm {id} ──│
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::identifiers::{SessionId, SubscriptionId};
use crate::protocol::assistant::SESSION_CONFIRM;
use crate::protocol::event::CONNECT;
use crate::protocol::{AssistantEvent, Event, SessionRequest};
use crate::transport::Transport;

// ============================================================================
// SessionOptions
// ============================================================================

/// Session handshake settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Perform the handshake at all.
    pub enabled: bool,

    /// Ask to resume the last confirmed session after a reconnect.
    pub persistence: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            persistence: true,
        }
    }
}

// ============================================================================
// SessionTracker
// ============================================================================

/// Requests a session on every connect and records the confirmation.
#[derive(Debug)]
pub struct SessionTracker {
    options: SessionOptions,
    transport: Transport,
    /// Last confirmed session.
    session: Arc<RwLock<Option<SessionId>>>,
    /// Handler subscriptions on the transport.
    subscriptions: Mutex<Vec<SubscriptionId>>,
}

impl SessionTracker {
    /// Creates a detached tracker.
    #[must_use]
    pub fn new(options: SessionOptions, transport: Transport) -> Self {
        Self {
            options,
            transport,
            session: Arc::new(RwLock::new(None)),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// Returns the settings.
    #[inline]
    #[must_use]
    pub fn options(&self) -> SessionOptions {
        self.options
    }

    /// Returns the last confirmed session.
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.session.read().clone()
    }

    /// Hooks the transport. Does nothing when disabled or already attached.
    pub fn attach(&self) {
        if !self.options.enabled {
            debug!("Session handshake disabled");
            return;
        }

        let mut subscriptions = self.subscriptions.lock();
        if !subscriptions.is_empty() {
            warn!("Session tracker already attached, ignoring");
            return;
        }

        let on_connect = {
            let transport = self.transport.clone();
            let session = Arc::clone(&self.session);
            let persistence = self.options.persistence;
            self.transport.on_event(CONNECT, move |_: &Event| {
                let session_id = if persistence {
                    session.read().clone()
                } else {
                    None
                };
                debug!(session_id = ?session_id, "Requesting session");
                transport.emit(SessionRequest { session_id }.into_event());
            })
        };

        let on_confirm = {
            let session = Arc::clone(&self.session);
            self.transport.on_event(SESSION_CONFIRM, move |event: &Event| {
                let AssistantEvent::SessionConfirm { session_id } = AssistantEvent::parse(event)
                else {
                    return;
                };
                if session_id.as_str().is_empty() {
                    warn!(payload = %event.payload, "session_confirm without a session id");
                    return;
                }
                info!(%session_id, "Session confirmed");
                *session.write() = Some(session_id);
            })
        };

        subscriptions.extend([on_connect, on_confirm]);
    }

    /// Removes the transport hooks. The recorded session is kept.
    pub fn detach(&self) {
        for id in self.subscriptions.lock().drain(..) {
            self.transport.off(id);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::{Value, json};
    use tokio::sync::Notify;

    use crate::protocol::assistant::SESSION_REQUEST;
    use crate::transport::testing::ScriptedConnector;

    fn notify_on(transport: &Transport, name: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        let clone = Arc::clone(&notify);
        transport.on_event(name, move |_: &Event| clone.notify_one());
        notify
    }

    fn tracked(options: SessionOptions) -> (SessionTracker, Transport, ScriptedConnector) {
        let connector = ScriptedConnector::new();
        let transport = Transport::builder()
            .connector(connector.clone())
            .build()
            .expect("build");
        let tracker = SessionTracker::new(options, transport.clone());
        tracker.attach();
        (tracker, transport, connector)
    }

    #[test]
    fn test_options_deserialize_partial() {
        let options: SessionOptions =
            serde_json::from_str(r#"{ "persistence": false }"#).expect("parse");
        assert!(options.enabled);
        assert!(!options.persistence);
    }

    #[tokio::test]
    async fn test_requests_and_records_session() {
        let (tracker, transport, connector) = tracked(SessionOptions::default());
        let done = notify_on(&transport, "done");

        transport.connect().expect("connect");
        let mut server = connector.accept().await;

        let request = server.next_event().await.expect("session_request");
        assert_eq!(request, Event::new(SESSION_REQUEST, json!({ "session_id": null })));

        server.push(r#"{"name":"session_confirm","payload":{"session_id":"abc"}}"#);
        server.push(r#"{"name":"done"}"#);
        done.notified().await;

        assert_eq!(tracker.session_id(), Some(SessionId::from("abc")));
        tracker.detach();
        transport.shutdown();
    }

    #[tokio::test]
    async fn test_reconnect_resumes_session() {
        let (tracker, transport, connector) = tracked(SessionOptions::default());
        let done = notify_on(&transport, "done");

        transport.connect().expect("connect");
        let mut first = connector.accept().await;
        first.next_event().await.expect("session_request");
        first.push(r#"{"name":"session_confirm","payload":"abc"}"#);
        first.push(r#"{"name":"done"}"#);
        done.notified().await;

        transport.reconnect();
        let mut second = connector.accept().await;
        let request = second.next_event().await.expect("session_request");

        assert_eq!(request.payload, json!({ "session_id": "abc" }));
        tracker.detach();
        transport.shutdown();
    }

    #[tokio::test]
    async fn test_without_persistence_requests_fresh_session() {
        let options = SessionOptions {
            persistence: false,
            ..SessionOptions::default()
        };
        let (tracker, transport, connector) = tracked(options);
        let done = notify_on(&transport, "done");

        transport.connect().expect("connect");
        let mut first = connector.accept().await;
        first.next_event().await.expect("session_request");
        first.push(r#"{"name":"session_confirm","payload":"abc"}"#);
        first.push(r#"{"name":"done"}"#);
        done.notified().await;

        transport.reconnect();
        let mut second = connector.accept().await;
        let request = second.next_event().await.expect("session_request");

        assert_eq!(request.payload, json!({ "session_id": null }));
        assert_eq!(tracker.session_id(), Some(SessionId::from("abc")));
        tracker.detach();
        transport.shutdown();
    }

    #[tokio::test]
    async fn test_empty_confirmation_is_ignored() {
        let (tracker, transport, connector) = tracked(SessionOptions::default());
        let done = notify_on(&transport, "done");

        transport.connect().expect("connect");
        let server = connector.accept().await;
        server.push(r#"{"name":"session_confirm","payload":{}}"#);
        server.push(r#"{"name":"done"}"#);
        done.notified().await;

        assert_eq!(tracker.session_id(), None);
        tracker.detach();
        transport.shutdown();
    }

    #[tokio::test]
    async fn test_disabled_tracker_stays_silent() {
        let options = SessionOptions {
            enabled: false,
            ..SessionOptions::default()
        };
        let (tracker, transport, connector) = tracked(options);
        let connected = notify_on(&transport, CONNECT);

        transport.connect().expect("connect");
        let mut server = connector.accept().await;
        connected.notified().await;
        transport.send("marker", Value::Null);

        assert_eq!(server.next_event().await.map(|e| e.name).as_deref(), Some("marker"));
        tracker.detach();
        transport.shutdown();
    }
}
