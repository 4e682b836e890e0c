//! Assistant conversation events.
//!
//! Typed views over the events exchanged with the assistant backend's
//! socket channel.
//!
//! | Event | Direction | Payload |
//! |-------|-----------|---------|
//! | `session_request` | Local → Remote | `{ "session_id": string \| null }` |
//! | `session_confirm` | Remote → Local | `string` (or `{ "session_id": string }`) |
//! | `user_uttered` | Local → Remote | `{ "message": string, "session_id": string? }` |
//! | `user_uttered` | Remote → Local | `{ "text": string }` (transcript echo) |
//! | `bot_uttered` | Remote → Local | `{ "text": string, "link": string? }` |

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde_json::{Value, json};

use crate::identifiers::SessionId;

use super::Event;

// ============================================================================
// Event Names
// ============================================================================

/// Assistant reply.
pub const BOT_UTTERED: &str = "bot_uttered";

/// User message (outbound) or its transcript (inbound).
pub const USER_UTTERED: &str = "user_uttered";

/// Session handshake request.
pub const SESSION_REQUEST: &str = "session_request";

/// Session handshake answer.
pub const SESSION_CONFIRM: &str = "session_confirm";

// ============================================================================
// AssistantEvent
// ============================================================================

/// Parsed inbound event for type-safe handling.
///
/// Parsing is lenient: missing fields become empty strings or `None`,
/// mirroring the pass-through contract of the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum AssistantEvent {
    /// The assistant said something.
    BotUttered {
        /// Reply text.
        text: String,
        /// URL of a synthesized audio rendition, if any.
        link: Option<String>,
    },

    /// The backend echoed what it understood from the user.
    UserUttered {
        /// Transcript text.
        text: String,
    },

    /// The backend confirmed a conversation session.
    SessionConfirm {
        /// Confirmed session.
        session_id: SessionId,
    },

    /// Any other event.
    Unknown {
        /// Event name.
        name: String,
        /// Event payload.
        payload: Value,
    },
}

impl AssistantEvent {
    /// Parses an event into a typed variant.
    #[must_use]
    pub fn parse(event: &Event) -> Self {
        match event.name.as_str() {
            BOT_UTTERED => Self::BotUttered {
                text: string_field(&event.payload, "text"),
                link: optional_string_field(&event.payload, "link"),
            },

            USER_UTTERED => Self::UserUttered {
                text: string_field(&event.payload, "text"),
            },

            SESSION_CONFIRM => {
                let raw = event
                    .payload
                    .as_str()
                    .map(str::to_owned)
                    .unwrap_or_else(|| string_field(&event.payload, "session_id"));
                Self::SessionConfirm {
                    session_id: SessionId::new(raw),
                }
            }

            _ => Self::Unknown {
                name: event.name.clone(),
                payload: event.payload.clone(),
            },
        }
    }
}

// ============================================================================
// Outbound Payloads
// ============================================================================

/// Payload of `session_request`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRequest {
    /// Session to resume, `null` to ask for a fresh one.
    pub session_id: Option<SessionId>,
}

impl SessionRequest {
    /// Converts the request into an outbound event.
    #[must_use]
    pub fn into_event(self) -> Event {
        Event::new(SESSION_REQUEST, json!({ "session_id": self.session_id }))
    }
}

/// Payload of an outbound `user_uttered`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserUtterance {
    /// What the user said or typed.
    pub message: String,
    /// Session the message belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
}

impl UserUtterance {
    /// Creates an utterance without a session.
    #[inline]
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            session_id: None,
        }
    }

    /// Attaches a session.
    #[inline]
    #[must_use]
    pub fn with_session(mut self, session_id: Option<SessionId>) -> Self {
        self.session_id = session_id;
        self
    }

    /// Returns the payload as a JSON value.
    #[must_use]
    pub fn to_payload(&self) -> Value {
        let mut payload = json!({ "message": self.message });
        if let (Some(session_id), Some(map)) = (&self.session_id, payload.as_object_mut()) {
            map.insert("session_id".into(), Value::String(session_id.to_string()));
        }
        payload
    }
}

// ============================================================================
// Field Helpers
// ============================================================================

/// Gets a string field, empty when absent.
#[inline]
fn string_field(payload: &Value, key: &str) -> String {
    payload
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Gets an optional string field.
#[inline]
fn optional_string_field(payload: &Value, key: &str) -> Option<String> {
    payload.get(key).and_then(Value::as_str).map(str::to_owned)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bot_uttered_parsing() {
        let event = Event::new(
            BOT_UTTERED,
            json!({ "text": "Your pizza is on the way", "link": "http://localhost:8888/1.wav" }),
        );

        match AssistantEvent::parse(&event) {
            AssistantEvent::BotUttered { text, link } => {
                assert_eq!(text, "Your pizza is on the way");
                assert_eq!(link.as_deref(), Some("http://localhost:8888/1.wav"));
            }
            other => panic!("unexpected parsed event: {other:?}"),
        }
    }

    #[test]
    fn test_bot_uttered_without_link() {
        let event = Event::new(BOT_UTTERED, json!({ "text": "hi" }));
        assert_eq!(
            AssistantEvent::parse(&event),
            AssistantEvent::BotUttered {
                text: "hi".into(),
                link: None
            }
        );
    }

    #[test]
    fn test_session_confirm_bare_string() {
        let event = Event::new(SESSION_CONFIRM, json!("f00d"));
        assert_eq!(
            AssistantEvent::parse(&event),
            AssistantEvent::SessionConfirm {
                session_id: SessionId::new("f00d")
            }
        );
    }

    #[test]
    fn test_session_confirm_object() {
        let event = Event::new(SESSION_CONFIRM, json!({ "session_id": "beef" }));
        assert_eq!(
            AssistantEvent::parse(&event),
            AssistantEvent::SessionConfirm {
                session_id: SessionId::new("beef")
            }
        );
    }

    #[test]
    fn test_malformed_payload_is_lenient() {
        let event = Event::new(BOT_UTTERED, json!(42));
        assert_eq!(
            AssistantEvent::parse(&event),
            AssistantEvent::BotUttered {
                text: String::new(),
                link: None
            }
        );
    }

    #[test]
    fn test_unknown_event() {
        let event = Event::new("typing", json!({ "on": true }));
        match AssistantEvent::parse(&event) {
            AssistantEvent::Unknown { name, payload } => {
                assert_eq!(name, "typing");
                assert_eq!(payload, json!({ "on": true }));
            }
            other => panic!("expected Unknown variant, got {other:?}"),
        }
    }

    #[test]
    fn test_session_request_event() {
        let event = SessionRequest { session_id: None }.into_event();
        assert_eq!(event.name, SESSION_REQUEST);
        assert_eq!(event.payload, json!({ "session_id": null }));

        let event = SessionRequest {
            session_id: Some(SessionId::new("abc")),
        }
        .into_event();
        assert_eq!(event.payload, json!({ "session_id": "abc" }));
    }

    #[test]
    fn test_user_utterance_payload() {
        let plain = UserUtterance::new("hello");
        assert_eq!(plain.to_payload(), json!({ "message": "hello" }));

        let with_session = UserUtterance::new("hello").with_session(Some(SessionId::new("s1")));
        assert_eq!(
            with_session.to_payload(),
            json!({ "message": "hello", "session_id": "s1" })
        );
    }
}
