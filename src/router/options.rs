//! Router naming convention.
//!
//! | Direction | Input | Output |
//! |-----------|-------|--------|
//! | Inbound | event `X` | mutation `<mutation_prefix>X`, action `<action_prefix>X` |
//! | Outbound | action `<reserved_prefix>Y` | wire event `transform(Y)` |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default prefix for mutations, actions and outbound actions.
pub const DEFAULT_PREFIX: &str = "SOCKET_";

// ============================================================================
// EventNameTransform
// ============================================================================

/// Rename applied to an outbound event name after the reserved prefix is
/// stripped. Identity by default.
#[derive(Clone)]
pub struct EventNameTransform(Arc<dyn Fn(&str) -> String + Send + Sync>);

impl EventNameTransform {
    /// Wraps a rename function.
    pub fn new<F>(transform: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self(Arc::new(transform))
    }

    /// Leaves names unchanged.
    #[must_use]
    pub fn identity() -> Self {
        Self::new(|name: &str| name.to_string())
    }

    /// Applies the rename.
    #[inline]
    #[must_use]
    pub fn apply(&self, name: &str) -> String {
        (self.0)(name)
    }
}

impl Default for EventNameTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Debug for EventNameTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EventNameTransform(..)")
    }
}

// ============================================================================
// RouterOptions
// ============================================================================

/// Prefixes and rename used by the event router.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterOptions {
    /// Prefix turning an inbound event name into a mutation name.
    pub mutation_prefix: String,

    /// Prefix turning an inbound event name into an action name.
    pub action_prefix: String,

    /// Prefix marking an action for outbound forwarding.
    pub reserved_prefix: String,

    /// Rename applied to outbound event names.
    #[serde(skip)]
    pub event_name_transform: EventNameTransform,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            mutation_prefix: DEFAULT_PREFIX.to_string(),
            action_prefix: DEFAULT_PREFIX.to_string(),
            reserved_prefix: DEFAULT_PREFIX.to_string(),
            event_name_transform: EventNameTransform::default(),
        }
    }
}

// ============================================================================
// RouterOptions - Builder Methods
// ============================================================================

impl RouterOptions {
    /// Uses `prefix` for all three directions.
    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            mutation_prefix: prefix.clone(),
            action_prefix: prefix.clone(),
            reserved_prefix: prefix,
            event_name_transform: EventNameTransform::default(),
        }
    }

    /// Sets the mutation prefix.
    #[must_use]
    pub fn mutation_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.mutation_prefix = prefix.into();
        self
    }

    /// Sets the action prefix.
    #[must_use]
    pub fn action_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.action_prefix = prefix.into();
        self
    }

    /// Sets the reserved outbound prefix.
    #[must_use]
    pub fn reserved_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.reserved_prefix = prefix.into();
        self
    }

    /// Sets the outbound rename.
    #[must_use]
    pub fn event_name_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.event_name_transform = EventNameTransform::new(transform);
        self
    }

    /// Checks that every prefix is non-empty and free of whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the offending prefix.
    pub fn validate(&self) -> Result<()> {
        for (field, prefix) in [
            ("mutation_prefix", &self.mutation_prefix),
            ("action_prefix", &self.action_prefix),
            ("reserved_prefix", &self.reserved_prefix),
        ] {
            if prefix.is_empty() {
                return Err(Error::config(format!("{field} must not be empty")));
            }
            if prefix.chars().any(char::is_whitespace) {
                return Err(Error::config(format!(
                    "{field} must not contain whitespace: {prefix:?}"
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// RouterOptions - Naming
// ============================================================================

impl RouterOptions {
    /// Mutation committed for inbound event `event`.
    #[inline]
    #[must_use]
    pub fn mutation_name(&self, event: &str) -> String {
        format!("{}{event}", self.mutation_prefix)
    }

    /// Action dispatched for inbound event `event`.
    #[inline]
    #[must_use]
    pub fn action_name(&self, event: &str) -> String {
        format!("{}{event}", self.action_prefix)
    }

    /// Wire event name for action `action`, or `None` if the action is not
    /// marked for forwarding.
    ///
    /// An action named exactly the reserved prefix has nothing left to send
    /// and yields `None`.
    #[must_use]
    pub fn outbound_event_name(&self, action: &str) -> Option<String> {
        let stripped = action.strip_prefix(self.reserved_prefix.as_str())?;
        if stripped.is_empty() {
            return None;
        }
        Some(self.event_name_transform.apply(stripped))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prefixes() {
        let options = RouterOptions::default();
        assert_eq!(options.mutation_name("bot_uttered"), "SOCKET_bot_uttered");
        assert_eq!(options.action_name("bot_uttered"), "SOCKET_bot_uttered");
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_distinct_prefixes() {
        let options = RouterOptions::default()
            .mutation_prefix("SET_")
            .action_prefix("ON_");
        assert_eq!(options.mutation_name("typing"), "SET_typing");
        assert_eq!(options.action_name("typing"), "ON_typing");
    }

    #[test]
    fn test_outbound_strips_reserved_prefix() {
        let options = RouterOptions::default();
        assert_eq!(
            options.outbound_event_name("SOCKET_user_uttered").as_deref(),
            Some("user_uttered")
        );
        assert_eq!(options.outbound_event_name("OTHER_foo"), None);
        assert_eq!(options.outbound_event_name("SOCKET_"), None);
        assert_eq!(options.outbound_event_name("socket_user_uttered"), None);
    }

    #[test]
    fn test_outbound_transform() {
        let options = RouterOptions::default().event_name_transform(|name| name.to_uppercase());
        assert_eq!(
            options.outbound_event_name("SOCKET_user_uttered").as_deref(),
            Some("USER_UTTERED")
        );
    }

    #[test]
    fn test_validate_rejects_bad_prefixes() {
        let err = RouterOptions::default().mutation_prefix("").validate().unwrap_err();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("mutation_prefix"));

        let err = RouterOptions::default().reserved_prefix("SOCKET ").validate().unwrap_err();
        assert!(err.to_string().contains("reserved_prefix"));
    }

    #[test]
    fn test_deserialize_partial() {
        let options: RouterOptions =
            serde_json::from_str(r#"{ "action_prefix": "ACT_" }"#).expect("parse");
        assert_eq!(options.action_prefix, "ACT_");
        assert_eq!(options.mutation_prefix, DEFAULT_PREFIX);
        assert_eq!(
            options.outbound_event_name("SOCKET_x").as_deref(),
            Some("x")
        );
    }
}
