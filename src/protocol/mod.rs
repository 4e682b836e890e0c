//! WebSocket protocol message types.
//!
//! This module defines the message format for communication between the
//! client (Rust) and the assistant backend.
//!
//! # Protocol Overview
//!
//! | Message | Direction | Purpose |
//! |---------|-----------|---------|
//! | [`Event`] | Remote → Local | Assistant notification (reply, typing, restart) |
//! | [`Event`] | Local → Remote | User action |
//! | lifecycle [`Event`] | Transport → Local | Connect / disconnect / reconnect |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `assistant` | Typed assistant events and outbound payloads |
//! | `event` | Wire event type and lifecycle event names |

// ============================================================================
// Submodules
// ============================================================================

/// Typed assistant conversation events.
pub mod assistant;

/// Wire event message type.
pub mod event;

// ============================================================================
// Re-exports
// ============================================================================

pub use assistant::{AssistantEvent, SessionRequest, UserUtterance};
pub use event::Event;
