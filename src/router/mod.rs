//! Transport to store bridge.
//!
//! The router turns wire events into store traffic and back using a
//! prefix naming convention, so neither side needs a central registry of
//! event names.
//!
//! ```text
//!   inbound  {"name": "bot_uttered", ...}
//!        └─► mutate("SOCKET_bot_uttered")  ─► dispatch("SOCKET_bot_uttered")
//!
//!   outbound dispatch("SOCKET_user_uttered")
//!        └─► send {"name": "user_uttered", ...}
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | The `EventRouter` |
//! | `options` | Prefixes, rename and naming helpers |

// ============================================================================
// Submodules
// ============================================================================

/// Event router.
pub mod core;

/// Naming convention.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use self::core::EventRouter;
pub use options::{DEFAULT_PREFIX, EventNameTransform, RouterOptions};
