//! Outbound queue used while the channel is not open.
//!
//! Delivery stays at-most-once either way: a buffered message is written
//! once after the next connect and never retried.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::protocol::Event;

// ============================================================================
// Constants
// ============================================================================

/// Default number of messages kept while disconnected.
pub const DEFAULT_OUTBOX_CAPACITY: usize = 256;

// ============================================================================
// OutboxPolicy
// ============================================================================

/// What `send` does while the channel is not connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum OutboxPolicy {
    /// Discard the message.
    Drop,
    /// Keep up to `capacity` messages and flush them, in order, right after
    /// the next successful connect. When full, the oldest message is dropped.
    Buffer {
        /// Maximum number of buffered messages.
        capacity: usize,
    },
}

impl Default for OutboxPolicy {
    fn default() -> Self {
        Self::Buffer {
            capacity: DEFAULT_OUTBOX_CAPACITY,
        }
    }
}

// ============================================================================
// Outbox
// ============================================================================

/// FIFO of events waiting for a connection.
#[derive(Debug)]
pub(crate) struct Outbox {
    policy: OutboxPolicy,
    queue: VecDeque<Event>,
}

impl Outbox {
    /// Creates an empty outbox.
    pub fn new(policy: OutboxPolicy) -> Self {
        Self {
            policy,
            queue: VecDeque::new(),
        }
    }

    /// Queues an event according to the policy.
    pub fn push(&mut self, event: Event) {
        match self.policy {
            OutboxPolicy::Drop => {
                debug!(event = %event.name, "Not connected, dropping outbound event");
            }
            OutboxPolicy::Buffer { capacity } => {
                if self.queue.len() >= capacity
                    && let Some(evicted) = self.queue.pop_front()
                {
                    warn!(
                        evicted = %evicted.name,
                        capacity,
                        "Outbox full, dropping oldest event"
                    );
                }
                debug!(event = %event.name, queued = self.queue.len() + 1, "Buffering outbound event");
                self.queue.push_back(event);
            }
        }
    }

    /// Takes every queued event, oldest first.
    pub fn drain(&mut self) -> Vec<Event> {
        self.queue.drain(..).collect()
    }

    /// Returns the number of queued events.
    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

// ============================================================================
// Tests
// ============================================================================
