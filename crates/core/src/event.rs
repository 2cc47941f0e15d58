//! Domain event system: lets observers follow what the context manager does
//! without coupling to it.
//!
//! Events are published after each admission, compression, eviction, and
//! degraded collaborator call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A slot was appended to the sequence
    SlotAdmitted {
        slot_id: String,
        role: String,
        priority: i32,
        sequence_len: usize,
        timestamp: DateTime<Utc>,
    },

    /// The middle group was folded into one summary slot
    ContextCompressed {
        summary_id: String,
        source_count: usize,
        method: String,
        timestamp: DateTime<Utc>,
    },

    /// A non-protected slot was dropped by the FIFO fallback
    SlotEvicted {
        slot_id: String,
        role: String,
        timestamp: DateTime<Utc>,
    },

    /// A retrieval injection was skipped
    RetrievalSkipped {
        query: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// The summarizer failed and the pass degraded to eviction
    CompressionFailed {
        method: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
