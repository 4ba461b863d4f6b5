//! Internal event system for record mutations
//!
//! The EventBus decouples mutations (REST handlers, the record store) from
//! observers (the audit log, tests). It uses `tokio::sync::broadcast`, so
//! every subscriber sees every event and a slow subscriber is told how many
//! events it missed instead of blocking publishers.
//!
//! Snapshots for list views travel through the feed (`core::feed`), not
//! through this bus: events describe *what* changed, snapshots carry the
//! resulting state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// A mutation applied to a record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RecordEvent {
    /// A record was created
    Created {
        collection: String,
        record_id: Uuid,
        data: serde_json::Value,
    },
    /// A record was updated
    Updated {
        collection: String,
        record_id: Uuid,
        data: serde_json::Value,
    },
    /// A record was deleted
    Deleted { collection: String, record_id: Uuid },
}

impl RecordEvent {
    /// Collection the event relates to
    pub fn collection(&self) -> &str {
        match self {
            RecordEvent::Created { collection, .. }
            | RecordEvent::Updated { collection, .. }
            | RecordEvent::Deleted { collection, .. } => collection,
        }
    }

    /// Record the event relates to
    pub fn record_id(&self) -> Uuid {
        match self {
            RecordEvent::Created { record_id, .. }
            | RecordEvent::Updated { record_id, .. }
            | RecordEvent::Deleted { record_id, .. } => *record_id,
        }
    }

    /// Action name (created, updated, deleted)
    pub fn action(&self) -> &'static str {
        match self {
            RecordEvent::Created { .. } => "created",
            RecordEvent::Updated { .. } => "updated",
            RecordEvent::Deleted { .. } => "deleted",
        }
    }
}

/// Envelope wrapping an event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: RecordEvent,
}

impl EventEnvelope {
    pub fn new(event: RecordEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Broadcast-based event bus
///
/// Cheap to clone; clones publish into the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per lagging receiver
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event to all subscribers
    ///
    /// Never fails; returns the number of receivers that will see the event.
    pub fn publish(&self, event: RecordEvent) -> usize {
        let envelope = EventEnvelope::new(event);
        // send() only errors when nobody is listening
        self.sender.send(envelope).unwrap_or(0)
    }

    /// Subscribe to events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

/// Log every event at info level until the bus closes
///
/// Spawned once by the server as its audit trail.
pub async fn run_audit_loop(mut rx: broadcast::Receiver<EventEnvelope>) {
    tracing::debug!("Audit loop started");

    loop {
        match rx.recv().await {
            Ok(envelope) => {
                tracing::info!(
                    event_id = %envelope.id,
                    collection = %envelope.event.collection(),
                    record_id = %envelope.event.record_id(),
                    action = envelope.event.action(),
                    "Record mutation"
                );
            }
            Err(broadcast::error::RecvError::Lagged(count)) => {
                tracing::warn!(count, "Audit loop lagged, {} events skipped", count);
            }
            Err(broadcast::error::RecvError::Closed) => {
                tracing::debug!("Event bus closed, stopping audit loop");
                break;
            }
        }
    }
}
