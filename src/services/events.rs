// src/services/events.rs

use serde::Serialize;

/// Notification raised after a successful comment mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CommentEvent {
    Created {
        id: i64,
        user_id: i64,
        parent_id: Option<i64>,
    },
    Deleted {
        id: i64,
    },
}

impl CommentEvent {
    pub fn name(&self) -> &'static str {
        match self {
            CommentEvent::Created { .. } => "comment.created",
            CommentEvent::Deleted { .. } => "comment.deleted",
        }
    }
}

/// Fire-and-forget sink for comment events.
///
/// Emission happens after the mutation has committed. A sink must not
/// block, and a failing sink never fails the request that emitted.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: CommentEvent);
}

/// Sink that forwards events into the tracing pipeline, where downstream
/// listeners (notification mails, audit logs) pick them up.
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: CommentEvent) {
        match serde_json::to_string(&event) {
            Ok(payload) => tracing::info!("{}: {}", event.name(), payload),
            Err(e) => tracing::error!("Failed to serialize {} event: {:?}", event.name(), e),
        }
    }
}
