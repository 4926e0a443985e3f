//! Operation lifecycle notifications
//!
//! Published on a broadcast channel; with no subscribers events are simply
//! dropped, and a slow subscriber only loses its own backlog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Default channel capacity
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventPhase {
    Started,
    Succeeded,
    Failed,
}

/// One lifecycle event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationEvent {
    pub phase: EventPhase,
    /// e.g. `style-mutation`, `undo`
    pub operation_kind: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl OperationEvent {
    fn new(phase: EventPhase, operation_kind: &str, description: &str) -> Self {
        Self {
            phase,
            operation_kind: operation_kind.to_string(),
            description: description.to_string(),
            target: None,
            result: None,
            error: None,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn started(operation_kind: &str, description: &str) -> Self {
        Self::new(EventPhase::Started, operation_kind, description)
    }

    #[must_use]
    pub fn succeeded(operation_kind: &str, description: &str) -> Self {
        Self::new(EventPhase::Succeeded, operation_kind, description)
    }

    #[must_use]
    pub fn failed(operation_kind: &str, description: &str, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(EventPhase::Failed, operation_kind, description)
        }
    }

    /// With target description
    #[inline]
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// With result payload
    #[inline]
    #[must_use]
    pub fn with_result(mut self, result: serde_json::Value) -> Self {
        self.result = Some(result);
        self
    }
}

/// Broadcast publisher for [`OperationEvent`]s
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: broadcast::Sender<OperationEvent>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl Notifier {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// New receiver seeing every event published from now on
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<OperationEvent> {
        self.sender.subscribe()
    }

    /// Publish; never blocks and never fails
    pub fn publish(&self, event: OperationEvent) {
        tracing::trace!(phase = ?event.phase, kind = %event.operation_kind, "operation event");
        // no subscribers is not an error
        let _ = self.sender.send(event);
    }

    /// Current subscriber count
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
