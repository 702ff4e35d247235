//! Event types for observing runs
//!
//! The forward engine reports run progress to an [`EventSink`] so hosts
//! can display execution state without hooking into node code.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::types::{NodeUid, PortValues};

/// Trait for receiving run events
///
/// Abstracts over the transport (channel, UI bridge, test buffer).
pub trait EventSink: Send + Sync {
    /// Send an event
    ///
    /// Returns an error if the event could not be delivered (e.g., channel closed)
    fn send(&self, event: RunEvent) -> Result<(), EventError>;
}

/// Error when sending events fails
#[derive(Debug, Clone)]
pub struct EventError {
    pub message: String,
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event error: {}", self.message)
    }
}

impl std::error::Error for EventError {}

/// Events emitted during a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RunEvent {
    /// A top-level run started at the given node
    #[serde(rename_all = "camelCase")]
    RunStarted { run_id: String, node_id: NodeUid },

    /// A node's calculate function returned
    #[serde(rename_all = "camelCase")]
    NodeEvaluated {
        run_id: String,
        node_id: NodeUid,
        outputs: PortValues,
    },

    /// A node fired one of its flow outputs
    #[serde(rename_all = "camelCase")]
    FlowFired {
        run_id: String,
        source: NodeUid,
        port: String,
        target: NodeUid,
    },

    /// A top-level run finished
    #[serde(rename_all = "camelCase")]
    RunCompleted { run_id: String },

    /// A top-level run aborted with an error
    #[serde(rename_all = "camelCase")]
    RunFailed { run_id: String, error: String },
}

impl RunEvent {
    pub fn run_id(&self) -> &str {
        match self {
            Self::RunStarted { run_id, .. }
            | Self::NodeEvaluated { run_id, .. }
            | Self::FlowFired { run_id, .. }
            | Self::RunCompleted { run_id }
            | Self::RunFailed { run_id, .. } => run_id,
        }
    }
}

/// A no-op event sink that discards all events
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: RunEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// A vector-based event sink that collects events
///
/// Useful for tests that check which events were emitted.
#[derive(Default)]
pub struct VecEventSink {
    events: Mutex<Vec<RunEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().clone()
    }

    /// Clear all collected events
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: RunEvent) -> Result<(), EventError> {
        self.events.lock().push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_event_sink() {
        let sink = VecEventSink::new();
        sink.send(RunEvent::RunStarted {
            run_id: "run1".to_string(),
            node_id: "n1".to_string(),
        })
        .unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            RunEvent::RunStarted { node_id, .. } => assert_eq!(node_id, "n1"),
            _ => panic!("Expected RunStarted event"),
        }
        assert_eq!(events[0].run_id(), "run1");

        sink.clear();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_event_wire_format() {
        let event = RunEvent::FlowFired {
            run_id: "r".to_string(),
            source: "a".to_string(),
            port: "then".to_string(),
            target: "b".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "flowFired");
        assert_eq!(json["runId"], "r");
    }

    #[test]
    fn test_null_event_sink() {
        NullEventSink
            .send(RunEvent::RunCompleted {
                run_id: "r".to_string(),
            })
            .unwrap();
    }
}
