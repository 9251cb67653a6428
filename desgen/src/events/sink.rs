//! Event sinks receiving pipeline lifecycle events.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::Level;

/// Receives lifecycle events from the orchestrator.
///
/// Sinks never fail a run: implementations handle their own errors.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Records one event, e.g. `stage.completed` with its payload.
    async fn emit(&self, event_type: &str, data: Option<Value>);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event_type: &str, _data: Option<Value>) {}
}

/// Forwards events to `tracing` at a fixed level.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a sink logging at `level`.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event_type: &str, data: Option<Value>) {
        let data = data.unwrap_or(Value::Null);
        match self.level {
            Level::TRACE | Level::DEBUG => {
                tracing::debug!(event_type, %data, "Pipeline event");
            }
            _ => tracing::info!(event_type, %data, "Pipeline event"),
        }
    }
}

/// One event captured by [`CollectingEventSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    /// Event name.
    pub event_type: String,
    /// Event payload.
    pub data: Option<Value>,
}

/// Keeps every event in memory, for tests.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: RwLock<Vec<RecordedEvent>>,
}

impl CollectingEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Event names in emission order.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.events.read().iter().map(|e| e.event_type.clone()).collect()
    }

    /// Payloads of the events named `event_type`, in emission order.
    #[must_use]
    pub fn payloads(&self, event_type: &str) -> Vec<Value> {
        self.events
            .read()
            .iter()
            .filter(|e| e.event_type == event_type)
            .map(|e| e.data.clone().unwrap_or(Value::Null))
            .collect()
    }

    /// Number of captured events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// True if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event_type: &str, data: Option<Value>) {
        self.events.write().push(RecordedEvent {
            event_type: event_type.to_string(),
            data,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn test_noop_and_logging_sinks_accept_events() {
        NoOpEventSink.emit("pipeline.started", None).await;
        LoggingEventSink::debug()
            .emit("stage.completed", Some(json!({"duration_ms": 1.5})))
            .await;
        LoggingEventSink::default().emit("pipeline.completed", None).await;
    }

    #[tokio::test]
    async fn test_collecting_sink_keeps_order_and_payloads() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        sink.emit("stage.started", Some(json!({"stage_name": "strategy"}))).await;
        sink.emit("stage.completed", None).await;
        sink.emit("stage.started", Some(json!({"stage_name": "experience"}))).await;

        assert_eq!(sink.len(), 3);
        assert_eq!(
            sink.event_types(),
            vec!["stage.started", "stage.completed", "stage.started"]
        );
        assert_eq!(
            sink.payloads("stage.started"),
            vec![json!({"stage_name": "strategy"}), json!({"stage_name": "experience"})]
        );
        assert_eq!(sink.payloads("stage.completed"), vec![Value::Null]);
    }
}
