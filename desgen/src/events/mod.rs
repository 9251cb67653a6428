//! Pipeline lifecycle events.
//!
//! The orchestrator reports every run through an injected [`EventSink`].

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, RecordedEvent};

/// A run started.
pub const PIPELINE_STARTED: &str = "pipeline.started";
/// A run finished with all stage outputs.
pub const PIPELINE_COMPLETED: &str = "pipeline.completed";
/// A run aborted.
pub const PIPELINE_FAILED: &str = "pipeline.failed";
/// A stage is about to call the provider.
pub const STAGE_STARTED: &str = "stage.started";
/// A stage produced its output.
pub const STAGE_COMPLETED: &str = "stage.completed";
/// A stage failed.
pub const STAGE_FAILED: &str = "stage.failed";
