//! Pipeline events fired at each state transition
//!
//! The orchestrators never log directly. They emit `PipelineEvent`s into an
//! `EventSink`; the default sink turns them into `tracing` events, tests use
//! `RecordingSink` to assert on the sequence.

use std::sync::Mutex;

/// A state transition inside one of the pipelines.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// An extraction task was launched in a fan-out slot
    TaskStarted { slot: String },
    /// An extraction task reached a terminal state
    TaskSettled {
        slot: String,
        succeeded: bool,
        /// Failure reason, when the task failed
        reason: Option<String>,
    },
    /// A dependent stage did not run because its input was missing
    StageSkipped { stage: String, reason: String },
    /// The aggregate could not be normalized and was replaced by an error aggregate
    AggregateDegraded { reason: String },
    /// A save request carried no content and never reached the store
    SaveSkipped { topic_name: String },
    /// A note was appended to the store
    SaveStored { topic_name: String, id: String },
    /// The store rejected a note
    SaveFailed { topic_name: String, reason: String },
}

impl PipelineEvent {
    /// Short machine-readable event name
    pub fn name(&self) -> &'static str {
        match self {
            PipelineEvent::TaskStarted { .. } => "task_started",
            PipelineEvent::TaskSettled { .. } => "task_settled",
            PipelineEvent::StageSkipped { .. } => "stage_skipped",
            PipelineEvent::AggregateDegraded { .. } => "aggregate_degraded",
            PipelineEvent::SaveSkipped { .. } => "save_skipped",
            PipelineEvent::SaveStored { .. } => "save_stored",
            PipelineEvent::SaveFailed { .. } => "save_failed",
        }
    }
}

/// Consumer of pipeline events (the observability collaborator).
pub trait EventSink: Send + Sync {
    fn emit(&self, event: PipelineEvent);
}

/// Forwards every event to `tracing` with structured fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: PipelineEvent) {
        let name = event.name();
        match event {
            PipelineEvent::TaskStarted { slot } => {
                tracing::debug!(event = name, %slot, "extraction task started");
            }
            PipelineEvent::TaskSettled {
                slot,
                succeeded: true,
                ..
            } => {
                tracing::debug!(event = name, %slot, "extraction task succeeded");
            }
            PipelineEvent::TaskSettled {
                slot,
                succeeded: false,
                reason,
            } => {
                tracing::warn!(
                    event = name,
                    %slot,
                    reason = reason.as_deref().unwrap_or("unknown"),
                    "extraction task failed"
                );
            }
            PipelineEvent::StageSkipped { stage, reason } => {
                tracing::debug!(event = name, %stage, %reason, "stage skipped");
            }
            PipelineEvent::AggregateDegraded { reason } => {
                tracing::warn!(event = name, %reason, "aggregate replaced by error aggregate");
            }
            PipelineEvent::SaveSkipped { topic_name } => {
                tracing::info!(event = name, %topic_name, "save skipped, empty content");
            }
            PipelineEvent::SaveStored { topic_name, id } => {
                tracing::info!(event = name, %topic_name, %id, "notes stored");
            }
            PipelineEvent::SaveFailed { topic_name, reason } => {
                tracing::warn!(event = name, %topic_name, %reason, "notes store failed");
            }
        }
    }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Names of emitted events, in emission order
    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(|e| e.name()).collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: PipelineEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        sink.emit(PipelineEvent::TaskStarted {
            slot: "topic-summary".into(),
        });
        sink.emit(PipelineEvent::StageSkipped {
            stage: "concept-map".into(),
            reason: "no summary".into(),
        });

        assert_eq!(sink.names(), vec!["task_started", "stage_skipped"]);
    }

    #[test]
    fn tracing_sink_accepts_every_variant() {
        let sink = TracingSink;
        sink.emit(PipelineEvent::TaskSettled {
            slot: "s".into(),
            succeeded: false,
            reason: None,
        });
        sink.emit(PipelineEvent::SaveFailed {
            topic_name: "t".into(),
            reason: "disk full".into(),
        });
    }
}
