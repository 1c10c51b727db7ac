//! Dependent-stage trigger for concept mapping
//!
//! Concept mapping needs the topic summary as its main topic. A missing or
//! blank summary means the stage is skipped, which is not a new fault: the
//! summary failure (if any) is already recorded.

use super::executor::{FanOutExecutor, Slot};
use super::reducer::FirstError;
use crate::events::{EventSink, PipelineEvent};
use crate::tasks::{ConceptMapPayload, ConceptMapTask, ConceptsMap, ExtractionTask, TaskKind};
use std::sync::Arc;

/// Whether the concept-map stage will run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConceptStage {
    Eligible { main_topic: String },
    Skipped,
}

impl ConceptStage {
    /// Eligible only for a non-blank summary
    pub fn from_summary(summary: Option<&str>) -> Self {
        match summary {
            Some(s) if !s.trim().is_empty() => ConceptStage::Eligible {
                main_topic: s.to_string(),
            },
            _ => ConceptStage::Skipped,
        }
    }

    pub fn is_eligible(&self) -> bool {
        matches!(self, ConceptStage::Eligible { .. })
    }

    /// Run the stage.
    ///
    /// On failure the map stays `None` and the reason is recorded only if no
    /// earlier error exists.
    pub async fn run(
        self,
        executor: &FanOutExecutor,
        task: Arc<ConceptMapTask>,
        conversation_text: &str,
        error: &mut FirstError,
        sink: &dyn EventSink,
    ) -> Option<ConceptsMap> {
        let main_topic = match self {
            ConceptStage::Eligible { main_topic } => main_topic,
            ConceptStage::Skipped => {
                sink.emit(PipelineEvent::StageSkipped {
                    stage: TaskKind::ConceptMap.as_str().to_string(),
                    reason: "no topic summary available".to_string(),
                });
                return None;
            }
        };

        let payload = ConceptMapPayload {
            main_topic,
            conversation_text: conversation_text.to_string(),
        };
        let slot = Slot::new(task.kind().as_str(), async move {
            task.extract(&payload).await
        });

        let outcome = executor.run(vec![slot]).await.into_iter().next()?;
        if let Some(reason) = outcome.failure_reason() {
            error.record_slot(outcome.slot(), reason);
        }
        outcome.into_value()
    }
}
