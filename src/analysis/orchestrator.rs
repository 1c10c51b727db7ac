//! Analysis orchestrator: the main conversation pipeline
//!
//! Stage one fans out topic summary, code analysis and study notes in
//! parallel. Their outcomes are reduced into a partial aggregate; a non-blank
//! summary then drives the concept-map stage. The finished aggregate is
//! normalized before it is returned. Task faults never escape as errors.

use super::executor::{FanOutExecutor, Slot};
use super::reducer::{ResultReducer, StageOutput};
use super::serializer::AggregateSerializer;
use super::trigger::ConceptStage;
use super::types::{AnalysisAggregate, ConversationInput, ValidationError};
use crate::config::TaskNames;
use crate::events::EventSink;
use crate::inference::InferenceClient;
use crate::tasks::{
    CodeAnalysisTask, ConceptMapTask, ConversationPayload, ExtractionTask, StudyNotesTask,
    TaskKind, TopicSummaryTask,
};
use std::sync::Arc;

/// Coordinates the extraction tasks for one conversation at a time
pub struct AnalysisOrchestrator {
    summary: Arc<TopicSummaryTask>,
    code: Arc<CodeAnalysisTask>,
    notes: Arc<StudyNotesTask>,
    concept_map: Arc<ConceptMapTask>,
    executor: FanOutExecutor,
    reducer: ResultReducer,
    serializer: AggregateSerializer,
    sink: Arc<dyn EventSink>,
}

impl AnalysisOrchestrator {
    pub fn new(
        client: Arc<dyn InferenceClient>,
        names: &TaskNames,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            summary: Arc::new(
                TopicSummaryTask::new(client.clone())
                    .with_task_name(names.name_for(TaskKind::TopicSummary)),
            ),
            code: Arc::new(
                CodeAnalysisTask::new(client.clone())
                    .with_task_name(names.name_for(TaskKind::CodeAnalysis)),
            ),
            notes: Arc::new(
                StudyNotesTask::new(client.clone())
                    .with_task_name(names.name_for(TaskKind::StudyNotes)),
            ),
            concept_map: Arc::new(
                ConceptMapTask::new(client).with_task_name(names.name_for(TaskKind::ConceptMap)),
            ),
            executor: FanOutExecutor::new(sink.clone()),
            reducer: ResultReducer::new(),
            serializer: AggregateSerializer::new(sink.clone()),
            sink,
        }
    }

    /// Analyze one conversation.
    ///
    /// Only blank input is an `Err`. Every other fault is reported through
    /// the aggregate's `error` field, first failure in slot order.
    pub async fn process_conversation(
        &self,
        text: &str,
    ) -> Result<AnalysisAggregate, ValidationError> {
        let input = ConversationInput::parse(text)?;

        let slots = vec![
            stage_slot(&self.summary, &input, StageOutput::Summary),
            stage_slot(&self.code, &input, StageOutput::CodeAnalysis),
            stage_slot(&self.notes, &input, StageOutput::StudyNotes),
        ];
        let outcomes = self.executor.run(slots).await;
        let mut partial = self.reducer.reduce(outcomes);

        let concepts_map = ConceptStage::from_summary(partial.topics_summary.as_deref())
            .run(
                &self.executor,
                self.concept_map.clone(),
                input.as_str(),
                &mut partial.error,
                self.sink.as_ref(),
            )
            .await;

        let aggregate = partial.into_aggregate(input.into_string(), concepts_map);
        Ok(self.serializer.finalize(aggregate))
    }
}

/// A stage-one slot: the task gets its own copy of the transcript
fn stage_slot<T>(
    task: &Arc<T>,
    input: &ConversationInput,
    wrap: fn(T::Output) -> StageOutput,
) -> Slot<StageOutput>
where
    T: ExtractionTask<Input = ConversationPayload> + 'static,
    T::Output: 'static,
{
    let task = task.clone();
    let payload = ConversationPayload::new(input.as_str());
    Slot::new(task.kind().as_str(), async move {
        task.extract(&payload).await.map(wrap)
    })
}
