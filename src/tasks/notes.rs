//! Study notes task

use super::traits::{invoke_structured, ExtractionError, ExtractionTask, TaskKind};
use super::types::{ConversationPayload, StudyNotes};
use crate::inference::InferenceClient;
use async_trait::async_trait;
use std::sync::Arc;

pub struct StudyNotesTask {
    client: Arc<dyn InferenceClient>,
    task_name: String,
}

impl StudyNotesTask {
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self {
            client,
            task_name: TaskKind::StudyNotes.as_str().to_string(),
        }
    }

    pub fn with_task_name(mut self, task_name: impl Into<String>) -> Self {
        self.task_name = task_name.into();
        self
    }
}

#[async_trait]
impl ExtractionTask for StudyNotesTask {
    type Input = ConversationPayload;
    type Output = StudyNotes;

    fn kind(&self) -> TaskKind {
        TaskKind::StudyNotes
    }

    fn task_name(&self) -> &str {
        &self.task_name
    }

    async fn extract(&self, input: &ConversationPayload) -> Result<StudyNotes, ExtractionError> {
        invoke_structured(self.client.as_ref(), &self.task_name, input).await
    }
}
