//! Topic summary task: one-paragraph summary, key topics and a category

use super::traits::{invoke_structured, ExtractionError, ExtractionTask, TaskKind};
use super::types::{ConversationPayload, TopicSummary};
use crate::inference::InferenceClient;
use async_trait::async_trait;
use std::sync::Arc;

pub struct TopicSummaryTask {
    client: Arc<dyn InferenceClient>,
    task_name: String,
}

impl TopicSummaryTask {
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self {
            client,
            task_name: TaskKind::TopicSummary.as_str().to_string(),
        }
    }

    /// Invoke the remote task under a different name
    pub fn with_task_name(mut self, task_name: impl Into<String>) -> Self {
        self.task_name = task_name.into();
        self
    }
}

#[async_trait]
impl ExtractionTask for TopicSummaryTask {
    type Input = ConversationPayload;
    type Output = TopicSummary;

    fn kind(&self) -> TaskKind {
        TaskKind::TopicSummary
    }

    fn task_name(&self) -> &str {
        &self.task_name
    }

    async fn extract(&self, input: &ConversationPayload) -> Result<TopicSummary, ExtractionError> {
        invoke_structured(self.client.as_ref(), &self.task_name, input).await
    }
}
