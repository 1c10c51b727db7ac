//! Concept map task: concepts, subtopics and relationships around the main topic
//!
//! Runs as the dependent second stage, after the topic summary is known.

use super::traits::{invoke_structured, ExtractionError, ExtractionTask, TaskKind};
use super::types::{ConceptMapPayload, ConceptsMap};
use crate::inference::InferenceClient;
use async_trait::async_trait;
use std::sync::Arc;

pub struct ConceptMapTask {
    client: Arc<dyn InferenceClient>,
    task_name: String,
}

impl ConceptMapTask {
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self {
            client,
            task_name: TaskKind::ConceptMap.as_str().to_string(),
        }
    }

    pub fn with_task_name(mut self, task_name: impl Into<String>) -> Self {
        self.task_name = task_name.into();
        self
    }
}

#[async_trait]
impl ExtractionTask for ConceptMapTask {
    type Input = ConceptMapPayload;
    type Output = ConceptsMap;

    fn kind(&self) -> TaskKind {
        TaskKind::ConceptMap
    }

    fn task_name(&self) -> &str {
        &self.task_name
    }

    async fn extract(&self, input: &ConceptMapPayload) -> Result<ConceptsMap, ExtractionError> {
        let mut map: ConceptsMap =
            invoke_structured(self.client.as_ref(), &self.task_name, input).await?;

        // Edges need both endpoints
        map.relationships
            .retain(|r| !r.from.trim().is_empty() && !r.to.trim().is_empty());

        Ok(map)
    }
}
