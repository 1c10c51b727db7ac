//! Quiz topics task: short recall prompts drawn from the transcript

use super::traits::{invoke_structured, ExtractionError, ExtractionTask, TaskKind};
use super::types::{QuizPayload, QuizTopicsOutput};
use crate::inference::InferenceClient;
use async_trait::async_trait;
use std::sync::Arc;

pub struct QuizTopicsTask {
    client: Arc<dyn InferenceClient>,
    task_name: String,
}

impl QuizTopicsTask {
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self {
            client,
            task_name: TaskKind::QuizTopics.as_str().to_string(),
        }
    }

    pub fn with_task_name(mut self, task_name: impl Into<String>) -> Self {
        self.task_name = task_name.into();
        self
    }
}

#[async_trait]
impl ExtractionTask for QuizTopicsTask {
    type Input = QuizPayload;
    type Output = QuizTopicsOutput;

    fn kind(&self) -> TaskKind {
        TaskKind::QuizTopics
    }

    fn task_name(&self) -> &str {
        &self.task_name
    }

    async fn extract(&self, input: &QuizPayload) -> Result<QuizTopicsOutput, ExtractionError> {
        invoke_structured(self.client.as_ref(), &self.task_name, input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::MockClient;
    use serde_json::json;

    #[tokio::test]
    async fn sends_count_and_keeps_order() {
        let client = Arc::new(MockClient::available().with_json(
            "quiz-topics",
            json!({"quizTopics": [
                {"topic": "Base case", "context": "stops recursion"},
                {"topic": "Call stack", "context": "grows per call"}
            ]}),
        ));
        let out = QuizTopicsTask::new(client.clone())
            .extract(&QuizPayload {
                conversation_text: "t".into(),
                count: 2,
            })
            .await
            .unwrap();

        let topics = out.quiz_topics.unwrap();
        assert_eq!(topics[0].topic, "Base case");
        assert_eq!(topics[1].topic, "Call stack");
        assert!(client.calls()[0].input_json.contains("\"count\":2"));
    }

    #[tokio::test]
    async fn null_list_parses_as_none() {
        let client =
            Arc::new(MockClient::available().with_json("quiz-topics", json!({"quizTopics": null})));
        let out = QuizTopicsTask::new(client)
            .extract(&QuizPayload {
                conversation_text: "t".into(),
                count: 5,
            })
            .await
            .unwrap();
        assert_eq!(out.quiz_topics, None);
    }
}
