//! Quiz orchestrator: one quiz-topics task, three distinct outcomes
//!
//! - task failed: `{ quizTopics: null, error: <reason> }`
//! - task returned nothing worth quizzing: `{ quizTopics: [], error: null }`
//! - task returned topics: `{ quizTopics: [...], error: null }`, emission order kept

use super::executor::{FanOutExecutor, Slot};
use super::serializer::AggregateSerializer;
use super::types::{ConversationInput, ExtractionOutcome, ValidationError};
use crate::config::TaskNames;
use crate::events::EventSink;
use crate::inference::InferenceClient;
use crate::tasks::{ExtractionError, ExtractionTask, QuizPayload, QuizTopic, QuizTopicsTask, TaskKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Topic count when the caller gives none
pub const DEFAULT_QUIZ_COUNT: u32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub quiz_topics: Option<Vec<QuizTopic>>,
    pub error: Option<String>,
}

impl QuizResult {
    pub fn topics(quiz_topics: Vec<QuizTopic>) -> Self {
        Self {
            quiz_topics: Some(quiz_topics),
            error: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            quiz_topics: None,
            error: Some(reason.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

pub struct QuizOrchestrator {
    task: Arc<QuizTopicsTask>,
    executor: FanOutExecutor,
    serializer: AggregateSerializer,
    default_count: u32,
}

impl QuizOrchestrator {
    pub fn new(
        client: Arc<dyn InferenceClient>,
        names: &TaskNames,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let task = QuizTopicsTask::new(client).with_task_name(names.name_for(TaskKind::QuizTopics));
        Self {
            task: Arc::new(task),
            executor: FanOutExecutor::new(sink.clone()),
            serializer: AggregateSerializer::new(sink),
            default_count: DEFAULT_QUIZ_COUNT,
        }
    }

    pub fn with_default_count(mut self, count: u32) -> Self {
        self.default_count = count;
        self
    }

    /// Generate quiz topics for `text`.
    ///
    /// Blank text and a zero count are rejected before the task runs. Every
    /// task fault ends up in `QuizResult::error`.
    pub async fn generate_quiz_topics(
        &self,
        text: &str,
        count: Option<u32>,
    ) -> Result<QuizResult, ValidationError> {
        let input = ConversationInput::parse(text)?;
        let count = count.unwrap_or(self.default_count);
        if count == 0 {
            return Err(ValidationError::InvalidCount(count));
        }

        let payload = QuizPayload {
            conversation_text: input.into_string(),
            count,
        };
        let task = self.task.clone();
        let slot = Slot::new(task.kind().as_str(), async move {
            task.extract(&payload).await
        });

        let result = match self.executor.run(vec![slot]).await.pop() {
            Some(ExtractionOutcome::Success { value, .. }) => {
                QuizResult::topics(value.quiz_topics.unwrap_or_default())
            }
            Some(ExtractionOutcome::Failure { reason, .. }) => QuizResult::failed(reason),
            None => QuizResult::failed(ExtractionError::Cancelled.to_string()),
        };

        Ok(self.serializer.normalize_or(result, |_, e| {
            QuizResult::failed(format!("serialization failed: {}", e))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingSink;
    use crate::inference::{InferenceError, MockClient};
    use serde_json::json;

    fn orchestrator(client: MockClient) -> (QuizOrchestrator, Arc<MockClient>) {
        let client = Arc::new(client);
        let quiz = QuizOrchestrator::new(
            client.clone(),
            &TaskNames::default(),
            Arc::new(RecordingSink::new()),
        );
        (quiz, client)
    }

    #[tokio::test]
    async fn empty_topics_are_not_an_error() {
        let (quiz, _) =
            orchestrator(MockClient::available().with_json("quiz-topics", json!({"quizTopics": []})));

        let result = quiz.generate_quiz_topics("recursion chat", None).await.unwrap();
        assert_eq!(result, QuizResult::topics(Vec::new()));
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"quizTopics": [], "error": null})
        );
    }

    #[tokio::test]
    async fn absent_topics_normalize_to_empty() {
        let (quiz, _) = orchestrator(MockClient::available().with_json("quiz-topics", json!({})));

        let result = quiz.generate_quiz_topics("recursion chat", None).await.unwrap();
        assert_eq!(result.quiz_topics, Some(Vec::new()));
        assert_eq!(result.error, None);
    }

    #[tokio::test]
    async fn topics_keep_emission_order() {
        let (quiz, _) = orchestrator(MockClient::available().with_json(
            "quiz-topics",
            json!({"quizTopics": [
                {"topic": "B", "context": "second letter"},
                {"topic": "A", "context": "first letter"}
            ]}),
        ));

        let result = quiz.generate_quiz_topics("letters", Some(2)).await.unwrap();
        let topics: Vec<String> = result
            .quiz_topics
            .unwrap()
            .into_iter()
            .map(|t| t.topic)
            .collect();
        assert_eq!(topics, vec!["B", "A"]);
    }

    #[tokio::test]
    async fn failure_has_null_topics_and_reason() {
        let (quiz, _) = orchestrator(MockClient::available().with_failure(
            "quiz-topics",
            InferenceError::InvocationFailed("rate limited".into()),
        ));

        let result = quiz.generate_quiz_topics("chat", None).await.unwrap();
        assert_eq!(result, QuizResult::failed("invocation failed: rate limited"));
    }

    #[tokio::test]
    async fn default_count_is_sent() {
        let (quiz, client) =
            orchestrator(MockClient::available().with_json("quiz-topics", json!({"quizTopics": []})));

        quiz.generate_quiz_topics("  chat  ", None).await.unwrap();
        let input: serde_json::Value =
            serde_json::from_str(&client.calls()[0].input_json).unwrap();
        assert_eq!(input, json!({"conversationText": "chat", "count": 5}));
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_task() {
        let (quiz, client) = orchestrator(MockClient::available());

        assert_eq!(
            quiz.generate_quiz_topics("   ", None).await,
            Err(ValidationError::EmptyConversation)
        );
        assert_eq!(
            quiz.generate_quiz_topics("chat", Some(0)).await,
            Err(ValidationError::InvalidCount(0))
        );
        assert!(client.calls().is_empty());
    }
}
