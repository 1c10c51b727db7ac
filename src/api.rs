//! Transport-independent API layer.
//!
//! `StudyForgeApi` is the single entry point for all consumer-facing
//! operations. Transports (MCP, CLI, direct embedding) call its methods and
//! never reach into the orchestrators or the store directly.

use std::sync::Arc;

use crate::analysis::{
    AnalysisAggregate, AnalysisOrchestrator, QuizOrchestrator, QuizResult, ValidationError,
};
use crate::config::Config;
use crate::events::EventSink;
use crate::inference::InferenceClient;
use crate::notes::{PersistenceGate, SaveOutcome};
use crate::storage::{NoteDocument, NotesStore, StorageError};

/// Single entry point for all consumer-facing operations.
#[derive(Clone)]
pub struct StudyForgeApi {
    analysis: Arc<AnalysisOrchestrator>,
    quiz: Arc<QuizOrchestrator>,
    gate: PersistenceGate,
    client: Arc<dyn InferenceClient>,
}

impl StudyForgeApi {
    /// Wire the pipelines to one inference client and one store.
    pub fn new(
        client: Arc<dyn InferenceClient>,
        store: Arc<dyn NotesStore>,
        sink: Arc<dyn EventSink>,
        config: &Config,
    ) -> Self {
        let analysis = AnalysisOrchestrator::new(client.clone(), &config.tasks, sink.clone());
        let quiz = QuizOrchestrator::new(client.clone(), &config.tasks, sink.clone())
            .with_default_count(config.quiz.default_count);
        Self {
            analysis: Arc::new(analysis),
            quiz: Arc::new(quiz),
            gate: PersistenceGate::new(store, sink),
            client,
        }
    }

    // --- Analysis ---

    /// Run the main pipeline over one conversation.
    pub async fn process_conversation(
        &self,
        text: &str,
    ) -> Result<AnalysisAggregate, ValidationError> {
        self.analysis.process_conversation(text).await
    }

    /// Generate recall prompts; `count` defaults to the configured count.
    pub async fn generate_quiz_topics(
        &self,
        text: &str,
        count: Option<u32>,
    ) -> Result<QuizResult, ValidationError> {
        self.quiz.generate_quiz_topics(text, count).await
    }

    // --- Notes ---

    pub async fn save_notes(
        &self,
        topic_name: &str,
        content: Option<&str>,
    ) -> Result<SaveOutcome, ValidationError> {
        self.gate.save_notes(topic_name, content).await
    }

    pub async fn list_notes(&self, limit: usize) -> Result<Vec<NoteDocument>, StorageError> {
        self.gate.list_notes(limit).await
    }

    /// Whether the inference service can be reached
    pub async fn inference_available(&self) -> bool {
        self.client.is_available().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingSink;
    use crate::inference::MockClient;
    use crate::storage::{OpenStore, SqliteNotesStore};
    use serde_json::json;

    fn api(client: MockClient, config: &Config) -> StudyForgeApi {
        StudyForgeApi::new(
            Arc::new(client),
            Arc::new(SqliteNotesStore::open_in_memory().unwrap()),
            Arc::new(RecordingSink::new()),
            config,
        )
    }

    #[tokio::test]
    async fn quiz_uses_configured_default_count() {
        let client = Arc::new(
            MockClient::available().with_json("quiz-topics", json!({"quizTopics": []})),
        );
        let mut config = Config::default();
        config.quiz.default_count = 3;
        let api = StudyForgeApi::new(
            client.clone(),
            Arc::new(SqliteNotesStore::open_in_memory().unwrap()),
            Arc::new(RecordingSink::new()),
            &config,
        );

        api.generate_quiz_topics("chat", None).await.unwrap();
        let input: serde_json::Value =
            serde_json::from_str(&client.calls()[0].input_json).unwrap();
        assert_eq!(input["count"], 3);
    }

    #[tokio::test]
    async fn save_then_list() {
        let api = api(MockClient::available(), &Config::default());

        let outcome = api.save_notes("Recursion", Some("base case")).await.unwrap();
        let notes = api.list_notes(5).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(Some(notes[0].id.clone()), outcome.id);
    }

    #[tokio::test]
    async fn availability_reflects_client() {
        assert!(api(MockClient::available(), &Config::default())
            .inference_available()
            .await);
        assert!(!api(MockClient::unavailable(), &Config::default())
            .inference_available()
            .await);
    }
}
