//! Code analysis task: the concept that was learned and the final snippet

use super::traits::{invoke_structured, ExtractionError, ExtractionTask, TaskKind};
use super::types::{CodeAnalysis, ConversationPayload};
use crate::inference::InferenceClient;
use async_trait::async_trait;
use std::sync::Arc;

pub struct CodeAnalysisTask {
    client: Arc<dyn InferenceClient>,
    task_name: String,
}

impl CodeAnalysisTask {
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self {
            client,
            task_name: TaskKind::CodeAnalysis.as_str().to_string(),
        }
    }

    pub fn with_task_name(mut self, task_name: impl Into<String>) -> Self {
        self.task_name = task_name.into();
        self
    }
}

#[async_trait]
impl ExtractionTask for CodeAnalysisTask {
    type Input = ConversationPayload;
    type Output = CodeAnalysis;

    fn kind(&self) -> TaskKind {
        TaskKind::CodeAnalysis
    }

    fn task_name(&self) -> &str {
        &self.task_name
    }

    async fn extract(&self, input: &ConversationPayload) -> Result<CodeAnalysis, ExtractionError> {
        let mut analysis: CodeAnalysis =
            invoke_structured(self.client.as_ref(), &self.task_name, input).await?;

        // A blank language tag carries no information
        if analysis
            .code_language
            .as_deref()
            .is_some_and(|lang| lang.trim().is_empty())
        {
            analysis.code_language = None;
        }

        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::MockClient;
    use serde_json::json;

    #[tokio::test]
    async fn blank_language_becomes_none() {
        let client = Arc::new(MockClient::available().with_json(
            "code-analysis",
            json!({
                "learnedConcept": "Recursion",
                "finalCodeSnippet": "def f(n): return f(n-1)",
                "codeLanguage": "  "
            }),
        ));
        let out = CodeAnalysisTask::new(client)
            .extract(&ConversationPayload::new("t"))
            .await
            .unwrap();
        assert_eq!(out.learned_concept, "Recursion");
        assert_eq!(out.code_language, None);
    }

    #[tokio::test]
    async fn missing_snippet_is_malformed() {
        let client = Arc::new(
            MockClient::available()
                .with_json("code-analysis", json!({"learnedConcept": "Recursion"})),
        );
        let err = CodeAnalysisTask::new(client)
            .extract(&ConversationPayload::new("t"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::MalformedOutput(_)));
    }
}
