//! Extraction task trait and the shared invoke-and-validate path
//!
//! Every task is a remote inference call: serialize a typed input, invoke the
//! task by name, pull a JSON object out of the reply and deserialize it into
//! the task's typed output. Nothing unchecked crosses this boundary.

use crate::inference::{extract_json, InferenceClient, InferenceError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// The artifact kinds the pipeline knows how to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    TopicSummary,
    CodeAnalysis,
    StudyNotes,
    QuizTopics,
    ConceptMap,
}

impl TaskKind {
    /// Stable name, used both as slot name and as default remote task name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::TopicSummary => "topic-summary",
            TaskKind::CodeAnalysis => "code-analysis",
            TaskKind::StudyNotes => "study-notes",
            TaskKind::QuizTopics => "quiz-topics",
            TaskKind::ConceptMap => "concept-map",
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a single extraction did not produce a usable value.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExtractionError {
    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("task reported failure: {0}")]
    TaskFailed(String),

    #[error("returned no output")]
    EmptyOutput,

    #[error("malformed output: {0}")]
    MalformedOutput(String),

    #[error("could not encode input: {0}")]
    InputEncoding(String),

    #[error("task panicked")]
    Panicked,

    #[error("task was cancelled")]
    Cancelled,
}

/// A typed extraction task.
///
/// Implementations hold their client and remote task name; the orchestrators
/// only see `Input -> Result<Output, ExtractionError>`.
#[async_trait]
pub trait ExtractionTask: Send + Sync {
    type Input: Serialize + Send + Sync;
    type Output: Send;

    /// Which artifact this task produces
    fn kind(&self) -> TaskKind;

    /// Remote name the client is invoked with
    fn task_name(&self) -> &str;

    /// Run the extraction once. Never retried.
    async fn extract(&self, input: &Self::Input) -> Result<Self::Output, ExtractionError>;
}

/// Invoke `task_name` with `input` and validate the reply into `O`.
pub(crate) async fn invoke_structured<I, O>(
    client: &dyn InferenceClient,
    task_name: &str,
    input: &I,
) -> Result<O, ExtractionError>
where
    I: Serialize + Sync + ?Sized,
    O: DeserializeOwned,
{
    let payload =
        serde_json::to_string(input).map_err(|e| ExtractionError::InputEncoding(e.to_string()))?;

    let response = client.invoke(task_name, &payload).await?;

    if response.is_failed() {
        return Err(ExtractionError::TaskFailed(
            response
                .first_agent_error()
                .unwrap_or("task execution failed")
                .to_string(),
        ));
    }

    let text = response.final_text().ok_or(ExtractionError::EmptyOutput)?;

    let value = extract_json(text).ok_or_else(|| {
        ExtractionError::MalformedOutput(format!(
            "no JSON object found in response: {}",
            text.chars().take(200).collect::<String>()
        ))
    })?;

    if value.is_null() {
        return Err(ExtractionError::EmptyOutput);
    }

    serde_json::from_value(value).map_err(|e| ExtractionError::MalformedOutput(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::MockClient;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Probe {
        value: String,
    }

    #[tokio::test]
    async fn valid_reply_deserializes() {
        let client = MockClient::available().with_json("probe", json!({"value": "ok"}));
        let out: Probe = invoke_structured(&client, "probe", &json!({})).await.unwrap();
        assert_eq!(out.value, "ok");
    }

    #[tokio::test]
    async fn empty_string_is_still_a_success() {
        let client = MockClient::available().with_json("probe", json!({"value": ""}));
        let out: Probe = invoke_structured(&client, "probe", &json!({})).await.unwrap();
        assert_eq!(out.value, "");
    }

    #[tokio::test]
    async fn null_reply_is_empty_output() {
        let client = MockClient::available().with_text("probe", "null");
        let err = invoke_structured::<_, Probe>(&client, "probe", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::EmptyOutput));
    }

    #[tokio::test]
    async fn wrong_shape_is_malformed() {
        let client = MockClient::available().with_json("probe", json!({"value": 42}));
        let err = invoke_structured::<_, Probe>(&client, "probe", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::MalformedOutput(_)));
    }

    #[tokio::test]
    async fn prose_reply_is_malformed() {
        let client = MockClient::available().with_text("probe", "I could not find anything.");
        let err = invoke_structured::<_, Probe>(&client, "probe", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::MalformedOutput(_)));
    }

    #[tokio::test]
    async fn failed_status_surfaces_agent_error() {
        let mut response = crate::inference::text_response("extractor", "");
        response.status = "failed".to_string();
        response.results[0].error = Some("model overloaded".to_string());
        let client = MockClient::available().with_response("probe", response);

        let err = invoke_structured::<_, Probe>(&client, "probe", &json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "task reported failure: model overloaded");
    }

    #[tokio::test]
    async fn transport_error_passes_through() {
        let client = MockClient::available();
        let err = invoke_structured::<_, Probe>(&client, "missing", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::Inference(InferenceError::TaskNotFound(_))
        ));
    }
}
