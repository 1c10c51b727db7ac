//! Typed inputs and outputs of the extraction tasks
//!
//! Field names on the wire are camelCase, matching the remote task contracts.

use serde::{Deserialize, Serialize};

/// Input shared by the single-transcript tasks.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationPayload {
    pub conversation_text: String,
}

impl ConversationPayload {
    pub fn new(conversation_text: impl Into<String>) -> Self {
        Self {
            conversation_text: conversation_text.into(),
        }
    }
}

/// Input to the quiz task.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizPayload {
    pub conversation_text: String,
    pub count: u32,
}

/// Input to the concept-map task; `main_topic` is the summary from stage one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptMapPayload {
    pub main_topic: String,
    pub conversation_text: String,
}

/// Topic summary output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicSummary {
    pub summary: String,
    #[serde(default)]
    pub key_topics: Option<Vec<String>>,
    #[serde(default)]
    pub category: Option<String>,
}

/// The concept a conversation taught, with the final code that came out of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeAnalysis {
    pub learned_concept: String,
    pub final_code_snippet: String,
    #[serde(default)]
    pub code_language: Option<String>,
}

/// Study notes output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyNotes {
    pub study_notes: String,
}

/// One recall prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizTopic {
    pub topic: String,
    pub context: String,
}

/// Raw quiz task output. `null` and absent lists both mean "nothing to quiz".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizTopicsOutput {
    #[serde(default)]
    pub quiz_topics: Option<Vec<QuizTopic>>,
}

/// A directed, typed edge between two concepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptRelationship {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub relation_type: String,
}

/// Concept graph for the main topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptsMap {
    pub concepts: Vec<String>,
    #[serde(default)]
    pub subtopics: Vec<String>,
    #[serde(default)]
    pub relationships: Vec<ConceptRelationship>,
}
