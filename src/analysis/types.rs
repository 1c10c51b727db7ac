//! Core types for the analysis pipelines

use crate::tasks::{CodeAnalysis, ConceptsMap};
use serde::{Deserialize, Serialize};

/// A validated, trimmed, non-empty transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationInput(String);

impl ConversationInput {
    /// Trim and validate raw text; blank input never reaches an executor
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyConversation);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Terminal state of one extraction task in a named slot.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome<T> {
    Success { slot: String, value: T },
    Failure { slot: String, reason: String },
}

impl<T> ExtractionOutcome<T> {
    pub fn success(slot: impl Into<String>, value: T) -> Self {
        Self::Success {
            slot: slot.into(),
            value,
        }
    }

    pub fn failure(slot: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failure {
            slot: slot.into(),
            reason: reason.into(),
        }
    }

    pub fn slot(&self) -> &str {
        match self {
            Self::Success { slot, .. } | Self::Failure { slot, .. } => slot,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Self::Failure { reason, .. } => Some(reason),
            Self::Success { .. } => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Success { value, .. } => Some(value),
            Self::Failure { .. } => None,
        }
    }
}

/// The main pipeline's output record.
///
/// Every content field is independently nullable; `error` holds the first
/// non-fatal failure across all stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisAggregate {
    pub topics_summary: Option<String>,
    pub key_topics: Option<Vec<String>>,
    pub category: Option<String>,
    pub code_analysis: Option<CodeAnalysis>,
    pub study_notes: Option<String>,
    pub concepts_map: Option<ConceptsMap>,
    pub original_conversation_text: String,
    pub error: Option<String>,
}

impl AnalysisAggregate {
    /// An aggregate with no content, carrying only the transcript
    pub fn empty(original_conversation_text: impl Into<String>) -> Self {
        Self {
            topics_summary: None,
            key_topics: None,
            category: None,
            code_analysis: None,
            study_notes: None,
            concepts_map: None,
            original_conversation_text: original_conversation_text.into(),
            error: None,
        }
    }

    /// Minimal aggregate returned when normalization fails
    pub fn serialization_failure(
        original_conversation_text: impl Into<String>,
        reason: impl std::fmt::Display,
    ) -> Self {
        Self {
            error: Some(format!("serialization failed: {}", reason)),
            ..Self::empty(original_conversation_text)
        }
    }

    /// True when no content field is populated
    pub fn has_no_content(&self) -> bool {
        self.topics_summary.is_none()
            && self.key_topics.is_none()
            && self.category.is_none()
            && self.code_analysis.is_none()
            && self.study_notes.is_none()
            && self.concepts_map.is_none()
    }
}

/// Input rejected before any task is launched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("conversation text must not be empty")]
    EmptyConversation,

    #[error("quiz count must be at least 1, got {0}")]
    InvalidCount(u32),

    #[error("content must be a string")]
    MissingContent,
}
