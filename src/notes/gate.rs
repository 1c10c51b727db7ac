//! Persistence gate: validate, classify, then skip or store
//!
//! Empty notes are a successful no-op and never reach the store. Everything
//! else is appended exactly once; store faults come back inside the outcome.

use crate::analysis::ValidationError;
use crate::events::{EventSink, PipelineEvent};
use crate::storage::{NewNote, NoteDocument, NotesStore, StorageError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Topic name used when the caller gives a blank one
pub const DEFAULT_TOPIC_NAME: &str = "Untitled Analysis";

/// Document type of every stored note
pub const NOTE_TYPE: &str = "study-notes";

/// Info text of a skipped save
pub const SKIP_INFO: &str = "skipped empty content";

/// A validated save request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    topic_name: String,
    content: String,
}

/// Where a validated request goes next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveDecision {
    Skip { topic_name: String },
    Store(NewNote),
}

impl SaveRequest {
    /// A blank topic name becomes the default; absent content is rejected.
    pub fn validate(topic_name: &str, content: Option<&str>) -> Result<Self, ValidationError> {
        let content = content.ok_or(ValidationError::MissingContent)?;
        let topic_name = match topic_name.trim() {
            "" => DEFAULT_TOPIC_NAME,
            name => name,
        };
        Ok(Self {
            topic_name: topic_name.to_string(),
            content: content.to_string(),
        })
    }

    pub fn topic_name(&self) -> &str {
        &self.topic_name
    }

    /// Blank content is skipped. Stored content is kept as given.
    pub fn classify(self) -> SaveDecision {
        if self.content.trim().is_empty() {
            return SaveDecision::Skip {
                topic_name: self.topic_name,
            };
        }
        SaveDecision::Store(NewNote {
            topic_name: self.topic_name,
            note_type: NOTE_TYPE.to_string(),
            content: self.content,
        })
    }
}

/// Result of a save, as returned to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

impl SaveOutcome {
    pub fn stored(id: impl Into<String>) -> Self {
        Self {
            success: true,
            id: Some(id.into()),
            error: None,
            info: None,
        }
    }

    pub fn skipped() -> Self {
        Self {
            success: true,
            id: None,
            error: None,
            info: Some(SKIP_INFO.to_string()),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            id: None,
            error: Some(reason.into()),
            info: None,
        }
    }
}

/// Front door to the notes store
#[derive(Clone)]
pub struct PersistenceGate {
    store: Arc<dyn NotesStore>,
    sink: Arc<dyn EventSink>,
}

impl PersistenceGate {
    pub fn new(store: Arc<dyn NotesStore>, sink: Arc<dyn EventSink>) -> Self {
        Self { store, sink }
    }

    /// Save study notes under `topic_name`.
    ///
    /// `Err` only for a missing content value. Skips and store faults are
    /// both reported through `SaveOutcome`.
    pub async fn save_notes(
        &self,
        topic_name: &str,
        content: Option<&str>,
    ) -> Result<SaveOutcome, ValidationError> {
        let request = SaveRequest::validate(topic_name, content)?;

        let note = match request.classify() {
            SaveDecision::Skip { topic_name } => {
                self.sink.emit(PipelineEvent::SaveSkipped { topic_name });
                return Ok(SaveOutcome::skipped());
            }
            SaveDecision::Store(note) => note,
        };

        let topic_name = note.topic_name.clone();
        let store = self.store.clone();
        let appended = tokio::task::spawn_blocking(move || store.append(&note))
            .await
            .unwrap_or_else(|e| Err(join_failure(e)));

        Ok(match appended {
            Ok(doc) => {
                self.sink.emit(PipelineEvent::SaveStored {
                    topic_name,
                    id: doc.id.clone(),
                });
                SaveOutcome::stored(doc.id)
            }
            Err(e) => {
                let reason = e.to_string();
                self.sink.emit(PipelineEvent::SaveFailed {
                    topic_name,
                    reason: reason.clone(),
                });
                SaveOutcome::failed(reason)
            }
        })
    }

    /// Most recent notes first
    pub async fn list_notes(&self, limit: usize) -> Result<Vec<NoteDocument>, StorageError> {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.list(limit))
            .await
            .unwrap_or_else(|e| Err(join_failure(e)))
    }
}

fn join_failure(e: tokio::task::JoinError) -> StorageError {
    StorageError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("store task failed: {}", e),
    ))
}
