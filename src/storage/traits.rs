//! Storage trait definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParse(String),

    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A note to append. Id and timestamp are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNote {
    pub topic_name: String,
    #[serde(rename = "type")]
    pub note_type: String,
    pub content: String,
}

/// A stored note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDocument {
    pub id: String,
    pub topic_name: String,
    #[serde(rename = "type")]
    pub note_type: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Append-only document store for study notes
///
/// Implementations must be thread-safe (Send + Sync).
pub trait NotesStore: Send + Sync {
    /// Append a note, assigning a fresh id and the current timestamp.
    /// Identical notes are stored twice.
    fn append(&self, note: &NewNote) -> StorageResult<NoteDocument>;

    /// Most recent notes first
    fn list(&self, limit: usize) -> StorageResult<Vec<NoteDocument>>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: NotesStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
