//! StudyForge: learning-conversation analysis
//!
//! Turns a conversation transcript into study material by fanning out to
//! remote extraction tasks and folding their results into one aggregate.
//!
//! # Core Concepts
//!
//! - **Extraction tasks**: typed remote inference calls (summary, code, notes, quiz, concept map)
//! - **Aggregate**: one always-serializable record; task faults land in its `error` field
//! - **Notes**: study notes appended to a local store, empty notes skipped
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use studyforge::{Config, MockClient, OpenStore, SqliteNotesStore, StudyForgeApi, TracingSink};
//!
//! let api = StudyForgeApi::new(
//!     Arc::new(MockClient::available()),
//!     Arc::new(SqliteNotesStore::open_in_memory().unwrap()),
//!     Arc::new(TracingSink),
//!     &Config::default(),
//! );
//! // API is ready for use
//! ```

pub mod analysis;
pub mod api;
pub mod config;
pub mod events;
pub mod inference;
pub mod mcp;
pub mod notes;
pub mod storage;
pub mod tasks;

pub use analysis::{
    AnalysisAggregate, AnalysisOrchestrator, QuizOrchestrator, QuizResult, ValidationError,
};
pub use api::StudyForgeApi;
pub use config::{Config, ConfigError, TaskNames};
pub use events::{EventSink, PipelineEvent, RecordingSink, TracingSink};
pub use inference::{InferenceClient, InferenceError, MockClient, SubprocessClient};
pub use notes::{PersistenceGate, SaveOutcome};
pub use storage::{NoteDocument, NotesStore, OpenStore, SqliteNotesStore, StorageError, StorageResult};
pub use tasks::{QuizTopic, TaskKind};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
