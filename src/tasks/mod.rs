//! Extraction tasks
//!
//! One task per artifact kind. Each is an opaque remote inference call with a
//! typed input and a typed, validated output:
//!
//! - **TopicSummaryTask**: summary, key topics, category
//! - **CodeAnalysisTask**: learned concept and final code snippet
//! - **StudyNotesTask**: a study-notes sheet
//! - **QuizTopicsTask**: recall prompts
//! - **ConceptMapTask**: concept graph, fed by the topic summary

mod code;
mod concept_map;
mod notes;
mod quiz;
mod summary;
mod traits;
pub mod types;

pub use code::CodeAnalysisTask;
pub use concept_map::ConceptMapTask;
pub use notes::StudyNotesTask;
pub use quiz::QuizTopicsTask;
pub use summary::TopicSummaryTask;
pub use traits::{ExtractionError, ExtractionTask, TaskKind};
pub use types::{
    CodeAnalysis, ConceptMapPayload, ConceptRelationship, ConceptsMap, ConversationPayload,
    QuizPayload, QuizTopic, QuizTopicsOutput, StudyNotes, TopicSummary,
};
