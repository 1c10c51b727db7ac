//! Conversation analysis pipelines
//!
//! # Main pipeline
//!
//! ```text
//! text ─▶ FanOutExecutor ─▶ ResultReducer ─▶ ConceptStage ─▶ AggregateSerializer ─▶ aggregate
//!          (summary, code,                    (concept map,
//!           study notes)                       needs summary)
//! ```
//!
//! # Quiz pipeline
//!
//! One quiz-topics task through the same executor, normalized the same way.
//!
//! # Example
//!
//! ```ignore
//! use studyforge::analysis::AnalysisOrchestrator;
//! use studyforge::config::TaskNames;
//! use studyforge::events::TracingSink;
//!
//! let orchestrator = AnalysisOrchestrator::new(client, &TaskNames::default(), Arc::new(TracingSink));
//! let aggregate = orchestrator.process_conversation(text).await?;
//! println!("{}", serde_json::to_string_pretty(&aggregate)?);
//! ```

mod executor;
mod orchestrator;
mod quiz;
mod reducer;
pub mod serializer;
mod trigger;
mod types;

pub use executor::{FanOutExecutor, Slot, SlotFuture};
pub use orchestrator::AnalysisOrchestrator;
pub use quiz::{QuizOrchestrator, QuizResult, DEFAULT_QUIZ_COUNT};
pub use reducer::{FirstError, PartialAggregate, ResultReducer, StageOutput};
pub use serializer::{AggregateSerializer, PlainValue, SerializationError};
pub use trigger::ConceptStage;
pub use types::{AnalysisAggregate, ConversationInput, ExtractionOutcome, ValidationError};
