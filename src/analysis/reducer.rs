//! Result reducer: fold stage-one outcomes into a partial aggregate
//!
//! Successes are unwrapped into their fields. Failures leave their fields
//! null and feed a single first-error-wins diagnostic. Defaulting for every
//! field happens here, once.

use super::types::{AnalysisAggregate, ExtractionOutcome};
use crate::tasks::{CodeAnalysis, ConceptsMap, StudyNotes, TopicSummary};

/// Output of one stage-one slot.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutput {
    Summary(TopicSummary),
    CodeAnalysis(CodeAnalysis),
    StudyNotes(StudyNotes),
}

/// The earliest recorded failure; later ones are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirstError(Option<String>);

impl FirstError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `reason` unless an error is already held. Returns whether it was kept.
    pub fn record(&mut self, reason: impl Into<String>) -> bool {
        if self.0.is_some() {
            return false;
        }
        self.0 = Some(reason.into());
        true
    }

    /// Record a slot failure as `"<slot> failed: <reason>"`.
    pub fn record_slot(&mut self, slot: &str, reason: &str) -> bool {
        self.record(format!("{} failed: {}", slot, reason))
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    pub fn get(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn into_inner(self) -> Option<String> {
        self.0
    }
}

/// Stage-one fields, resolved, plus the running error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialAggregate {
    pub topics_summary: Option<String>,
    pub key_topics: Option<Vec<String>>,
    pub category: Option<String>,
    pub code_analysis: Option<CodeAnalysis>,
    pub study_notes: Option<String>,
    pub error: FirstError,
}

impl PartialAggregate {
    /// Complete the aggregate with the transcript and the dependent stage's result
    pub fn into_aggregate(
        self,
        original_conversation_text: String,
        concepts_map: Option<ConceptsMap>,
    ) -> AnalysisAggregate {
        AnalysisAggregate {
            topics_summary: self.topics_summary,
            key_topics: self.key_topics,
            category: self.category,
            code_analysis: self.code_analysis,
            study_notes: self.study_notes,
            concepts_map,
            original_conversation_text,
            error: self.error.into_inner(),
        }
    }
}

/// Folds ordered outcomes into a `PartialAggregate`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResultReducer;

impl ResultReducer {
    pub fn new() -> Self {
        Self
    }

    /// Reduce outcomes in slot order. The first failure in that order wins.
    pub fn reduce(&self, outcomes: Vec<ExtractionOutcome<StageOutput>>) -> PartialAggregate {
        let mut summary = None;
        let mut code = None;
        let mut notes = None;
        let mut error = FirstError::new();

        for outcome in outcomes {
            match outcome {
                ExtractionOutcome::Success { value, .. } => match value {
                    StageOutput::Summary(s) => summary = Some(s),
                    StageOutput::CodeAnalysis(c) => code = Some(c),
                    StageOutput::StudyNotes(n) => notes = Some(n),
                },
                ExtractionOutcome::Failure { slot, reason } => {
                    error.record_slot(&slot, &reason);
                }
            }
        }

        let (topics_summary, key_topics, category) = resolve_summary(summary);

        PartialAggregate {
            topics_summary,
            key_topics,
            category,
            code_analysis: code,
            study_notes: resolve_notes(notes),
            error,
        }
    }
}

/// Summary fields: all null when the slot failed; optional parts stay null when absent.
fn resolve_summary(
    summary: Option<TopicSummary>,
) -> (Option<String>, Option<Vec<String>>, Option<String>) {
    match summary {
        Some(s) => (Some(s.summary), s.key_topics, s.category),
        None => (None, None, None),
    }
}

fn resolve_notes(notes: Option<StudyNotes>) -> Option<String> {
    notes.map(|n| n.study_notes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(text: &str) -> StageOutput {
        StageOutput::Summary(TopicSummary {
            summary: text.to_string(),
            key_topics: Some(vec!["recursion".into()]),
            category: Some("Data Structures & Algorithms".into()),
        })
    }

    #[test]
    fn first_error_is_never_overwritten() {
        let mut error = FirstError::new();
        assert!(error.record("first"));
        assert!(!error.record("second"));
        assert_eq!(error.get(), Some("first"));
    }

    #[test]
    fn all_successes_fill_every_field() {
        let outcomes = vec![
            ExtractionOutcome::success("topic-summary", summary("Recursion")),
            ExtractionOutcome::success(
                "code-analysis",
                StageOutput::CodeAnalysis(CodeAnalysis {
                    learned_concept: "Recursion".into(),
                    final_code_snippet: "f(n-1)".into(),
                    code_language: Some("python".into()),
                }),
            ),
            ExtractionOutcome::success(
                "study-notes",
                StageOutput::StudyNotes(StudyNotes {
                    study_notes: "notes".into(),
                }),
            ),
        ];

        let partial = ResultReducer::new().reduce(outcomes);
        assert_eq!(partial.topics_summary.as_deref(), Some("Recursion"));
        assert_eq!(partial.category.as_deref(), Some("Data Structures & Algorithms"));
        assert!(partial.code_analysis.is_some());
        assert_eq!(partial.study_notes.as_deref(), Some("notes"));
        assert!(!partial.error.is_set());
    }

    #[test]
    fn earliest_slot_failure_wins() {
        let outcomes = vec![
            ExtractionOutcome::failure("topic-summary", "timeout"),
            ExtractionOutcome::failure("code-analysis", "quota"),
            ExtractionOutcome::failure("study-notes", "refused"),
        ];

        let partial = ResultReducer::new().reduce(outcomes);
        assert_eq!(partial.error.get(), Some("topic-summary failed: timeout"));
        assert_eq!(partial.topics_summary, None);
        assert_eq!(partial.key_topics, None);
        assert_eq!(partial.code_analysis, None);
        assert_eq!(partial.study_notes, None);
    }

    #[test]
    fn empty_summary_is_not_an_error() {
        let outcomes = vec![ExtractionOutcome::success("topic-summary", summary(""))];

        let partial = ResultReducer::new().reduce(outcomes);
        assert_eq!(partial.topics_summary.as_deref(), Some(""));
        assert!(!partial.error.is_set());
    }

    #[test]
    fn absent_optional_summary_parts_stay_null() {
        let outcomes = vec![ExtractionOutcome::success(
            "topic-summary",
            StageOutput::Summary(TopicSummary {
                summary: "s".into(),
                key_topics: None,
                category: None,
            }),
        )];

        let partial = ResultReducer::new().reduce(outcomes);
        assert_eq!(partial.key_topics, None);
        assert_eq!(partial.category, None);
    }

    #[test]
    fn into_aggregate_carries_error_and_text() {
        let mut partial = PartialAggregate::default();
        partial.error.record("study-notes failed: x");

        let agg = partial.into_aggregate("text".into(), None);
        assert_eq!(agg.original_conversation_text, "text");
        assert_eq!(agg.error.as_deref(), Some("study-notes failed: x"));
    }
}
