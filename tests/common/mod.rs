//! Common test utilities for StudyForge integration tests
//!
//! Builds an API over a scripted `MockClient`, an in-memory notes store and
//! a `RecordingSink`, so tests can assert on outputs, calls and events.

#![allow(dead_code)]

use serde_json::json;
use std::sync::Arc;
use studyforge::{
    Config, MockClient, OpenStore, RecordingSink, SqliteNotesStore, StudyForgeApi,
};

pub const RECURSION_TEXT: &str = "Let's talk about recursion. def f(n): return f(n-1)";

pub struct Harness {
    pub api: StudyForgeApi,
    pub client: Arc<MockClient>,
    pub store: Arc<SqliteNotesStore>,
    pub sink: Arc<RecordingSink>,
}

pub fn harness(client: MockClient) -> Harness {
    harness_with_config(client, &Config::default())
}

pub fn harness_with_config(client: MockClient, config: &Config) -> Harness {
    let client = Arc::new(client);
    let store = Arc::new(SqliteNotesStore::open_in_memory().expect("in-memory store"));
    let sink = Arc::new(RecordingSink::new());
    let api = StudyForgeApi::new(client.clone(), store.clone(), sink.clone(), config);
    Harness {
        api,
        client,
        store,
        sink,
    }
}

/// Summary and code analysis succeed, study notes are not scripted.
pub fn recursion_client() -> MockClient {
    MockClient::available()
        .with_json(
            "topic-summary",
            json!({
                "summary": "Discussion of recursion",
                "keyTopics": ["recursion"],
                "category": "Data Structures & Algorithms"
            }),
        )
        .with_json(
            "code-analysis",
            json!({
                "learnedConcept": "Recursion",
                "finalCodeSnippet": "def f(n): return f(n-1)",
                "codeLanguage": "python"
            }),
        )
        .with_json(
            "concept-map",
            json!({
                "concepts": ["recursion", "base case"],
                "subtopics": ["call stack"],
                "relationships": [{"from": "recursion", "to": "base case", "type": "requires"}]
            }),
        )
}
