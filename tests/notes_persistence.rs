//! Persistence gate behavior against real SQLite stores

mod common;

use common::harness;
use std::sync::Arc;
use studyforge::notes::{DEFAULT_TOPIC_NAME, SKIP_INFO};
use studyforge::{
    Config, MockClient, NotesStore, OpenStore, RecordingSink, SqliteNotesStore, StudyForgeApi,
    ValidationError,
};

#[tokio::test]
async fn empty_and_whitespace_notes_are_skipped() {
    let h = harness(MockClient::available());

    for content in ["", "   "] {
        let outcome = h.api.save_notes("Topic", Some(content)).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.info.as_deref(), Some(SKIP_INFO));
        assert_eq!(outcome.id, None);
    }
    assert_eq!(h.store.count().unwrap(), 0);
}

#[tokio::test]
async fn blank_topic_gets_default_name() {
    let h = harness(MockClient::available());

    let outcome = h.api.save_notes("", Some("non-empty text")).await.unwrap();
    assert!(outcome.success);

    let notes = h.store.list(10).unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].topic_name, DEFAULT_TOPIC_NAME);
    assert_eq!(notes[0].note_type, "study-notes");
    assert_eq!(notes[0].content, "non-empty text");
}

#[tokio::test]
async fn missing_content_is_rejected() {
    let h = harness(MockClient::available());

    assert_eq!(
        h.api.save_notes("Topic", None).await.unwrap_err(),
        ValidationError::MissingContent
    );
    assert_eq!(h.store.count().unwrap(), 0);
}

#[tokio::test]
async fn identical_saves_store_twice() {
    let h = harness(MockClient::available());

    let a = h.api.save_notes("T", Some("same")).await.unwrap();
    let b = h.api.save_notes("T", Some("same")).await.unwrap();

    assert_ne!(a.id, b.id);
    assert_eq!(h.store.count().unwrap(), 2);
    assert_eq!(h.sink.names(), vec!["save_stored", "save_stored"]);
}

#[tokio::test]
async fn notes_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("notes.db");

    let saved_id = {
        let store = Arc::new(SqliteNotesStore::open(&db).unwrap());
        let api = StudyForgeApi::new(
            Arc::new(MockClient::available()),
            store,
            Arc::new(RecordingSink::new()),
            &Config::default(),
        );
        api.save_notes("Closures", Some("move captures by value"))
            .await
            .unwrap()
            .id
            .unwrap()
    };

    let store = SqliteNotesStore::open(&db).unwrap();
    let notes = store.list(5).unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].id, saved_id);
}

#[tokio::test]
async fn concurrent_saves_all_land() {
    let h = harness(MockClient::available());

    let saves = (0..8).map(|i| {
        let api = h.api.clone();
        tokio::spawn(async move { api.save_notes("T", Some(&format!("note {}", i))).await })
    });
    for handle in saves.collect::<Vec<_>>() {
        assert!(handle.await.unwrap().unwrap().success);
    }

    assert_eq!(h.api.list_notes(100).await.unwrap().len(), 8);
}
