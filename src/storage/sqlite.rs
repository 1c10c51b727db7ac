//! SQLite storage backend for study notes

use super::traits::{NewNote, NoteDocument, NotesStore, OpenStore, StorageError, StorageResult};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite-backed notes store
///
/// A single `notes` table. Thread-safe via internal mutex on the connection.
pub struct SqliteNotesStore {
    conn: Mutex<Connection>,
}

impl SqliteNotesStore {
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS notes (
                id TEXT PRIMARY KEY,
                topic_name TEXT NOT NULL,
                note_type TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_notes_created_at
                ON notes(created_at);

            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn row_to_note(
        id: String,
        topic_name: String,
        note_type: String,
        content: String,
        created_at: String,
    ) -> StorageResult<NoteDocument> {
        Ok(NoteDocument {
            id,
            topic_name,
            note_type,
            content,
            timestamp: DateTime::parse_from_rfc3339(&created_at)
                .map_err(|e| StorageError::DateParse(e.to_string()))?
                .with_timezone(&Utc),
        })
    }

    /// Number of stored notes
    pub fn count(&self) -> StorageResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl OpenStore for SqliteNotesStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl NotesStore for SqliteNotesStore {
    fn append(&self, note: &NewNote) -> StorageResult<NoteDocument> {
        let doc = NoteDocument {
            id: uuid::Uuid::new_v4().to_string(),
            topic_name: note.topic_name.clone(),
            note_type: note.note_type.clone(),
            content: note.content.clone(),
            // Stored at microsecond precision
            timestamp: Utc::now().trunc_subsecs(6),
        };

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO notes (id, topic_name, note_type, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                doc.id,
                doc.topic_name,
                doc.note_type,
                doc.content,
                doc.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
            ],
        )?;

        Ok(doc)
    }

    fn list(&self, limit: usize) -> StorageResult<Vec<NoteDocument>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, topic_name, note_type, content, created_at
             FROM notes
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut notes = Vec::new();
        for row in rows {
            let (id, topic_name, note_type, content, created_at) = row?;
            notes.push(Self::row_to_note(id, topic_name, note_type, content, created_at)?);
        }
        Ok(notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn create_test_store() -> SqliteNotesStore {
        SqliteNotesStore::open_in_memory().unwrap()
    }

    fn note(topic: &str, content: &str) -> NewNote {
        NewNote {
            topic_name: topic.to_string(),
            note_type: "study-notes".to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn append_assigns_id_and_timestamp() {
        let store = create_test_store();
        let before = Utc::now().trunc_subsecs(6);

        let doc = store.append(&note("Recursion", "base case first")).unwrap();
        assert!(uuid::Uuid::parse_str(&doc.id).is_ok());
        assert!(doc.timestamp >= before);
        assert_eq!(doc.topic_name, "Recursion");
        assert_eq!(doc.note_type, "study-notes");
    }

    #[test]
    fn identical_appends_are_not_deduplicated() {
        let store = create_test_store();
        let a = store.append(&note("T", "same")).unwrap();
        let b = store.append(&note("T", "same")).unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn list_returns_newest_first_with_limit() {
        let store = create_test_store();
        for i in 0..5 {
            store.append(&note("T", &format!("note {}", i))).unwrap();
        }

        let notes = store.list(3).unwrap();
        let contents: Vec<&str> = notes.iter().map(|n| n.content.as_str()).collect();
        assert_eq!(contents, vec!["note 4", "note 3", "note 2"]);
    }

    #[test]
    fn ids_are_unique_across_many_appends() {
        let store = create_test_store();
        let ids: HashSet<String> = (0..50)
            .map(|i| store.append(&note("T", &i.to_string())).unwrap().id)
            .collect();
        assert_eq!(ids.len(), 50);
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("notes.db");

        let stored = {
            let store = SqliteNotesStore::open(&path).unwrap();
            store.append(&note("Closures", "capture by ref")).unwrap()
        };

        let reopened = SqliteNotesStore::open(&path).unwrap();
        let notes = reopened.list(10).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, stored.id);
        assert_eq!(notes[0].timestamp, stored.timestamp);
    }

    #[test]
    fn document_serializes_with_type_field() {
        let store = create_test_store();
        let doc = store.append(&note("T", "c")).unwrap();

        let v = serde_json::to_value(&doc).unwrap();
        assert_eq!(v["topicName"], "T");
        assert_eq!(v["type"], "study-notes");
        assert!(v["timestamp"].is_string());
    }

    #[test]
    fn corrupt_timestamp_surfaces_as_date_parse_error() {
        let store = create_test_store();
        store
            .lock()
            .unwrap()
            .execute(
                "INSERT INTO notes (id, topic_name, note_type, content, created_at)
                 VALUES ('bad', 'T', 'study-notes', 'c', 'yesterday')",
                [],
            )
            .unwrap();

        match store.list(10) {
            Err(StorageError::DateParse(_)) => {}
            other => panic!("expected DateParse, got {:?}", other),
        }
    }
}
