//! Storage backends for study notes
//!
//! Notes are appended through the `NotesStore` trait. The primary
//! implementation is `SqliteNotesStore` for persistent storage.

mod sqlite;
mod traits;

pub use sqlite::SqliteNotesStore;
pub use traits::{NewNote, NoteDocument, NotesStore, OpenStore, StorageError, StorageResult};
