use async_trait::async_trait;
use dashmap::DashMap;

use super::backend::NoteStore;
use crate::error::StoreError;
use crate::note::Note;

/// In-process note table. Used by tests and the `memory://` connection string.
#[derive(Default)]
pub struct MemoryNoteStore {
    notes: DashMap<String, Note>,
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `notes`.
    pub fn with_notes(notes: impl IntoIterator<Item = Note>) -> Self {
        let store = Self::new();
        for note in notes {
            store.notes.insert(note.id.clone(), note);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

#[async_trait]
impl NoteStore for MemoryNoteStore {
    async fn get(&self, id: &str) -> Result<Option<Note>, StoreError> {
        Ok(self.notes.get(id).map(|entry| entry.value().clone()))
    }

    async fn put(&self, note: &Note) -> Result<(), StoreError> {
        self.notes.insert(note.id.clone(), note.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.notes.remove(id);
        Ok(())
    }

    async fn scan_all(&self) -> Result<Vec<Note>, StoreError> {
        Ok(self.notes.iter().map(|entry| entry.value().clone()).collect())
    }
}
