use async_trait::async_trait;

use crate::error::StoreError;
use crate::note::Note;

/// Trait for note persistence backends.
///
/// The contract is a plain key-value table keyed by `Note::id`: no transactions,
/// no secondary indexes, last write wins.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Fetch a note by id.
    async fn get(&self, id: &str) -> Result<Option<Note>, StoreError>;

    /// Insert or fully overwrite a note.
    async fn put(&self, note: &Note) -> Result<(), StoreError>;

    /// Delete a note. Deleting a missing id is not an error.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Read every note in the table, in no particular order.
    async fn scan_all(&self) -> Result<Vec<Note>, StoreError>;
}
