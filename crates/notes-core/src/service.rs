//! Shared state of the agent-facing server: the store, the resource mirror
//! and the subscription set, with the operations that keep them in step.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::error::{NotesError, Result};
use crate::note::Note;
use crate::resource::{note_uri, Resource, ResourceMirror, ResourcePage};
use crate::store::{filter_by_tags, NoteStore};
use crate::subscription::SubscriptionRegistry;

/// Owns everything the tool and resource handlers touch.
///
/// The mirror only tracks writes made through this service. Writes made by
/// another process against the same table (e.g. the web front end) show up
/// only after the next `list_notes` rebuild.
pub struct NotesService {
    store: Arc<dyn NoteStore>,
    mirror: RwLock<ResourceMirror>,
    subscriptions: Arc<SubscriptionRegistry>,
}

impl NotesService {
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        Self::with_mirror(store, ResourceMirror::new())
    }

    pub fn with_mirror(store: Arc<dyn NoteStore>, mirror: ResourceMirror) -> Self {
        Self {
            store,
            mirror: RwLock::new(mirror),
            subscriptions: Arc::new(SubscriptionRegistry::new()),
        }
    }

    pub fn subscriptions(&self) -> &Arc<SubscriptionRegistry> {
        &self.subscriptions
    }

    /// Populate the mirror from a full scan.
    ///
    /// Scanned notes are merged by URI so writes that landed while the scan
    /// was in flight are kept. A store failure is logged and leaves the mirror
    /// as it was.
    pub async fn initialize_resources(&self) {
        match self.store.scan_all().await {
            Ok(notes) => {
                let mut mirror = self.mirror.write().await;
                for note in &notes {
                    mirror.upsert(Resource::from_note(note));
                }
                info!("Resource mirror initialized with {} notes", mirror.len());
            }
            Err(e) => error!("Store error during resource initialization: {}", e),
        }
    }

    /// Scan the table, rebuild the mirror from the full scan and return the
    /// notes sharing at least one tag with `tags` (all notes if unset).
    pub async fn list_notes(&self, tags: Option<&[String]>) -> Result<Vec<Note>> {
        let notes = self.store.scan_all().await.map_err(|e| {
            error!("Store error listing notes: {}", e);
            NotesError::from(e)
        })?;

        self.mirror.write().await.replace_all(&notes);
        debug!("Resource mirror rebuilt with {} notes", notes.len());

        Ok(filter_by_tags(notes, tags))
    }

    pub async fn get_note(&self, id: &str) -> Result<Option<Note>> {
        self.store.get(id).await.map_err(|e| {
            error!("Store error getting note '{}': {}", id, e);
            NotesError::from(e)
        })
    }

    /// Upsert into the store, then into the mirror.
    pub async fn write_note(&self, note: &Note) -> Result<()> {
        self.store.put(note).await.map_err(|e| {
            error!("Store error writing note '{}': {}", note.id, e);
            NotesError::from(e)
        })?;

        self.mirror.write().await.upsert(Resource::from_note(note));
        info!("Note '{}' written", note.id);
        Ok(())
    }

    /// Delete from the store, then from the mirror.
    pub async fn delete_note(&self, id: &str) -> Result<()> {
        self.store.delete(id).await.map_err(|e| {
            error!("Store error deleting note '{}': {}", id, e);
            NotesError::from(e)
        })?;

        self.mirror.write().await.remove(&note_uri(id));
        info!("Note '{}' deleted", id);
        Ok(())
    }

    pub async fn list_resources(&self, cursor: Option<&str>) -> ResourcePage {
        self.mirror.read().await.list(cursor)
    }

    pub async fn read_resource(&self, uri: &str) -> Result<Resource> {
        self.mirror
            .read()
            .await
            .find(uri)
            .cloned()
            .ok_or_else(|| NotesError::UnknownResource(uri.to_string()))
    }

    #[cfg(test)]
    pub async fn resource_count(&self) -> usize {
        self.mirror.read().await.len()
    }

    pub fn subscribe(&self, uri: &str) {
        if self.subscriptions.subscribe(uri) {
            debug!("Subscribed to {} ({} active)", uri, self.subscriptions.len());
        }
    }

    pub fn unsubscribe(&self, uri: &str) {
        if self.subscriptions.unsubscribe(uri) {
            debug!("Unsubscribed from {}", uri);
        }
    }
}
