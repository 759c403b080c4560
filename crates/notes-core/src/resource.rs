//! URI-addressed view of notes for the agent-facing resource surface.
//!
//! [`ResourceMirror`] is an ordered in-memory copy of the note table,
//! populated by a full scan and patched after every tool-path write or delete.
//! Pagination cursors are base64-encoded offsets into that order, so an insert
//! or removal before a cursor's position shifts the pages after it.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::Serialize;

use crate::config::PAGE_SIZE;
use crate::note::Note;

/// Scheme and path prefix of every note resource URI.
pub const URI_PREFIX: &str = "notes://notes/";

/// MIME type of a resource's `text` payload.
pub const MIME_TYPE: &str = "application/json";

/// Resource URI for a note id.
pub fn note_uri(id: &str) -> String {
    format!("{URI_PREFIX}{id}")
}

/// A note projected as a readable resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub uri: String,
    pub name: String,
    pub mime_type: String,
    /// JSON snapshot of the note at the time the descriptor was built.
    pub text: String,
}

impl Resource {
    pub fn from_note(note: &Note) -> Self {
        Self {
            uri: note_uri(&note.id),
            name: note.title.clone(),
            mime_type: MIME_TYPE.to_string(),
            text: serde_json::to_string(note).unwrap_or_default(),
        }
    }
}

/// One page of `resources/list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcePage {
    pub resources: Vec<Resource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Encode an offset as an opaque cursor.
pub fn encode_cursor(offset: usize) -> String {
    STANDARD.encode(offset.to_string())
}

/// Decode a cursor back to an offset. Missing or unreadable cursors mean 0.
pub fn decode_cursor(cursor: Option<&str>) -> usize {
    let Some(cursor) = cursor.map(str::trim).filter(|c| !c.is_empty()) else {
        return 0;
    };

    let bytes = match STANDARD.decode(cursor) {
        Ok(bytes) => bytes,
        Err(_) => match URL_SAFE_NO_PAD.decode(cursor.trim_end_matches('=')) {
            Ok(bytes) => bytes,
            Err(_) => return 0,
        },
    };

    std::str::from_utf8(&bytes)
        .ok()
        .and_then(|s| s.trim().parse::<usize>().ok())
        .unwrap_or(0)
}

/// Ordered in-memory collection of resource descriptors.
#[derive(Debug, Clone)]
pub struct ResourceMirror {
    resources: Vec<Resource>,
    page_size: usize,
}

impl Default for ResourceMirror {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceMirror {
    pub fn new() -> Self {
        Self::with_page_size(PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            resources: Vec::new(),
            page_size: page_size.max(1),
        }
    }

    /// Discard everything and rebuild from `notes`, keeping their order.
    pub fn replace_all<'a>(&mut self, notes: impl IntoIterator<Item = &'a Note>) {
        self.resources = notes.into_iter().map(Resource::from_note).collect();
    }

    /// Replace the descriptor with the same URI in place, or append it.
    pub fn upsert(&mut self, resource: Resource) {
        match self.resources.iter_mut().find(|r| r.uri == resource.uri) {
            Some(existing) => *existing = resource,
            None => self.resources.push(resource),
        }
    }

    /// Remove the first descriptor with `uri`. Returns whether one was removed.
    pub fn remove(&mut self, uri: &str) -> bool {
        match self.resources.iter().position(|r| r.uri == uri) {
            Some(index) => {
                self.resources.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn find(&self, uri: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.uri == uri)
    }

    /// Page starting at the cursor's offset.
    pub fn list(&self, cursor: Option<&str>) -> ResourcePage {
        let start = decode_cursor(cursor).min(self.resources.len());
        let end = start.saturating_add(self.page_size).min(self.resources.len());

        ResourcePage {
            resources: self.resources[start..end].to_vec(),
            next_cursor: (end < self.resources.len()).then(|| encode_cursor(end)),
        }
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    #[cfg(test)]
    pub fn uris(&self) -> Vec<String> {
        self.resources.iter().map(|r| r.uri.clone()).collect()
    }
}
