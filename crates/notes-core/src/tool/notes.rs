use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use super::{Tool, ToolRegistry, ToolResult};
use crate::error::{Result, ValidationError};
use crate::note::{
    id_schema, list_notes_schema, note_schema, parse_id_input, parse_list_input, parse_note,
};
use crate::service::NotesService;

pub const LIST_NOTES: &str = "listNotes";
pub const GET_NOTE: &str = "getNote";
pub const WRITE_NOTE: &str = "writeNote";
pub const DELETE_NOTE: &str = "deleteNote";

fn invalid(tool: &str, e: ValidationError) -> ToolResult {
    warn!("Rejected {} arguments: {}", tool, e);
    ToolResult::error(format!("Invalid arguments for {tool}: {e}"))
}

/// Register the four note tools against `service`.
pub fn register_note_tools(registry: &ToolRegistry, service: Arc<NotesService>) {
    registry.register(Arc::new(ListNotesTool::new(service.clone())));
    registry.register(Arc::new(GetNoteTool::new(service.clone())));
    registry.register(Arc::new(WriteNoteTool::new(service.clone())));
    registry.register(Arc::new(DeleteNoteTool::new(service)));
}

// ====== ListNotesTool ======

pub struct ListNotesTool {
    service: Arc<NotesService>,
}

impl ListNotesTool {
    pub fn new(service: Arc<NotesService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for ListNotesTool {
    fn name(&self) -> &str {
        LIST_NOTES
    }

    fn description(&self) -> &str {
        "Lists all notes, or search notes with tags you seen in previous list operation."
    }

    fn input_schema(&self) -> Value {
        list_notes_schema()
    }

    async fn execute(&self, args: Option<Value>) -> Result<ToolResult> {
        let input = match parse_list_input(args.as_ref()) {
            Ok(input) => input,
            Err(e) => return Ok(invalid(LIST_NOTES, e)),
        };

        let notes = self.service.list_notes(input.tags.as_deref()).await?;
        let summaries: Vec<_> = notes.iter().map(|n| n.summary()).collect();

        Ok(ToolResult::text([
            format!("Found {} notes.", notes.len()),
            serde_json::to_string(&summaries)?,
        ]))
    }
}

// ====== GetNoteTool ======

pub struct GetNoteTool {
    service: Arc<NotesService>,
}

impl GetNoteTool {
    pub fn new(service: Arc<NotesService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for GetNoteTool {
    fn name(&self) -> &str {
        GET_NOTE
    }

    fn description(&self) -> &str {
        "Retrieves a specific note by its ID."
    }

    fn input_schema(&self) -> Value {
        id_schema("ID of the note to retrieve")
    }

    async fn execute(&self, args: Option<Value>) -> Result<ToolResult> {
        let id = match parse_id_input(args.as_ref()) {
            Ok(input) => input.id,
            Err(e) => return Ok(invalid(GET_NOTE, e)),
        };

        match self.service.get_note(&id).await? {
            Some(note) => Ok(ToolResult::text([
                format!("Note found with ID '{id}':"),
                serde_json::to_string(&note)?,
            ])),
            None => Ok(ToolResult::text([format!("Note with ID '{id}' not found.")])),
        }
    }
}

// ====== WriteNoteTool ======

pub struct WriteNoteTool {
    service: Arc<NotesService>,
}

impl WriteNoteTool {
    pub fn new(service: Arc<NotesService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for WriteNoteTool {
    fn name(&self) -> &str {
        WRITE_NOTE
    }

    fn description(&self) -> &str {
        "Creates or updates a note with a unique ID suffixed by a random number."
    }

    fn input_schema(&self) -> Value {
        note_schema()
    }

    async fn execute(&self, args: Option<Value>) -> Result<ToolResult> {
        let note = match args.as_ref().map(parse_note) {
            Some(Ok(note)) => note,
            Some(Err(e)) => return Ok(invalid(WRITE_NOTE, e)),
            None => return Ok(invalid(WRITE_NOTE, ValidationError::MissingField("id"))),
        };

        self.service.write_note(&note).await?;
        Ok(ToolResult::text([format!(
            "Note with ID '{}' has been written/updated.",
            note.id
        )]))
    }
}

// ====== DeleteNoteTool ======

pub struct DeleteNoteTool {
    service: Arc<NotesService>,
}

impl DeleteNoteTool {
    pub fn new(service: Arc<NotesService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for DeleteNoteTool {
    fn name(&self) -> &str {
        DELETE_NOTE
    }

    fn description(&self) -> &str {
        "Deletes a specific note by its ID."
    }

    fn input_schema(&self) -> Value {
        id_schema("ID of the note to delete")
    }

    async fn execute(&self, args: Option<Value>) -> Result<ToolResult> {
        let id = match parse_id_input(args.as_ref()) {
            Ok(input) => input.id,
            Err(e) => return Ok(invalid(DELETE_NOTE, e)),
        };

        self.service.delete_note(&id).await?;
        Ok(ToolResult::text([format!("Note with ID '{id}' has been deleted.")]))
    }
}
