//! The note record and the validation boundary for untrusted input.
//!
//! Every payload that reaches a store operation goes through one of the
//! `parse_*` functions here first, so handlers only ever see typed values.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::ValidationError;

/// A persisted note. `id` is the store's primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub content: String,
}

impl Note {
    /// Projection returned by `listNotes` (content omitted).
    pub fn summary(&self) -> NoteSummary {
        NoteSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            summary: self.summary.clone(),
            tags: self.tags.clone(),
        }
    }

    /// True if any of the note's tags is in `wanted`.
    pub fn has_any_tag(&self, wanted: &[String]) -> bool {
        self.tags.iter().any(|tag| wanted.contains(tag))
    }
}

/// Note without its body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSummary {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub tags: Vec<String>,
}

/// Arguments of `listNotes`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListNotesInput {
    pub tags: Option<Vec<String>>,
}

/// Arguments of `getNote` and `deleteNote`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteIdInput {
    pub id: String,
}

fn as_object(args: &Value) -> Result<&Map<String, Value>, ValidationError> {
    args.as_object()
        .ok_or_else(|| ValidationError::Malformed("expected an object".to_string()))
}

fn required_string(
    obj: &Map<String, Value>,
    field: &'static str,
) -> Result<String, ValidationError> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField(field)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(ValidationError::InvalidField {
            field,
            reason: format!("expected string, got {}", type_name(other)),
        }),
    }
}

fn string_array(value: &Value, field: &'static str) -> Result<Vec<String>, ValidationError> {
    let items = value.as_array().ok_or_else(|| ValidationError::InvalidField {
        field,
        reason: format!("expected array, got {}", type_name(value)),
    })?;

    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.clone()),
            other => Err(ValidationError::InvalidField {
                field,
                reason: format!("expected array of strings, found {}", type_name(other)),
            }),
        })
        .collect()
}

fn non_empty_id(obj: &Map<String, Value>) -> Result<String, ValidationError> {
    let id = required_string(obj, "id")?;
    if id.is_empty() {
        return Err(ValidationError::InvalidField {
            field: "id",
            reason: "must not be empty".to_string(),
        });
    }
    Ok(id)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Validate a full note record. Unknown keys are ignored.
pub fn parse_note(args: &Value) -> Result<Note, ValidationError> {
    let obj = as_object(args)?;
    let tags = match obj.get("tags") {
        None | Some(Value::Null) => return Err(ValidationError::MissingField("tags")),
        Some(value) => string_array(value, "tags")?,
    };

    Ok(Note {
        id: non_empty_id(obj)?,
        title: required_string(obj, "title")?,
        summary: required_string(obj, "summary")?,
        tags,
        content: required_string(obj, "content")?,
    })
}

/// Validate `listNotes` arguments. A missing or null argument object means "no filter".
pub fn parse_list_input(args: Option<&Value>) -> Result<ListNotesInput, ValidationError> {
    let obj = match args {
        None | Some(Value::Null) => return Ok(ListNotesInput::default()),
        Some(value) => as_object(value)?,
    };

    let tags = match obj.get("tags") {
        None | Some(Value::Null) => None,
        Some(value) => Some(string_array(value, "tags")?),
    };
    Ok(ListNotesInput { tags })
}

/// Validate `getNote` / `deleteNote` arguments.
pub fn parse_id_input(args: Option<&Value>) -> Result<NoteIdInput, ValidationError> {
    let value = args.ok_or(ValidationError::MissingField("id"))?;
    let obj = as_object(value)?;
    Ok(NoteIdInput {
        id: non_empty_id(obj)?,
    })
}

/// JSON schema advertised for `writeNote`.
pub fn note_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": {
                "type": "string",
                "description": "Unique identifier of the note, should be unique enough like \"a-note-about-python-file-server-design-109\"."
            },
            "title": {
                "type": "string",
                "description": "Title of the note, describe what was inside the content."
            },
            "summary": { "type": "string", "description": "Short summary of the note" },
            "tags": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Tags of the note"
            },
            "content": { "type": "string", "description": "Content of the note" }
        },
        "required": ["id", "title", "summary", "tags", "content"],
        "additionalProperties": false
    })
}

/// JSON schema advertised for `listNotes`.
pub fn list_notes_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "tags": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Optional tags to filter notes"
            }
        },
        "additionalProperties": false
    })
}

/// JSON schema for a single-id argument object.
pub fn id_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": { "type": "string", "description": description }
        },
        "required": ["id"],
        "additionalProperties": false
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Value {
        json!({
            "id": "a1",
            "title": "T",
            "summary": "S",
            "tags": ["x", "y"],
            "content": "C"
        })
    }

    #[test]
    fn test_parse_note_valid() {
        let note = parse_note(&sample()).unwrap();
        assert_eq!(note.id, "a1");
        assert_eq!(note.tags, vec!["x", "y"]);
        assert_eq!(note.content, "C");
    }

    #[test]
    fn test_parse_note_ignores_unknown_keys() {
        let mut value = sample();
        value["extra"] = json!(42);
        assert!(parse_note(&value).is_ok());
    }

    #[test]
    fn test_parse_note_missing_field() {
        let mut value = sample();
        value.as_object_mut().unwrap().remove("summary");
        assert!(matches!(
            parse_note(&value),
            Err(ValidationError::MissingField("summary"))
        ));
    }

    #[test]
    fn test_parse_note_wrong_types() {
        let mut value = sample();
        value["tags"] = json!("x,y");
        assert!(parse_note(&value).is_err());

        let mut value = sample();
        value["tags"] = json!(["x", 1]);
        assert!(parse_note(&value).is_err());

        let mut value = sample();
        value["title"] = json!(7);
        assert!(parse_note(&value).is_err());
    }

    #[test]
    fn test_parse_note_rejects_empty_id() {
        let mut value = sample();
        value["id"] = json!("");
        assert!(matches!(
            parse_note(&value),
            Err(ValidationError::InvalidField { field: "id", .. })
        ));
    }

    #[test]
    fn test_parse_note_keeps_duplicate_tags_in_order() {
        let mut value = sample();
        value["tags"] = json!(["b", "a", "b"]);
        assert_eq!(parse_note(&value).unwrap().tags, vec!["b", "a", "b"]);
    }

    #[test]
    fn test_parse_list_input() {
        assert_eq!(parse_list_input(None).unwrap().tags, None);
        assert_eq!(parse_list_input(Some(&json!({}))).unwrap().tags, None);
        assert_eq!(
            parse_list_input(Some(&json!({"tags": ["a"]}))).unwrap().tags,
            Some(vec!["a".to_string()])
        );
        assert!(parse_list_input(Some(&json!({"tags": "a"}))).is_err());
        assert!(parse_list_input(Some(&json!([1, 2]))).is_err());
    }

    #[test]
    fn test_parse_id_input() {
        assert_eq!(parse_id_input(Some(&json!({"id": "n1"}))).unwrap().id, "n1");
        assert!(parse_id_input(None).is_err());
        assert!(parse_id_input(Some(&json!({"id": 3}))).is_err());
    }

    #[test]
    fn test_has_any_tag() {
        let note = parse_note(&sample()).unwrap();
        assert!(note.has_any_tag(&["y".to_string()]));
        assert!(note.has_any_tag(&["z".to_string(), "x".to_string()]));
        assert!(!note.has_any_tag(&["z".to_string()]));
        assert!(!note.has_any_tag(&[]));
    }

    #[test]
    fn test_summary_omits_content() {
        let note = parse_note(&sample()).unwrap();
        let value = serde_json::to_value(note.summary()).unwrap();
        assert!(value.get("content").is_none());
        assert_eq!(value["title"], "T");
    }
}
