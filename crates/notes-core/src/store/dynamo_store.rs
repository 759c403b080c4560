use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::config::{Credentials, Region};
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use tracing::{debug, warn};

use super::backend::NoteStore;
use crate::config::DynamoConfig;
use crate::error::StoreError;
use crate::note::Note;

/// DynamoDB-backed note table keyed by `id`.
pub struct DynamoNoteStore {
    client: Client,
    table_name: String,
}

impl DynamoNoteStore {
    pub fn new(client: Client, table_name: String) -> Self {
        Self { client, table_name }
    }

    /// Build an SDK client from static credentials and connect to the configured table.
    pub async fn connect(config: &DynamoConfig) -> Self {
        let credentials = Credentials::new(
            config.credentials.access_key_id.clone(),
            config.credentials.secret_access_key.clone(),
            config.credentials.session_token.clone(),
            None,
            "mcp-notes",
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials);
        if let Some(ref endpoint) = config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        Self::new(Client::new(&sdk_config), config.table_name.clone())
    }
}

#[async_trait]
impl NoteStore for DynamoNoteStore {
    async fn get(&self, id: &str) -> Result<Option<Note>, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(|e| StoreError::Backend(DisplayErrorContext(&e).to_string()))?;

        match output.item {
            Some(item) => note_from_item(&item).map(Some),
            None => Ok(None),
        }
    }

    async fn put(&self, note: &Note) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item_from_note(note)))
            .send()
            .await
            .map_err(|e| StoreError::Backend(DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(|e| StoreError::Backend(DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }

    async fn scan_all(&self) -> Result<Vec<Note>, StoreError> {
        let mut notes = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;
        let mut pages = 0u32;

        loop {
            let output = self
                .client
                .scan()
                .table_name(&self.table_name)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| StoreError::Backend(DisplayErrorContext(&e).to_string()))?;
            pages += 1;

            for item in output.items.unwrap_or_default() {
                match note_from_item(&item) {
                    Ok(note) => notes.push(note),
                    Err(e) => warn!("Skipping unreadable note in {}: {}", self.table_name, e),
                }
            }

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        debug!("Scanned {} notes from {} in {} page(s)", notes.len(), self.table_name, pages);
        Ok(notes)
    }
}

fn item_from_note(note: &Note) -> HashMap<String, AttributeValue> {
    let tags = note
        .tags
        .iter()
        .map(|tag| AttributeValue::S(tag.clone()))
        .collect();

    HashMap::from([
        ("id".to_string(), AttributeValue::S(note.id.clone())),
        ("title".to_string(), AttributeValue::S(note.title.clone())),
        ("summary".to_string(), AttributeValue::S(note.summary.clone())),
        ("tags".to_string(), AttributeValue::L(tags)),
        ("content".to_string(), AttributeValue::S(note.content.clone())),
    ])
}

fn note_from_item(item: &HashMap<String, AttributeValue>) -> Result<Note, StoreError> {
    let id = item
        .get("id")
        .and_then(|v| v.as_s().ok())
        .cloned()
        .ok_or_else(|| StoreError::Malformed {
            id: "<unknown>".to_string(),
            reason: "missing string attribute 'id'".to_string(),
        })?;

    let string_attr = |name: &str| -> Result<String, StoreError> {
        item.get(name)
            .and_then(|v| v.as_s().ok())
            .cloned()
            .ok_or_else(|| StoreError::Malformed {
                id: id.clone(),
                reason: format!("missing string attribute '{name}'"),
            })
    };

    let tags = match item.get("tags") {
        None | Some(AttributeValue::Null(_)) => Vec::new(),
        Some(AttributeValue::L(values)) => values
            .iter()
            .map(|v| {
                v.as_s().cloned().map_err(|_| StoreError::Malformed {
                    id: id.clone(),
                    reason: "non-string entry in 'tags'".to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
        // String sets carry no order; accept them for tables written by other tools.
        Some(AttributeValue::Ss(values)) => values.clone(),
        Some(_) => {
            return Err(StoreError::Malformed {
                id,
                reason: "attribute 'tags' is not a list".to_string(),
            })
        }
    };

    Ok(Note {
        title: string_attr("title")?,
        summary: string_attr("summary")?,
        content: string_attr("content")?,
        tags,
        id,
    })
}
