pub mod backend;
pub mod memory_store;

#[cfg(feature = "dynamodb-backend")]
pub mod dynamo_store;

use std::sync::Arc;

use tracing::info;

pub use backend::NoteStore;
pub use memory_store::MemoryNoteStore;

use crate::config::StoreConfig;
use crate::error::Result;
use crate::note::Note;

/// Keep notes that share at least one tag with `tags`.
///
/// `None` or an empty list disables filtering.
pub fn filter_by_tags(notes: Vec<Note>, tags: Option<&[String]>) -> Vec<Note> {
    match tags {
        Some(tags) if !tags.is_empty() => notes
            .into_iter()
            .filter(|note| note.has_any_tag(tags))
            .collect(),
        _ => notes,
    }
}

/// Open the store described by `config`.
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn NoteStore>> {
    match config {
        StoreConfig::Memory => {
            info!("Using in-memory note store");
            Ok(Arc::new(MemoryNoteStore::new()))
        }
        #[cfg(feature = "dynamodb-backend")]
        StoreConfig::Dynamo(dynamo) => {
            info!(
                "Using DynamoDB table '{}' in {}",
                dynamo.table_name, dynamo.region
            );
            Ok(Arc::new(dynamo_store::DynamoNoteStore::connect(dynamo).await))
        }
        #[cfg(not(feature = "dynamodb-backend"))]
        StoreConfig::Dynamo(_) => Err(crate::error::ConfigError::BackendUnavailable(
            "dynamodb".to_string(),
        )
        .into()),
    }
}
