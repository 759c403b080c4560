//! Behaviour when the backing table is unreachable.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use notes_core::error::StoreError;
use notes_core::mcp::types::INTERNAL_ERROR;
use notes_core::mcp::McpServer;
use notes_core::note::Note;
use notes_core::service::NotesService;
use notes_core::store::{MemoryNoteStore, NoteStore};

/// Memory store that fails every call while `down` is set.
#[derive(Default)]
struct UnreliableStore {
    inner: MemoryNoteStore,
    down: AtomicBool,
}

impl UnreliableStore {
    fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("table unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl NoteStore for UnreliableStore {
    async fn get(&self, id: &str) -> Result<Option<Note>, StoreError> {
        self.check()?;
        self.inner.get(id).await
    }

    async fn put(&self, note: &Note) -> Result<(), StoreError> {
        self.check()?;
        self.inner.put(note).await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.check()?;
        self.inner.delete(id).await
    }

    async fn scan_all(&self) -> Result<Vec<Note>, StoreError> {
        self.check()?;
        self.inner.scan_all().await
    }
}

async fn call(server: &McpServer, method: &str, params: Value) -> Value {
    let line = json!({"jsonrpc": "2.0", "id": 1, "method": method, "params": params}).to_string();
    serde_json::to_value(server.handle_message(&line).await.unwrap()).unwrap()
}

fn write_args(title: &str) -> Value {
    json!({
        "name": "writeNote",
        "arguments": {"id": "a", "title": title, "summary": "S", "tags": ["t"], "content": "C"}
    })
}

#[tokio::test]
async fn test_tool_calls_report_internal_error_and_keep_mirror() {
    let store = Arc::new(UnreliableStore::default());
    let server = McpServer::new(Arc::new(NotesService::new(store.clone())));

    let response = call(&server, "tools/call", write_args("Original")).await;
    assert!(response.get("error").is_none());

    store.set_down(true);

    let response = call(&server, "tools/call", write_args("Changed")).await;
    assert_eq!(response["error"]["code"], INTERNAL_ERROR);
    assert!(response.get("result").is_none());

    let response = call(
        &server,
        "tools/call",
        json!({"name": "deleteNote", "arguments": {"id": "a"}}),
    )
    .await;
    assert_eq!(response["error"]["code"], INTERNAL_ERROR);

    for (name, arguments) in [("listNotes", json!({})), ("getNote", json!({"id": "a"}))] {
        let params = json!({"name": name, "arguments": arguments});
        let response = call(&server, "tools/call", params).await;
        assert_eq!(response["error"]["code"], INTERNAL_ERROR, "{name}");
    }

    let response = call(&server, "resources/list", json!({})).await;
    assert_eq!(response["result"]["resources"].as_array().unwrap().len(), 1);

    let response = call(&server, "resources/read", json!({"uri": "notes://notes/a"})).await;
    assert_eq!(response["result"]["contents"][0]["name"], "Original");
}

#[tokio::test]
async fn test_initial_scan_failure_leaves_mirror_empty() {
    let store = Arc::new(UnreliableStore::default());
    store.set_down(true);
    let service = NotesService::new(store);

    service.initialize_resources().await;
    assert!(service.list_resources(None).await.resources.is_empty());
}

#[cfg(feature = "http-api")]
mod web {
    use super::*;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use notes_core::web::{create_router, WebState};

    fn app(store: Arc<UnreliableStore>) -> axum::Router {
        create_router(Arc::new(WebState::new(store)))
    }

    fn down_store() -> Arc<UnreliableStore> {
        let store = Arc::new(UnreliableStore::default());
        store.set_down(true);
        store
    }

    #[tokio::test]
    async fn test_home_page_store_failure_is_500() {
        let response = app(down_store())
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_save_store_failure_is_500() {
        let request = Request::builder()
            .method("POST")
            .uri("/notes")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("id=a&title=T&summary=S&tags=x&content=C"))
            .unwrap();
        let response = app(down_store()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"Internal Server Error");
    }

    #[tokio::test]
    async fn test_delete_store_failure_is_500() {
        let request = Request::builder()
            .method("DELETE")
            .uri("/notes/a")
            .body(Body::empty())
            .unwrap();
        let response = app(down_store()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
