//! End-to-end flows through the MCP server against the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use notes_core::mcp::McpServer;
use notes_core::note::Note;
use notes_core::service::NotesService;
use notes_core::store::{MemoryNoteStore, NoteStore};

fn server_with(store: Arc<MemoryNoteStore>) -> McpServer {
    McpServer::new(Arc::new(NotesService::new(store)))
}

async fn call(server: &McpServer, id: u64, method: &str, params: Value) -> Value {
    let line = json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}).to_string();
    let response = server.handle_message(&line).await.expect("response");
    serde_json::to_value(response).unwrap()
}

async fn call_tool(server: &McpServer, name: &str, arguments: Value) -> Vec<String> {
    let params = json!({"name": name, "arguments": arguments});
    let response = call(server, 1, "tools/call", params).await;
    response["result"]["content"]
        .as_array()
        .expect("content")
        .iter()
        .map(|c| c["text"].as_str().unwrap().to_string())
        .collect()
}

fn note(id: &str, tags: &[&str]) -> Note {
    Note {
        id: id.to_string(),
        title: format!("Note {id}"),
        summary: format!("Summary {id}"),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        content: format!("Content {id}"),
    }
}

#[tokio::test]
async fn test_write_get_list_delete_flow() {
    let server = server_with(Arc::new(MemoryNoteStore::new()));

    let text = call_tool(
        &server,
        "writeNote",
        json!({"id": "a1", "title": "T", "summary": "S", "tags": ["x", "y"], "content": "C"}),
    )
    .await;
    assert_eq!(text, vec!["Note with ID 'a1' has been written/updated."]);

    let text = call_tool(&server, "getNote", json!({"id": "a1"})).await;
    assert_eq!(text[0], "Note found with ID 'a1':");
    let stored: Value = serde_json::from_str(&text[1]).unwrap();
    assert_eq!(stored["tags"], json!(["x", "y"]));
    assert_eq!(stored["content"], "C");

    let text = call_tool(&server, "listNotes", json!({"tags": ["y"]})).await;
    assert_eq!(text[0], "Found 1 notes.");
    let summaries: Value = serde_json::from_str(&text[1]).unwrap();
    assert_eq!(summaries[0]["id"], "a1");
    assert!(summaries[0].get("content").is_none());

    let text = call_tool(&server, "listNotes", json!({"tags": ["z"]})).await;
    assert_eq!(text[0], "Found 0 notes.");

    let text = call_tool(&server, "deleteNote", json!({"id": "a1"})).await;
    assert_eq!(text, vec!["Note with ID 'a1' has been deleted."]);

    let text = call_tool(&server, "getNote", json!({"id": "a1"})).await;
    assert_eq!(text, vec!["Note with ID 'a1' not found."]);
}

#[tokio::test]
async fn test_resource_appears_once_after_list_and_write() {
    let store = Arc::new(MemoryNoteStore::with_notes([note("a", &[]), note("b", &[])]));
    let server = server_with(store);

    call_tool(&server, "listNotes", json!({})).await;
    call_tool(
        &server,
        "writeNote",
        json!({"id": "a", "title": "Changed", "summary": "S", "tags": [], "content": "C"}),
    )
    .await;
    call_tool(&server, "listNotes", json!({})).await;

    let response = call(&server, 2, "resources/list", json!({})).await;
    let uris: Vec<&str> = response["result"]["resources"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["uri"].as_str().unwrap())
        .collect();
    assert_eq!(uris.iter().filter(|u| **u == "notes://notes/a").count(), 1);
    assert_eq!(uris.len(), 2);

    let response = call(&server, 3, "resources/read", json!({"uri": "notes://notes/a"})).await;
    let contents = &response["result"]["contents"][0];
    assert_eq!(contents["mimeType"], "application/json");
    assert_eq!(contents["name"], "Changed");
    let body: Value = serde_json::from_str(contents["text"].as_str().unwrap()).unwrap();
    assert_eq!(body["title"], "Changed");
}

#[tokio::test]
async fn test_delete_absent_note_succeeds() {
    let store = Arc::new(MemoryNoteStore::with_notes([note("keep", &[])]));
    let server = server_with(store.clone());

    let text = call_tool(&server, "deleteNote", json!({"id": "ghost"})).await;
    assert_eq!(text, vec!["Note with ID 'ghost' has been deleted."]);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_invalid_write_leaves_store_untouched() {
    let store = Arc::new(MemoryNoteStore::new());
    let server = server_with(store.clone());

    let response = call(
        &server,
        1,
        "tools/call",
        json!({
            "name": "writeNote",
            "arguments": {"id": "a", "title": "T", "summary": "S", "tags": "x", "content": "C"}
        }),
    )
    .await;
    assert_eq!(response["result"]["isError"], true);
    assert!(store.is_empty());
    assert!(store.get("a").await.unwrap().is_none());
}

#[tokio::test]
async fn test_resources_paginate_in_pages_of_twenty() {
    let notes: Vec<Note> = (0..45).map(|i| note(&format!("n{i:02}"), &[])).collect();
    let server = server_with(Arc::new(MemoryNoteStore::with_notes(notes)));
    call_tool(&server, "listNotes", json!({})).await;

    let mut seen = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0;
    loop {
        let params = match &cursor {
            Some(c) => json!({"cursor": c}),
            None => json!({}),
        };
        let response = call(&server, 10 + pages, "resources/list", params).await;
        let result = &response["result"];
        let resources = result["resources"].as_array().unwrap();
        pages += 1;
        for r in resources {
            seen.push(r["uri"].as_str().unwrap().to_string());
        }
        match result.get("nextCursor").and_then(|c| c.as_str()) {
            Some(next) => {
                assert_eq!(resources.len(), 20);
                cursor = Some(next.to_string());
            }
            None => break,
        }
    }

    assert_eq!(pages, 3);
    assert_eq!(seen.len(), 45);
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 45);
}

#[tokio::test]
async fn test_subscription_broadcasts_over_transport() {
    let store = Arc::new(MemoryNoteStore::with_notes([note("a", &[])]));
    let server = Arc::new(server_with(store).with_notify_interval(Duration::from_millis(50)));

    let (client, transport) = tokio::io::duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(transport);
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

    let handle = tokio::spawn(server.run(BufReader::new(server_read), server_write, async move {
        let _ = stop_rx.await;
    }));

    let (client_read, mut client_write) = tokio::io::split(client);
    let mut lines = BufReader::new(client_read).lines();

    let subscribe = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "resources/subscribe",
        "params": {"uri": "notes://notes/a"}
    });
    client_write
        .write_all(format!("{subscribe}\n").as_bytes())
        .await
        .unwrap();

    let mut got_ack = false;
    let mut updates = 0;
    let deadline = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(line) = lines.next_line().await.unwrap() {
            let message: Value = serde_json::from_str(&line).unwrap();
            if message["id"] == 1 {
                assert_eq!(message["result"], json!({}));
                got_ack = true;
            } else if message["method"] == "notifications/resources/updated" {
                assert_eq!(message["params"]["uri"], "notes://notes/a");
                updates += 1;
            }
            if got_ack && updates >= 2 {
                break;
            }
        }
    })
    .await;
    assert!(deadline.is_ok(), "no update notifications received");

    stop_tx.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_server_stops_on_eof() {
    let server = Arc::new(server_with(Arc::new(MemoryNoteStore::new())));
    let input = b"{\"jsonrpc\":\"2.0\",\"id\":7,\"method\":\"ping\"}\n".to_vec();
    let (client, transport) = tokio::io::duplex(4096);
    let (_, server_write) = tokio::io::split(transport);

    server
        .run(BufReader::new(&input[..]), server_write, std::future::pending::<()>())
        .await
        .unwrap();

    let mut lines = BufReader::new(client).lines();
    let line = lines.next_line().await.unwrap().unwrap();
    let message: Value = serde_json::from_str(&line).unwrap();
    assert_eq!(message["id"], 7);
    assert_eq!(message["result"], json!({}));
}
