//! Human-facing web front end.
//!
//! Works on the store directly. It shares no memory with the MCP server, so
//! edits made here are not reflected in that process's resource mirror until
//! it next rebuilds from a scan.

pub mod html;

use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{rejection::FormRejection, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{delete, get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::note::parse_note;
use crate::store::NoteStore;

/// Shared state of the web server.
pub struct WebState {
    pub store: Arc<dyn NoteStore>,
}

impl WebState {
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        Self { store }
    }
}

/// Fields posted by the note form. Everything is optional here so that
/// missing fields are reported by note validation, not by the extractor.
#[derive(Debug, Default, Deserialize)]
pub struct NoteForm {
    pub id: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub tags: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Split a comma-separated tag field. A blank field means no tags.
pub fn split_tags(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    raw.split(',').map(|tag| tag.trim().to_string()).collect()
}

impl NoteForm {
    /// JSON shape handed to note validation.
    fn to_value(&self) -> Value {
        let mut obj = serde_json::Map::new();
        let fields = [
            ("id", &self.id),
            ("title", &self.title),
            ("summary", &self.summary),
            ("content", &self.content),
        ];
        for (name, value) in fields {
            if let Some(value) = value {
                obj.insert(name.to_string(), Value::String(value.clone()));
            }
        }
        if let Some(ref tags) = self.tags {
            obj.insert("tags".to_string(), json!(split_tags(tags)));
        }
        Value::Object(obj)
    }
}

fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

/// Create the axum Router with all routes.
pub fn create_router(state: Arc<WebState>) -> Router {
    Router::new()
        .route("/", get(handle_root))
        .route("/notes", post(handle_save_note))
        .route("/notes/{id}", delete(handle_delete_note))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /: every note in one page
async fn handle_root(State(state): State<Arc<WebState>>) -> Response {
    match state.store.scan_all().await {
        Ok(notes) => Html(html::render_home_page(&notes)).into_response(),
        Err(e) => {
            error!("Error rendering home page: {}", e);
            internal_error()
        }
    }
}

/// POST /notes: create or overwrite a note from the form
async fn handle_save_note(
    State(state): State<Arc<WebState>>,
    form: Result<Form<NoteForm>, FormRejection>,
) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(e) => {
            warn!("Rejected note form: {}", e);
            return (StatusCode::BAD_REQUEST, "Invalid data").into_response();
        }
    };

    let note = match parse_note(&form.to_value()) {
        Ok(note) => note,
        Err(e) => {
            warn!("Rejected note form: {}", e);
            return (StatusCode::BAD_REQUEST, "Invalid data").into_response();
        }
    };

    match state.store.put(&note).await {
        Ok(()) => {
            info!("Note '{}' saved from web", note.id);
            (StatusCode::FOUND, [(header::LOCATION, "/")]).into_response()
        }
        Err(e) => {
            error!("Error creating/updating note: {}", e);
            internal_error()
        }
    }
}

/// DELETE /notes/{id}
async fn handle_delete_note(
    State(state): State<Arc<WebState>>,
    Path(id): Path<String>,
) -> Response {
    match state.store.delete(&id).await {
        Ok(()) => {
            info!("Note '{}' deleted from web", id);
            (StatusCode::OK, "Deleted").into_response()
        }
        Err(e) => {
            error!("Error deleting note: {}", e);
            internal_error()
        }
    }
}

/// GET /health
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
    })
}

/// Start the HTTP server on the given address and run until `shutdown` resolves.
pub async fn serve(
    addr: &str,
    state: Arc<WebState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}/", listener.local_addr()?);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("Shutting down Notes Web server...");
    Ok(())
}
