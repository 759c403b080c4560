//! MCP stdio server.
//!
//! Reads newline-delimited JSON-RPC 2.0 messages, dispatches each request on
//! its own task, and funnels responses and update notifications through a
//! single writer so lines never interleave.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

use super::types::{
    JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, RpcError, PROTOCOL_VERSION,
};
use crate::config::{NOTIFY_INTERVAL, SERVER_NAME};
use crate::service::NotesService;
use crate::subscription::{ResourceUpdated, UpdateNotifier};
use crate::tool::notes::register_note_tools;
use crate::tool::ToolRegistry;

const OUTBOUND_BUFFER: usize = 256;

/// Agent-facing server over a line-oriented transport.
pub struct McpServer {
    service: Arc<NotesService>,
    tools: ToolRegistry,
    notify_interval: Duration,
}

impl McpServer {
    pub fn new(service: Arc<NotesService>) -> Self {
        let tools = ToolRegistry::new();
        register_note_tools(&tools, service.clone());
        Self {
            service,
            tools,
            notify_interval: NOTIFY_INTERVAL,
        }
    }

    /// Override the update broadcast interval.
    pub fn with_notify_interval(mut self, interval: Duration) -> Self {
        self.notify_interval = interval;
        self
    }

    /// Serve stdin/stdout until EOF or `shutdown` resolves.
    pub async fn run_stdio(
        self: Arc<Self>,
        shutdown: impl Future<Output = ()>,
    ) -> anyhow::Result<()> {
        let reader = tokio::io::BufReader::new(tokio::io::stdin());
        self.run(reader, tokio::io::stdout(), shutdown).await
    }

    /// Serve one connection.
    ///
    /// Starts the update notifier and the initial resource scan, then handles
    /// requests until the reader hits EOF or `shutdown` resolves. The notifier
    /// is stopped before returning and in-flight responses are flushed.
    pub async fn run<R, W>(
        self: Arc<Self>,
        reader: R,
        mut writer: W,
        shutdown: impl Future<Output = ()>,
    ) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        info!("MCP stdio server started");

        let (out_tx, mut out_rx) = mpsc::channel::<String>(OUTBOUND_BUFFER);
        let writer_task = tokio::spawn(async move {
            while let Some(line) = out_rx.recv().await {
                writer.write_all(line.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
            Ok::<_, std::io::Error>(())
        });

        let (update_tx, update_rx) = mpsc::channel::<ResourceUpdated>(OUTBOUND_BUFFER);
        let notifier = UpdateNotifier::start(
            self.service.subscriptions().clone(),
            self.notify_interval,
            update_tx,
        );
        let forwarder = tokio::spawn(forward_updates(update_rx, out_tx.clone()));

        // No ready gate: requests arriving before this finishes see a partial mirror.
        let init_service = self.service.clone();
        tokio::spawn(async move { init_service.initialize_resources().await });

        let mut lines = reader.lines();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutting down MCP Notes server...");
                    break;
                }
                line = lines.next_line() => {
                    let line = match line {
                        Ok(Some(line)) => line,
                        Ok(None) => break,
                        Err(e) => {
                            error!("Failed to read from transport: {}", e);
                            break;
                        }
                    };
                    if line.trim().is_empty() {
                        continue;
                    }

                    let server = self.clone();
                    let out_tx = out_tx.clone();
                    tokio::spawn(async move {
                        if let Some(response) = server.handle_message(&line).await {
                            match serde_json::to_string(&response) {
                                Ok(json) => {
                                    let _ = out_tx.send(json).await;
                                }
                                Err(e) => error!("Failed to encode response: {}", e),
                            }
                        }
                    });
                }
            }
        }

        notifier.stop();
        drop(out_tx);
        let _ = forwarder.await;
        match writer_task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Transport write failed: {}", e),
            Err(e) => warn!("Writer task failed: {}", e),
        }

        info!("MCP stdio server stopped");
        Ok(())
    }

    /// Handle one raw line. Returns `None` for notifications.
    pub async fn handle_message(&self, line: &str) -> Option<JsonRpcResponse> {
        debug!("MCP request: {}", line);

        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to parse JSON-RPC message: {}", e);
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    RpcError::parse_error(format!("Invalid JSON: {}", e)),
                ));
            }
        };

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    id,
                    RpcError::invalid_request(format!("Invalid request: {}", e)),
                ));
            }
        };

        if request.is_notification() {
            debug!("Ignoring client notification {}", request.method);
            return None;
        }

        let id = request.id.clone().unwrap_or(Value::Null);
        let response = match self.handle_request(&request).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(err) => {
                warn!(
                    "MCP request '{}' failed: {} (code: {})",
                    request.method, err.message, err.code
                );
                JsonRpcResponse::error(id, err)
            }
        };
        Some(response)
    }

    /// Dispatch a request by method name.
    #[instrument(skip(self, request), fields(method = %request.method))]
    pub async fn handle_request(&self, request: &JsonRpcRequest) -> Result<Value, RpcError> {
        match request.method.as_str() {
            "initialize" => Ok(self.initialize_result(request)),
            "ping" | "logging/setLevel" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": self.tools.get_definitions() })),
            "tools/call" => self.call_tool(request).await,
            "resources/list" => {
                let page = self.service.list_resources(request.param_str("cursor")).await;
                Ok(serde_json::to_value(page).map_err(|e| RpcError::internal_error(e.to_string()))?)
            }
            "resources/read" => {
                let uri = required_uri(request)?;
                let resource = self.service.read_resource(uri).await?;
                Ok(json!({ "contents": [resource] }))
            }
            "resources/subscribe" => {
                self.service.subscribe(required_uri(request)?);
                Ok(json!({}))
            }
            "resources/unsubscribe" => {
                self.service.unsubscribe(required_uri(request)?);
                Ok(json!({}))
            }
            other => Err(RpcError::method_not_found(other)),
        }
    }

    fn initialize_result(&self, request: &JsonRpcRequest) -> Value {
        let protocol_version = request
            .param_str("protocolVersion")
            .unwrap_or(PROTOCOL_VERSION);

        json!({
            "protocolVersion": protocol_version,
            "capabilities": {
                "tools": {},
                "resources": { "subscribe": true },
                "logging": {},
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": crate::VERSION,
            }
        })
    }

    async fn call_tool(&self, request: &JsonRpcRequest) -> Result<Value, RpcError> {
        let name = request
            .param_str("name")
            .ok_or_else(|| RpcError::invalid_params("Missing tool name".to_string()))?;
        let arguments = request
            .params
            .as_ref()
            .and_then(|p| p.get("arguments"))
            .cloned();

        let result = self.tools.execute(name, arguments).await?;
        serde_json::to_value(result).map_err(|e| RpcError::internal_error(e.to_string()))
    }
}

fn required_uri(request: &JsonRpcRequest) -> Result<&str, RpcError> {
    request
        .param_str("uri")
        .ok_or_else(|| RpcError::invalid_params("Missing resource uri".to_string()))
}

async fn forward_updates(mut updates: mpsc::Receiver<ResourceUpdated>, out: mpsc::Sender<String>) {
    while let Some(update) = updates.recv().await {
        let notification = JsonRpcNotification::resource_updated(&update.uri);
        match serde_json::to_string(&notification) {
            Ok(json) => {
                if out.send(json).await.is_err() {
                    break;
                }
            }
            Err(e) => error!("Failed to encode notification: {}", e),
        }
    }
}
