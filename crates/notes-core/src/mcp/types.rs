//! JSON-RPC 2.0 message types for the stdio MCP transport.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::NotesError;

/// Protocol version answered when the client does not name one.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

// JSON-RPC 2.0 standard error codes
pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

// MCP-specific
pub const RESOURCE_NOT_FOUND: i32 = -32002;

/// Incoming message. Without an `id` it is a notification and gets no reply.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: String,
    /// `None` when the member is absent; an explicit `null` is `Some(Value::Null)`.
    #[serde(default, deserialize_with = "present")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// String parameter `name` from the params object.
    pub fn param_str(&self, name: &str) -> Option<&str> {
        self.params.as_ref()?.get(name)?.as_str()
    }
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Reply to a request. Exactly one of `result` / `error` is set.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// Server-initiated notification.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: Value,
}

impl JsonRpcNotification {
    pub fn resource_updated(uri: &str) -> Self {
        Self {
            jsonrpc: "2.0",
            method: "notifications/resources/updated",
            params: serde_json::json!({ "uri": uri }),
        }
    }
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

impl RpcError {
    pub fn parse_error(message: String) -> Self {
        Self {
            code: PARSE_ERROR,
            message,
        }
    }

    pub fn invalid_request(message: String) -> Self {
        Self {
            code: INVALID_REQUEST,
            message,
        }
    }

    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: METHOD_NOT_FOUND,
            message: format!("Method not found: {}", method),
        }
    }

    pub fn invalid_params(message: String) -> Self {
        Self {
            code: INVALID_PARAMS,
            message,
        }
    }

    pub fn internal_error(message: String) -> Self {
        Self {
            code: INTERNAL_ERROR,
            message,
        }
    }
}

impl From<NotesError> for RpcError {
    fn from(err: NotesError) -> Self {
        let message = err.to_string();
        let code = match err {
            NotesError::UnknownTool(_) | NotesError::Validation(_) => INVALID_PARAMS,
            NotesError::UnknownResource(_) => RESOURCE_NOT_FOUND,
            NotesError::Config(_)
            | NotesError::Store(_)
            | NotesError::Io(_)
            | NotesError::Json(_) => INTERNAL_ERROR,
        };
        Self { code, message }
    }
}
