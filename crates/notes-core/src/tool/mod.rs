pub mod notes;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use crate::error::{NotesError, Result};

/// One block of a tool result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolContent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

impl ToolContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text",
            text: text.into(),
        }
    }
}

/// Result of a tool call, as returned in `tools/call`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolResult {
    pub fn text(blocks: impl IntoIterator<Item = String>) -> Self {
        Self {
            content: blocks.into_iter().map(ToolContent::text).collect(),
            is_error: false,
        }
    }

    /// Error-shaped result for input the caller can fix.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::text(message)],
            is_error: true,
        }
    }

    /// All text blocks joined by newlines.
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Trait for agent-callable tools.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name used in `tools/call`.
    fn name(&self) -> &str;

    /// Description of what the tool does.
    fn description(&self) -> &str;

    /// JSON Schema of the arguments object.
    fn input_schema(&self) -> serde_json::Value;

    /// Run the tool. Invalid arguments come back as an error-shaped result;
    /// `Err` is reserved for failures the caller cannot fix (store errors).
    async fn execute(&self, args: Option<serde_json::Value>) -> Result<ToolResult>;
}

/// Extension trait rendering a tool as an MCP `tools/list` entry.
pub trait ToolSchema: Tool {
    fn to_schema(&self) -> serde_json::Value {
        json!({
            "name": self.name(),
            "description": self.description(),
            "inputSchema": self.input_schema(),
        })
    }
}

impl<T: Tool + ?Sized> ToolSchema for T {}

/// Lock-free tool registry using DashMap.
pub struct ToolRegistry {
    tools: DashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: DashMap::new(),
        }
    }

    /// Register a tool.
    pub fn register(&self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).map(|r| r.value().clone())
    }

    /// All tool definitions, sorted by name.
    pub fn get_definitions(&self) -> Vec<serde_json::Value> {
        let mut tools: Vec<Arc<dyn Tool>> =
            self.tools.iter().map(|entry| entry.value().clone()).collect();
        tools.sort_by(|a, b| a.name().cmp(b.name()));
        tools.iter().map(|tool| tool.to_schema()).collect()
    }

    /// Execute a tool by name.
    pub async fn execute(
        &self,
        name: &str,
        args: Option<serde_json::Value>,
    ) -> Result<ToolResult> {
        let tool = self
            .get(name)
            .ok_or_else(|| NotesError::UnknownTool(name.to_string()))?;

        debug!("Executing tool: {}", name);
        tool.execute(args).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
