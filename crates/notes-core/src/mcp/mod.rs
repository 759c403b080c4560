//! Model Context Protocol surface: JSON-RPC 2.0 over stdio.
//!
//! Exposes the four note tools, the paginated note resources and resource
//! subscriptions. Subscribed URIs receive a `notifications/resources/updated`
//! message on every notifier tick.

pub mod server;
pub mod types;

pub use server::McpServer;
pub use types::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, RpcError};
