pub mod error;
pub mod config;
pub mod note;
pub mod store;
pub mod resource;
pub mod subscription;
pub mod service;
pub mod tool;
pub mod mcp;
#[cfg(feature = "http-api")]
pub mod web;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
