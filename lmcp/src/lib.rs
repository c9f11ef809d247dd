//! Tool servers spoken to over stdio: discovery with an on-disk cache, and
//! adapters that run one short-lived session per tool call.

mod adapter;
mod cache;
mod client;
mod discovery;
mod error;
mod types;

pub mod prelude {
    pub use crate::{
        CallToolResult, McpConnector, McpError, McpErrorKind, McpSession, McpTool,
        ServerParameters, StdioConnector, ToolCacheStore, ToolDiscovery, ToolSchema,
    };
}

pub use adapter::McpTool;
pub use cache::{CacheEntry, DEFAULT_CACHE_EXPIRY_HOURS, ToolCacheStore};
pub use client::{
    DEFAULT_REQUEST_TIMEOUT, McpConnector, McpSession, PROTOCOL_VERSION, StdioConnector,
};
pub use discovery::ToolDiscovery;
pub use error::{McpError, McpErrorKind};
pub use types::{CallToolResult, ServerParameters, ToolSchema};
