//! Errors raised while talking to a tool server or touching the tool cache.

use std::error::Error;
use std::fmt::{Display, Formatter};

use ltooling::ToolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McpErrorKind {
    Spawn,
    Io,
    Protocol,
    /// The server answered with a JSON-RPC error object.
    Server,
    Timeout,
    Closed,
    Cache,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McpError {
    pub kind: McpErrorKind,
    pub message: String,
}

impl McpError {
    pub fn new(kind: McpErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn spawn(message: impl Into<String>) -> Self {
        Self::new(McpErrorKind::Spawn, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(McpErrorKind::Io, message)
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(McpErrorKind::Protocol, message)
    }

    pub fn server(code: i64, message: impl Display) -> Self {
        Self::new(McpErrorKind::Server, format!("code={code}: {message}"))
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(McpErrorKind::Timeout, message)
    }

    pub fn closed(message: impl Into<String>) -> Self {
        Self::new(McpErrorKind::Closed, message)
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::new(McpErrorKind::Cache, message)
    }
}

impl Display for McpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for McpError {}

impl From<McpError> for ToolError {
    fn from(value: McpError) -> Self {
        match value.kind {
            McpErrorKind::Timeout => ToolError::timeout(value.message),
            _ => ToolError::execution(value.to_string()),
        }
    }
}
