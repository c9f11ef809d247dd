//! Why a tool call failed.
//!
//! The agent loop hands `message` back to the model, so it should read as an
//! explanation rather than a diagnostic.

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolErrorKind {
    NotFound,
    InvalidArguments,
    /// The remote tool ran and reported failure in its result payload.
    Invocation,
    /// The call never produced a result: the server failed to start, died,
    /// or broke protocol.
    Execution,
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub message: String,
    pub retryable: bool,
    pub tool_name: Option<String>,
    pub tool_call_id: Option<String>,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: kind == ToolErrorKind::Timeout,
            tool_name: None,
            tool_call_id: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::NotFound, message)
    }

    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidArguments, message)
    }

    pub fn invocation(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Invocation, message)
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Execution, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Timeout, message)
    }

    pub fn with_tool_name(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = Some(tool_name.into());
        self
    }

    pub fn with_tool_call_id(mut self, tool_call_id: impl Into<String>) -> Self {
        self.tool_call_id = Some(tool_call_id.into());
        self
    }
}

impl Display for ToolError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(tool_name) = &self.tool_name {
            write!(f, "tool '{tool_name}'")?;
            if let Some(tool_call_id) = &self.tool_call_id {
                write!(f, " (call {tool_call_id})")?;
            }
            write!(f, " failed: ")?;
        }
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ToolError {}
