//! Callbacks around each tool call the runtime dispatches.
//!
//! ```rust
//! use ltooling::{NoopToolCallHooks, ToolCallHooks, ToolCallOutcome, ToolError};
//!
//! fn accepts(_hooks: &dyn ToolCallHooks) {}
//! accepts(&NoopToolCallHooks);
//!
//! let error = ToolError::timeout("slow");
//! assert_eq!(ToolCallOutcome::Failed(&error).status(), "failure");
//! ```

use std::time::Duration;

use lprovider::ToolCall;

use crate::{ToolError, ToolExecutionContext, ToolExecutionResult};

/// How a dispatched call ended.
#[derive(Debug, Clone, Copy)]
pub enum ToolCallOutcome<'a> {
    Completed(&'a ToolExecutionResult),
    Failed(&'a ToolError),
}

impl<'a> ToolCallOutcome<'a> {
    pub fn status(&self) -> &'static str {
        match self {
            Self::Completed(_) => "success",
            Self::Failed(_) => "failure",
        }
    }

    pub fn error(&self) -> Option<&'a ToolError> {
        match self {
            Self::Completed(_) => None,
            Self::Failed(error) => Some(error),
        }
    }
}

pub trait ToolCallHooks: Send + Sync {
    fn on_call_started(&self, _call: &ToolCall, _context: &ToolExecutionContext) {}

    fn on_call_finished(
        &self,
        _call: &ToolCall,
        _context: &ToolExecutionContext,
        _outcome: ToolCallOutcome<'_>,
        _elapsed: Duration,
    ) {
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopToolCallHooks;

impl ToolCallHooks for NoopToolCallHooks {}
