//! Capability layer for registering and executing tools.

mod args;
mod error;
mod hooks;
mod registry;
mod runtime;
mod schema;
mod tool;
mod types;

pub mod prelude {
    pub use crate::{
        DefaultToolRuntime, NoopToolCallHooks, Tool, ToolCallHooks, ToolCallOutcome, ToolError,
        ToolErrorKind, ToolExecutionContext, ToolExecutionResult, ToolFuture, ToolRegistry,
        ToolRuntime,
    };
}

pub use args::parse_json_value;
pub use error::{ToolError, ToolErrorKind};
pub use hooks::{NoopToolCallHooks, ToolCallHooks, ToolCallOutcome};
pub use registry::ToolRegistry;
pub use runtime::{DefaultToolRuntime, ToolRuntime};
pub use schema::validate_arguments;
pub use tool::{FunctionTool, Tool, ToolFuture};
pub use types::{ToolExecutionContext, ToolExecutionResult};
