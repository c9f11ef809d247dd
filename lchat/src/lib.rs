//! Agent orchestration: a streaming tool-calling loop over a model provider.

mod error;
mod executor;
mod store;
mod types;

pub mod prelude {
    pub use crate::{
        AgentEvent, AgentEventStream, AgentExecutor, AgentExecutorBuilder, AgentPolicy,
        AgentRunRequest, ChatError, ChatErrorKind, ConversationStore, InMemoryConversationStore,
        ToolArgs, ToolCallNotice,
    };
    pub use lcommon::ThreadId;
    pub use ltooling::{
        DefaultToolRuntime, Tool, ToolError, ToolErrorKind, ToolExecutionContext,
        ToolExecutionResult, ToolRegistry, ToolRuntime,
    };
}

pub use error::{ChatError, ChatErrorKind};
pub use executor::{
    AgentExecutor, AgentExecutorBuilder, AgentPolicy, NEED_MORE_STEPS_MESSAGE,
    tool_error_feedback,
};
pub use store::{ChatFuture, ConversationStore, InMemoryConversationStore};
pub use types::{AgentEvent, AgentEventStream, AgentRunRequest, ToolArgs, ToolCallNotice};
pub use lcommon::ThreadId;
