//! Agent run requests and the events an agent run streams back.

use std::pin::Pin;

use futures_core::Stream;
use lcommon::ThreadId;
use lprovider::{DeltaContent, Message, ToolCall};
use serde_json::{Map, Value};

use crate::ChatError;

#[derive(Debug, Clone, PartialEq)]
pub struct AgentRunRequest {
    pub thread_id: ThreadId,
    pub model: String,
    pub system_prompt: Option<String>,
    pub user_input: String,
    pub temperature: Option<f32>,
}

impl AgentRunRequest {
    pub fn new(
        thread_id: impl Into<ThreadId>,
        model: impl Into<String>,
        user_input: impl Into<String>,
    ) -> Self {
        Self {
            thread_id: thread_id.into(),
            model: model.into(),
            system_prompt: None,
            user_input: user_input.into(),
            temperature: None,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Arguments of a requested tool call, as shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolArgs {
    /// A JSON object, keys in the order the model wrote them.
    Structured(Map<String, Value>),
    Raw(String),
}

/// One tool call the latest assistant message asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallNotice {
    pub name: String,
    pub args: ToolArgs,
    pub error: Option<String>,
}

impl ToolCallNotice {
    pub fn from_call(call: &ToolCall) -> Self {
        if call.arguments.trim().is_empty() {
            return Self {
                name: call.name.clone(),
                args: ToolArgs::Structured(Map::new()),
                error: None,
            };
        }

        let (args, error) = match serde_json::from_str::<Value>(&call.arguments) {
            Ok(Value::Object(map)) => (ToolArgs::Structured(map), None),
            Ok(_) => (ToolArgs::Raw(call.arguments.clone()), None),
            Err(error) => (
                ToolArgs::Raw(call.arguments.clone()),
                Some(format!("Function {} arguments are not valid JSON: {error}", call.name)),
            ),
        };

        Self {
            name: call.name.clone(),
            args,
            error,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// Incremental assistant output.
    TokenDelta(DeltaContent),
    /// Full conversation state after an assistant message completed.
    FinalValue { messages: Vec<Message> },
    /// Tool calls requested by the assistant message that just completed.
    ToolCalls(Vec<ToolCallNotice>),
}

pub type AgentEventStream<'a> =
    Pin<Box<dyn Stream<Item = Result<AgentEvent, ChatError>> + Send + 'a>>;
