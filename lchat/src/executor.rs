//! Streaming tool-calling loop.
//!
//! Each step streams one assistant message from the provider. When that
//! message requests tools they run one after another, their results are fed
//! back, and the next step begins. The run ends on an assistant message
//! without tool calls.

use std::sync::Arc;

use async_stream::try_stream;
use futures_util::StreamExt;
use lprovider::{
    DeltaContent, Message, ModelProvider, ModelRequest, NoopOperationHooks,
    ProviderOperationHooks, RetryPolicy, StreamEvent, execute_with_retry,
};
use ltooling::{DefaultToolRuntime, ToolExecutionContext, ToolRuntime};

use crate::{
    AgentEvent, AgentEventStream, AgentRunRequest, ChatError, ConversationStore,
    InMemoryConversationStore, ToolCallNotice,
};

pub const NEED_MORE_STEPS_MESSAGE: &str = "Sorry, need more steps to process this request.";

/// The tool message content reported back to the model for a failed call.
pub fn tool_error_feedback(message: &str) -> String {
    format!("Error: {message}\n Please fix your mistakes.")
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentPolicy {
    /// Tool rounds allowed per run before the agent gives up.
    pub max_tool_rounds: usize,
    /// Applied to opening each model stream.
    pub retry: RetryPolicy,
}

impl Default for AgentPolicy {
    fn default() -> Self {
        Self {
            max_tool_rounds: 12,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Clone)]
pub struct AgentExecutor {
    provider: Arc<dyn ModelProvider>,
    tools: Arc<dyn ToolRuntime>,
    store: Arc<dyn ConversationStore>,
    policy: AgentPolicy,
    provider_hooks: Arc<dyn ProviderOperationHooks>,
}

pub struct AgentExecutorBuilder {
    provider: Arc<dyn ModelProvider>,
    tools: Option<Arc<dyn ToolRuntime>>,
    store: Option<Arc<dyn ConversationStore>>,
    policy: AgentPolicy,
    provider_hooks: Option<Arc<dyn ProviderOperationHooks>>,
}

impl AgentExecutorBuilder {
    pub fn tool_runtime(mut self, tools: Arc<dyn ToolRuntime>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn store(mut self, store: Arc<dyn ConversationStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn policy(mut self, policy: AgentPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn provider_hooks(mut self, hooks: Arc<dyn ProviderOperationHooks>) -> Self {
        self.provider_hooks = Some(hooks);
        self
    }

    pub fn build(self) -> AgentExecutor {
        AgentExecutor {
            provider: self.provider,
            tools: self
                .tools
                .unwrap_or_else(|| Arc::new(DefaultToolRuntime::default())),
            store: self
                .store
                .unwrap_or_else(|| Arc::new(InMemoryConversationStore::new())),
            policy: self.policy,
            provider_hooks: self
                .provider_hooks
                .unwrap_or_else(|| Arc::new(NoopOperationHooks)),
        }
    }
}

impl AgentExecutor {
    pub fn builder(provider: Arc<dyn ModelProvider>) -> AgentExecutorBuilder {
        AgentExecutorBuilder {
            provider,
            tools: None,
            store: None,
            policy: AgentPolicy::default(),
            provider_hooks: None,
        }
    }

    pub fn policy(&self) -> &AgentPolicy {
        &self.policy
    }

    /// Streams one agent run. New messages are appended to the store only
    /// once the run finishes without error.
    pub fn run(&self, request: AgentRunRequest) -> AgentEventStream<'_> {
        Box::pin(try_stream! {
            if request.user_input.trim().is_empty() {
                Err::<(), _>(ChatError::invalid_request("user_input must not be empty"))?;
            }

            let thread_id = &request.thread_id;
            let prior = self.store.load_messages(thread_id).await?;
            let tool_definitions = self.tools.definitions();
            let context = ToolExecutionContext::new(request.thread_id.clone());

            let user_message = Message::user(request.user_input.clone());
            let mut transcript = prior;
            transcript.push(user_message.clone());
            let mut new_messages = vec![user_message];
            let mut rounds = 0_usize;

            loop {
                let mut messages = Vec::with_capacity(transcript.len() + 1);
                if let Some(system_prompt) = &request.system_prompt {
                    messages.push(Message::system(system_prompt.clone()));
                }
                messages.extend(transcript.iter().cloned());

                let mut model_request = ModelRequest::new(request.model.clone(), messages)
                    .with_tools(tool_definitions.clone())
                    .enable_streaming();
                if let Some(temperature) = request.temperature {
                    model_request = model_request.with_temperature(temperature);
                }

                let mut events = self.open_stream(model_request).await?;
                let mut streamed_text = String::new();
                let mut completed: Option<Message> = None;

                while let Some(event) = events.next().await {
                    match event.map_err(ChatError::from)? {
                        StreamEvent::TextDelta(text) => {
                            streamed_text.push_str(&text);
                            yield AgentEvent::TokenDelta(DeltaContent::Text(text));
                        }
                        StreamEvent::ContentDelta(parts) => {
                            let delta = DeltaContent::Parts(parts);
                            streamed_text.push_str(&delta.joined_text());
                            yield AgentEvent::TokenDelta(delta);
                        }
                        StreamEvent::ToolCallDelta(_) => {}
                        StreamEvent::MessageComplete(message) => completed = Some(message),
                        StreamEvent::ResponseComplete(response) => {
                            if completed.is_none() {
                                let (text, tool_calls) = response.into_text_and_tool_calls();
                                completed = Some(Message::assistant(text).with_tool_calls(tool_calls));
                            }
                        }
                    }
                }
                drop(events);

                let mut assistant = completed.unwrap_or_else(|| Message::assistant(streamed_text));
                let out_of_rounds = assistant.has_tool_calls() && rounds >= self.policy.max_tool_rounds;
                if out_of_rounds {
                    assistant = Message::assistant(NEED_MORE_STEPS_MESSAGE);
                    yield AgentEvent::TokenDelta(DeltaContent::Text(NEED_MORE_STEPS_MESSAGE.to_string()));
                }

                transcript.push(assistant.clone());
                new_messages.push(assistant.clone());
                yield AgentEvent::FinalValue { messages: transcript.clone() };

                if !assistant.has_tool_calls() {
                    break;
                }

                yield AgentEvent::ToolCalls(
                    assistant.tool_calls.iter().map(ToolCallNotice::from_call).collect(),
                );

                rounds += 1;
                for call in assistant.tool_calls.iter().cloned() {
                    let call_id = call.id.clone();
                    let output = match self.tools.execute(call, context.clone()).await {
                        Ok(result) => result.output,
                        Err(error) => tool_error_feedback(&error.message),
                    };
                    let tool_message = Message::tool(call_id, output);
                    transcript.push(tool_message.clone());
                    new_messages.push(tool_message);
                }
            }

            self.store.append_messages(thread_id, new_messages).await?;
        })
    }

    async fn open_stream(
        &self,
        request: ModelRequest,
    ) -> Result<lprovider::BoxedEventStream<'_>, ChatError> {
        let provider = self.provider.as_ref();
        let stream = execute_with_retry(
            provider.id(),
            "stream",
            &self.policy.retry,
            self.provider_hooks.as_ref(),
            |_| provider.stream(request.clone()),
            futures_timer::Delay::new,
        )
        .await?;

        Ok(stream)
    }
}
