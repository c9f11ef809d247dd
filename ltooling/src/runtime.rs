//! Tool runtime trait and default registry-backed executor.

use std::sync::Arc;
use std::time::Instant;

use lprovider::{ToolCall, ToolDefinition};

use crate::{
    NoopToolCallHooks, ToolCallHooks, ToolCallOutcome, ToolError, ToolExecutionContext,
    ToolExecutionResult, ToolFuture, ToolRegistry,
};

pub trait ToolRuntime: Send + Sync {
    /// Tools the model may call, in registration order.
    fn definitions(&self) -> Vec<ToolDefinition>;

    fn execute<'a>(
        &'a self,
        tool_call: ToolCall,
        context: ToolExecutionContext,
    ) -> ToolFuture<'a, Result<ToolExecutionResult, ToolError>>;
}

#[derive(Clone)]
pub struct DefaultToolRuntime {
    registry: Arc<ToolRegistry>,
    hooks: Arc<dyn ToolCallHooks>,
}

impl Default for DefaultToolRuntime {
    fn default() -> Self {
        Self::new(Arc::new(ToolRegistry::new()))
    }
}

impl DefaultToolRuntime {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            hooks: Arc::new(NoopToolCallHooks),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ToolCallHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn registry(&self) -> Arc<ToolRegistry> {
        Arc::clone(&self.registry)
    }
}

impl ToolRuntime for DefaultToolRuntime {
    fn definitions(&self) -> Vec<ToolDefinition> {
        self.registry.definitions()
    }

    fn execute<'a>(
        &'a self,
        tool_call: ToolCall,
        context: ToolExecutionContext,
    ) -> ToolFuture<'a, Result<ToolExecutionResult, ToolError>> {
        Box::pin(async move {
            self.hooks.on_call_started(&tool_call, &context);
            let started = Instant::now();

            let outcome = match self.registry.get(&tool_call.name) {
                Some(tool) => tool
                    .invoke(&tool_call.arguments, &context)
                    .await
                    .map(|output| ToolExecutionResult::from_call(&tool_call, output)),
                None => Err(ToolError::not_found(format!(
                    "tool '{}' is not registered",
                    tool_call.name
                ))),
            }
            .map_err(|error| {
                error
                    .with_tool_name(tool_call.name.clone())
                    .with_tool_call_id(tool_call.id.clone())
            });

            let reported = match &outcome {
                Ok(result) => ToolCallOutcome::Completed(result),
                Err(error) => ToolCallOutcome::Failed(error),
            };
            self.hooks
                .on_call_finished(&tool_call, &context, reported, started.elapsed());

            outcome
        })
    }
}
