//! Fan-out of provider and tool hooks to several panic-guarded sinks.

use std::time::Duration;

use lprovider::{ProviderError, ProviderId, ProviderOperationHooks, ToolCall};
use ltooling::{ToolCallHooks, ToolCallOutcome, ToolExecutionContext};

use crate::{
    MetricsObservabilityHooks, SafeProviderHooks, SafeToolHooks, TracingObservabilityHooks,
};

/// Forwards every callback to each registered sink in order.
///
/// The default set is tracing followed by metrics.
pub struct CombinedObservabilityHooks {
    provider: Vec<Box<dyn ProviderOperationHooks>>,
    tools: Vec<Box<dyn ToolCallHooks>>,
}

impl CombinedObservabilityHooks {
    pub fn empty() -> Self {
        Self {
            provider: Vec::new(),
            tools: Vec::new(),
        }
    }

    pub fn with_sink<H>(mut self, sink: H) -> Self
    where
        H: ProviderOperationHooks + ToolCallHooks + Clone + 'static,
    {
        self.provider.push(Box::new(SafeProviderHooks::new(sink.clone())));
        self.tools.push(Box::new(SafeToolHooks::new(sink)));
        self
    }

    pub fn sink_count(&self) -> usize {
        self.provider.len()
    }
}

impl Default for CombinedObservabilityHooks {
    fn default() -> Self {
        Self::empty()
            .with_sink(TracingObservabilityHooks)
            .with_sink(MetricsObservabilityHooks)
    }
}

impl ProviderOperationHooks for CombinedObservabilityHooks {
    fn on_attempt_start(&self, provider: ProviderId, operation: &str, attempt: u32) {
        for sink in &self.provider {
            sink.on_attempt_start(provider, operation, attempt);
        }
    }

    fn on_retry_scheduled(
        &self,
        provider: ProviderId,
        operation: &str,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        for sink in &self.provider {
            sink.on_retry_scheduled(provider, operation, attempt, delay, error);
        }
    }

    fn on_success(&self, provider: ProviderId, operation: &str, attempts: u32) {
        for sink in &self.provider {
            sink.on_success(provider, operation, attempts);
        }
    }

    fn on_failure(
        &self,
        provider: ProviderId,
        operation: &str,
        attempts: u32,
        error: &ProviderError,
    ) {
        for sink in &self.provider {
            sink.on_failure(provider, operation, attempts, error);
        }
    }
}

impl ToolCallHooks for CombinedObservabilityHooks {
    fn on_call_started(&self, call: &ToolCall, context: &ToolExecutionContext) {
        for sink in &self.tools {
            sink.on_call_started(call, context);
        }
    }

    fn on_call_finished(
        &self,
        call: &ToolCall,
        context: &ToolExecutionContext,
        outcome: ToolCallOutcome<'_>,
        elapsed: Duration,
    ) {
        for sink in &self.tools {
            sink.on_call_finished(call, context, outcome, elapsed);
        }
    }
}
