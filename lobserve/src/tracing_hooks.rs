//! Structured `tracing` events for provider attempts and tool executions.
//!
//! Routine progress is logged at `debug`, retries and tool failures at
//! `warn`, and exhausted provider attempts at `error`.

use std::time::Duration;

use lprovider::{ProviderError, ProviderId, ProviderOperationHooks, ToolCall};
use ltooling::{ToolCallHooks, ToolCallOutcome, ToolExecutionContext};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityHooks;

impl ProviderOperationHooks for TracingObservabilityHooks {
    fn on_attempt_start(&self, provider: ProviderId, operation: &str, attempt: u32) {
        tracing::debug!(
            phase = "provider",
            event = "attempt_start",
            provider = %provider,
            operation,
            attempt
        );
    }

    fn on_retry_scheduled(
        &self,
        provider: ProviderId,
        operation: &str,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        tracing::warn!(
            phase = "provider",
            event = "retry_scheduled",
            provider = %provider,
            operation,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error_kind = ?error.kind,
            error = %error
        );
    }

    fn on_success(&self, provider: ProviderId, operation: &str, attempts: u32) {
        tracing::debug!(
            phase = "provider",
            event = "success",
            provider = %provider,
            operation,
            attempts
        );
    }

    fn on_failure(
        &self,
        provider: ProviderId,
        operation: &str,
        attempts: u32,
        error: &ProviderError,
    ) {
        tracing::error!(
            phase = "provider",
            event = "failure",
            provider = %provider,
            operation,
            attempts,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }
}

impl ToolCallHooks for TracingObservabilityHooks {
    fn on_call_started(&self, call: &ToolCall, context: &ToolExecutionContext) {
        tracing::debug!(
            phase = "tool",
            event = "call_started",
            tool_name = call.name,
            tool_call_id = call.id,
            thread_id = %context.thread_id
        );
    }

    fn on_call_finished(
        &self,
        call: &ToolCall,
        context: &ToolExecutionContext,
        outcome: ToolCallOutcome<'_>,
        elapsed: Duration,
    ) {
        let elapsed_ms = elapsed.as_millis() as u64;
        match outcome {
            ToolCallOutcome::Completed(result) => tracing::debug!(
                phase = "tool",
                event = "call_finished",
                tool_name = call.name,
                tool_call_id = call.id,
                thread_id = %context.thread_id,
                output_bytes = result.output.len() as u64,
                elapsed_ms
            ),
            ToolCallOutcome::Failed(error) => tracing::warn!(
                phase = "tool",
                event = "call_failed",
                tool_name = call.name,
                tool_call_id = call.id,
                thread_id = %context.thread_id,
                elapsed_ms,
                error_kind = ?error.kind,
                error = %error.message
            ),
        }
    }
}
