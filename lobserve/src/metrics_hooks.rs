//! `metrics` counters and histograms, all prefixed `llmcli_`.
//!
//! ```rust
//! use lobserve::MetricsObservabilityHooks;
//! use ltooling::ToolCallHooks;
//!
//! fn accepts_tool_hooks(_hooks: &dyn ToolCallHooks) {}
//!
//! accepts_tool_hooks(&MetricsObservabilityHooks);
//! ```

use std::time::Duration;

use lprovider::{ProviderError, ProviderId, ProviderOperationHooks, ToolCall};
use ltooling::{ToolCallHooks, ToolCallOutcome, ToolExecutionContext};

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObservabilityHooks;

impl ProviderOperationHooks for MetricsObservabilityHooks {
    fn on_attempt_start(&self, provider: ProviderId, operation: &str, _attempt: u32) {
        metrics::counter!(
            "llmcli_provider_attempt_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);
    }

    fn on_retry_scheduled(
        &self,
        provider: ProviderId,
        operation: &str,
        _attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        metrics::counter!(
            "llmcli_provider_retry_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "llmcli_provider_retry_delay_seconds",
            "provider" => provider.to_string()
        )
        .record(delay.as_secs_f64());
    }

    fn on_success(&self, provider: ProviderId, operation: &str, attempts: u32) {
        metrics::histogram!(
            "llmcli_provider_attempts",
            "provider" => provider.to_string(),
            "operation" => operation.to_string(),
            "status" => "success"
        )
        .record(attempts as f64);
    }

    fn on_failure(
        &self,
        provider: ProviderId,
        operation: &str,
        attempts: u32,
        error: &ProviderError,
    ) {
        metrics::counter!(
            "llmcli_provider_failure_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "llmcli_provider_attempts",
            "provider" => provider.to_string(),
            "operation" => operation.to_string(),
            "status" => "failure"
        )
        .record(attempts as f64);
    }
}

impl ToolCallHooks for MetricsObservabilityHooks {
    fn on_call_started(&self, call: &ToolCall, _context: &ToolExecutionContext) {
        metrics::counter!(
            "llmcli_tool_call_total",
            "tool_name" => call.name.clone()
        )
        .increment(1);
    }

    fn on_call_finished(
        &self,
        call: &ToolCall,
        _context: &ToolExecutionContext,
        outcome: ToolCallOutcome<'_>,
        elapsed: Duration,
    ) {
        if let Some(error) = outcome.error() {
            metrics::counter!(
                "llmcli_tool_call_failure_total",
                "tool_name" => call.name.clone(),
                "error_kind" => format!("{:?}", error.kind)
            )
            .increment(1);
        }
        metrics::histogram!(
            "llmcli_tool_call_duration_seconds",
            "tool_name" => call.name.clone(),
            "status" => outcome.status()
        )
        .record(elapsed.as_secs_f64());
    }
}
