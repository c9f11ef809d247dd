use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lprovider::{ProviderError, ProviderId, ProviderOperationHooks, ToolCall};
use ltooling::{
    ToolCallHooks, ToolCallOutcome, ToolError, ToolExecutionContext, ToolExecutionResult,
};

use crate::{
    CombinedObservabilityHooks, MetricsObservabilityHooks, SafeProviderHooks, SafeToolHooks,
    TracingObservabilityHooks,
};

fn sample_tool_call() -> ToolCall {
    ToolCall::new("call-1", "fetch", r#"{"url":"https://example.com"}"#)
}

fn sample_context() -> ToolExecutionContext {
    ToolExecutionContext::new("0f1e2d3c4b5a69788796a5b4c3d2e1f0")
}

fn drive_all_callbacks<H>(hooks: &H)
where
    H: ProviderOperationHooks + ToolCallHooks,
{
    let provider_error = ProviderError::timeout("provider timeout");
    hooks.on_attempt_start(ProviderId::OpenAi, "stream", 1);
    hooks.on_retry_scheduled(
        ProviderId::OpenAi,
        "stream",
        1,
        Duration::from_millis(10),
        &provider_error,
    );
    hooks.on_success(ProviderId::OpenAi, "stream", 2);
    hooks.on_failure(ProviderId::Ollama, "stream", 3, &provider_error);

    let result = ToolExecutionResult::new("call-1", "<html>");
    let error = ToolError::invocation("404");
    hooks.on_call_started(&sample_tool_call(), &sample_context());
    hooks.on_call_finished(
        &sample_tool_call(),
        &sample_context(),
        ToolCallOutcome::Completed(&result),
        Duration::from_millis(20),
    );
    hooks.on_call_finished(
        &sample_tool_call(),
        &sample_context(),
        ToolCallOutcome::Failed(&error),
        Duration::from_millis(20),
    );
}

#[test]
fn tracing_hooks_smoke_test_all_callbacks() {
    drive_all_callbacks(&TracingObservabilityHooks);
}

#[test]
fn metrics_hooks_smoke_test_all_callbacks() {
    drive_all_callbacks(&MetricsObservabilityHooks);
}

#[derive(Clone, Default)]
struct CountingHooks {
    calls: Arc<AtomicUsize>,
}

impl ProviderOperationHooks for CountingHooks {
    fn on_attempt_start(&self, _provider: ProviderId, _operation: &str, _attempt: u32) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl ToolCallHooks for CountingHooks {
    fn on_call_started(&self, _call: &ToolCall, _context: &ToolExecutionContext) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Clone, Copy)]
struct PanickingHooks;

impl ProviderOperationHooks for PanickingHooks {
    fn on_attempt_start(&self, _provider: ProviderId, _operation: &str, _attempt: u32) {
        panic!("attempt_start panic");
    }

    fn on_failure(
        &self,
        _provider: ProviderId,
        _operation: &str,
        _attempts: u32,
        _error: &ProviderError,
    ) {
        panic!("failure panic");
    }
}

impl ToolCallHooks for PanickingHooks {
    fn on_call_started(&self, _call: &ToolCall, _context: &ToolExecutionContext) {
        panic!("start panic");
    }

    fn on_call_finished(
        &self,
        _call: &ToolCall,
        _context: &ToolExecutionContext,
        _outcome: ToolCallOutcome<'_>,
        _elapsed: Duration,
    ) {
        panic!("failure panic");
    }
}

#[test]
fn safe_wrappers_swallow_hook_panics() {
    drive_all_callbacks_split(
        &SafeProviderHooks::new(PanickingHooks),
        &SafeToolHooks::new(PanickingHooks),
    );
}

fn drive_all_callbacks_split(provider: &dyn ProviderOperationHooks, tools: &dyn ToolCallHooks) {
    provider.on_attempt_start(ProviderId::OpenAi, "stream", 1);
    provider.on_failure(
        ProviderId::OpenAi,
        "stream",
        1,
        &ProviderError::authentication("bad key"),
    );
    tools.on_call_started(&sample_tool_call(), &sample_context());
    tools.on_call_finished(
        &sample_tool_call(),
        &sample_context(),
        ToolCallOutcome::Failed(&ToolError::timeout("slow")),
        Duration::from_secs(30),
    );
}

#[test]
fn combined_hooks_reach_every_sink_past_a_panicking_one() {
    let counting = CountingHooks::default();
    let hooks = CombinedObservabilityHooks::empty()
        .with_sink(PanickingHooks)
        .with_sink(counting.clone());

    hooks.on_attempt_start(ProviderId::OpenAi, "stream", 1);
    hooks.on_call_started(&sample_tool_call(), &sample_context());

    assert_eq!(hooks.sink_count(), 2);
    assert_eq!(counting.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn default_combined_hooks_use_tracing_and_metrics() {
    let hooks = CombinedObservabilityHooks::default();
    assert_eq!(hooks.sink_count(), 2);
    drive_all_callbacks(&hooks);
}
